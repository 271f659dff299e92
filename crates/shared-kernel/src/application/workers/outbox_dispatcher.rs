// crates/shared-kernel/src/application/workers/outbox_dispatcher.rs

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Semaphore, mpsc};
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::application::ports::{MetricsCollector, OutboxPublisher};
use crate::domain::outbox::{OutboxEvent, OutboxStore};
use crate::errors::AppError;
use crate::infrastructure::retry::backoff_delay;

/// Fenêtre accordée aux tâches en vol après annulation du contexte racine
const SHUTDOWN_GRACE_PERIOD: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct OutboxConfig {
    /// Taille maximale d'un statement d'insertion multi-values
    pub max_batch_size: usize,
    /// Période du tick de polling
    pub interval: Duration,
    /// Nombre de lignes réclamées par tick
    pub batch_size: u32,
    /// Nombre de re-publications tolérées avant déclassement en DLQ
    pub max_retries: i32,
    pub base_backoff: Duration,
    pub max_backoff: Duration,
    /// Nombre de publications simultanées (sémaphore)
    pub concurrency: usize,
}

impl Default for OutboxConfig {
    fn default() -> Self {
        Self {
            max_batch_size: 100,
            interval: Duration::from_secs(5),
            batch_size: 50,
            max_retries: 3,
            base_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(30),
            concurrency: 3,
        }
    }
}

impl OutboxConfig {
    /// Charge la config depuis l'environnement, avec les valeurs par défaut
    /// ci-dessus pour tout ce qui manque ou ne parse pas.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_batch_size: env_parse("OUTBOX_MAX_BATCH_SIZE", defaults.max_batch_size),
            interval: Duration::from_millis(env_parse(
                "OUTBOX_INTERVAL_MS",
                defaults.interval.as_millis() as u64,
            )),
            batch_size: env_parse("OUTBOX_BATCH_SIZE", defaults.batch_size),
            max_retries: env_parse("OUTBOX_MAX_RETRIES", defaults.max_retries),
            base_backoff: Duration::from_millis(env_parse(
                "OUTBOX_BASE_BACKOFF_MS",
                defaults.base_backoff.as_millis() as u64,
            )),
            max_backoff: Duration::from_millis(env_parse(
                "OUTBOX_MAX_BACKOFF_MS",
                defaults.max_backoff.as_millis() as u64,
            )),
            concurrency: env_parse("OUTBOX_CONCURRENCY", defaults.concurrency).max(1),
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Worker de drainage de l'outbox : réclame un batch de lignes éligibles à
/// chaque tick, publie chaque événement en concurrence bornée avec son propre
/// retry, puis enregistre l'issue (published / failed / dlq).
///
/// Les erreurs de publication ne remontent jamais : elles se résolvent en
/// état de la ligne.
pub struct OutboxDispatcher<Store, Publisher>
where
    Store: OutboxStore + 'static,
    Publisher: OutboxPublisher + 'static,
{
    inner: Arc<DispatcherInner<Store, Publisher>>,
    shutdown: CancellationToken,
    wake: Option<mpsc::Receiver<()>>,
    handle: Option<JoinHandle<()>>,
}

impl<Store, Publisher> OutboxDispatcher<Store, Publisher>
where
    Store: OutboxStore + 'static,
    Publisher: OutboxPublisher + 'static,
{
    pub fn new(
        store: Store,
        publisher: Publisher,
        config: OutboxConfig,
        metrics: Option<Arc<dyn MetricsCollector>>,
    ) -> Self {
        let concurrency = config.concurrency.max(1);
        Self {
            inner: Arc::new(DispatcherInner {
                store,
                publisher,
                semaphore: Arc::new(Semaphore::new(concurrency)),
                config,
                metrics,
            }),
            shutdown: CancellationToken::new(),
            wake: None,
            handle: None,
        }
    }

    /// Branche un signal de réveil (LISTEN/NOTIFY) en plus du tick périodique.
    pub fn with_wake_signal(mut self, wake: mpsc::Receiver<()>) -> Self {
        self.wake = Some(wake);
        self
    }

    /// Lance la boucle du superviseur. `ctx` est le token racine du process ;
    /// `stop()` ferme le signal privé sans toucher au reste du process.
    pub fn start(&mut self, ctx: CancellationToken) {
        let inner = Arc::clone(&self.inner);
        let shutdown = self.shutdown.clone();
        let wake = self.wake.take();

        self.handle = Some(tokio::spawn(async move {
            inner.run(ctx, shutdown, wake).await;
        }));
    }

    /// Demande l'arrêt et attend que la boucle se vide.
    pub async fn stop(&mut self) {
        self.shutdown.cancel();
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

struct DispatcherInner<Store, Publisher> {
    store: Store,
    publisher: Publisher,
    semaphore: Arc<Semaphore>,
    config: OutboxConfig,
    metrics: Option<Arc<dyn MetricsCollector>>,
}

/// Issue d'un cycle de publication pour un événement
enum PublishOutcome {
    Cancelled,
    Exhausted(AppError),
}

impl<Store, Publisher> DispatcherInner<Store, Publisher>
where
    Store: OutboxStore + 'static,
    Publisher: OutboxPublisher + 'static,
{
    async fn run(
        self: Arc<Self>,
        ctx: CancellationToken,
        shutdown: CancellationToken,
        mut wake: Option<mpsc::Receiver<()>>,
    ) {
        tracing::info!(
            interval_ms = self.config.interval.as_millis() as u64,
            batch_size = self.config.batch_size,
            concurrency = self.config.concurrency,
            "Outbox dispatcher started"
        );

        let mut ticker = tokio::time::interval(self.config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // Le premier tick part immédiatement ; on cale la cadence sur l'intervalle
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ctx.cancelled() => {
                    tracing::info!("Outbox dispatcher stopped: context cancelled");
                    break;
                }
                _ = shutdown.cancelled() => {
                    tracing::info!("Outbox dispatcher stopped: stop signal received");
                    break;
                }
                _ = ticker.tick() => {
                    self.process_pending_events(&ctx).await;
                }
                notified = wake_signal(&mut wake) => {
                    match notified {
                        Some(()) => self.process_pending_events(&ctx).await,
                        // Canal fermé : on retombe sur le polling seul
                        None => wake = None,
                    }
                }
            }
        }
    }

    async fn process_pending_events(self: &Arc<Self>, ctx: &CancellationToken) {
        let events = match self.store.get_pending_events(self.config.batch_size).await {
            Ok(events) => events,
            Err(e) => {
                tracing::error!(error = %e, "Failed to fetch pending outbox events");
                return;
            }
        };

        if events.is_empty() {
            return;
        }

        tracing::info!(
            count = events.len(),
            concurrency = self.config.concurrency,
            "Processing pending outbox events"
        );

        let mut tasks: JoinSet<()> = JoinSet::new();
        for event in events {
            if ctx.is_cancelled() {
                tracing::warn!(
                    event_id = event.id,
                    event_type = %event.event_type,
                    "Context cancelled, not launching remaining events"
                );
                break;
            }

            let inner = Arc::clone(self);
            let ctx = ctx.clone();
            tasks.spawn(async move {
                // Admission bornée par le sémaphore ; une annulation pendant
                // l'attente abandonne la tâche sans traiter l'événement
                let permit = tokio::select! {
                    _ = ctx.cancelled() => {
                        tracing::warn!(
                            event_id = event.id,
                            event_type = %event.event_type,
                            "Context cancelled, skipping event"
                        );
                        return;
                    }
                    permit = inner.semaphore.clone().acquire_owned() => permit,
                };
                let Ok(_permit) = permit else { return };

                inner.process_event(&ctx, event).await;
            });
        }

        let drain = async {
            while tasks.join_next().await.is_some() {}
        };
        tokio::pin!(drain);

        tokio::select! {
            _ = &mut drain => {}
            _ = ctx.cancelled() => {
                tracing::warn!("Context cancelled while waiting for in-flight events");
                if tokio::time::timeout(SHUTDOWN_GRACE_PERIOD, &mut drain)
                    .await
                    .is_err()
                {
                    tracing::warn!(
                        grace_period_secs = SHUTDOWN_GRACE_PERIOD.as_secs(),
                        "Timeout waiting for in-flight events after cancellation"
                    );
                }
            }
        }
    }

    async fn process_event(&self, ctx: &CancellationToken, event: OutboxEvent) {
        if ctx.is_cancelled() {
            tracing::warn!(
                event_id = event.id,
                event_type = %event.event_type,
                "Context cancelled before processing event"
            );
            return;
        }

        match self.publish_with_retry(ctx, &event).await {
            Ok(()) => {
                // La publication a réussi : on enregistre l'issue même si le
                // contexte vient d'être annulé (best-effort, synchrone)
                if let Err(e) = self.store.mark_as_published(event.id).await {
                    tracing::error!(
                        event_id = event.id,
                        error = %e,
                        "Failed to mark event as published"
                    );
                    return;
                }

                if let Some(metrics) = &self.metrics {
                    metrics.record_outbox_event_processed(&event.event_type, "published");
                }

                tracing::info!(
                    event_id = event.id,
                    event_type = %event.event_type,
                    "Event published successfully"
                );
            }
            Err(PublishOutcome::Cancelled) => {
                tracing::warn!(
                    event_id = event.id,
                    event_type = %event.event_type,
                    "Context cancelled during event publication"
                );
            }
            Err(PublishOutcome::Exhausted(publish_err)) => {
                self.handle_publish_failure(&event, publish_err).await;
            }
        }
    }

    /// Jusqu'à `max_retries + 1` tentatives par cycle, backoff géométrique
    /// plafonné entre deux tentatives.
    async fn publish_with_retry(
        &self,
        ctx: &CancellationToken,
        event: &OutboxEvent,
    ) -> std::result::Result<(), PublishOutcome> {
        let mut last_err: Option<AppError> = None;

        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                let backoff = backoff_delay(
                    self.config.base_backoff,
                    self.config.max_backoff,
                    attempt as u32,
                );

                tracing::info!(
                    event_id = event.id,
                    event_type = %event.event_type,
                    attempt,
                    backoff_ms = backoff.as_millis() as u64,
                    "Retrying event publication"
                );

                tokio::select! {
                    _ = ctx.cancelled() => return Err(PublishOutcome::Cancelled),
                    _ = tokio::time::sleep(backoff) => {}
                }
            }

            match self.publisher.publish(event).await {
                Ok(()) => return Ok(()),
                Err(e) => {
                    if attempt < self.config.max_retries {
                        tracing::warn!(
                            event_id = event.id,
                            event_type = %event.event_type,
                            attempt = attempt + 1,
                            error = %e,
                            "Event publication failed, will retry"
                        );
                    }
                    last_err = Some(e);
                }
            }
        }

        let attempts = self.config.max_retries + 1;
        let last_err = last_err
            .unwrap_or_else(|| AppError::new(crate::errors::ErrorCode::InternalError, "unknown publish failure"));
        Err(PublishOutcome::Exhausted(AppError::new(
            last_err.code,
            format!("failed after {attempts} attempts: {}", last_err.message),
        )))
    }

    async fn handle_publish_failure(&self, event: &OutboxEvent, publish_err: AppError) {
        tracing::error!(
            event_id = event.id,
            event_type = %event.event_type,
            retry_count = event.retry_count,
            error = %publish_err,
            "Failed to publish event after retries"
        );

        let retry_count = event.retry_count + 1;

        if let Some(metrics) = &self.metrics {
            metrics.record_outbox_retry_attempt(&event.event_type, retry_count);
        }

        if retry_count > self.config.max_retries {
            tracing::warn!(
                event_id = event.id,
                event_type = %event.event_type,
                retry_count,
                "Event exceeded max retries, moving to DLQ"
            );

            let reason = format!("Failed after {retry_count} retry attempts: {publish_err}");
            if let Err(dlq_err) = self.store.move_to_dlq(event.id, &reason).await {
                tracing::error!(
                    event_id = event.id,
                    error = %dlq_err,
                    "Failed to move event to DLQ"
                );
                self.mark_event_as_failed(event.id, retry_count).await;
            }

            if let Some(metrics) = &self.metrics {
                metrics.record_outbox_event_processed(&event.event_type, "dlq");
            }
        } else {
            self.mark_event_as_failed(event.id, retry_count).await;

            if let Some(metrics) = &self.metrics {
                metrics.record_outbox_event_processed(&event.event_type, "failed");
            }
        }
    }

    async fn mark_event_as_failed(&self, event_id: i64, retry_count: i32) {
        if let Err(e) = self.store.mark_as_failed(event_id, retry_count).await {
            tracing::error!(
                event_id,
                error = %e,
                "Failed to mark event as failed"
            );
        }
    }
}

async fn wake_signal(wake: &mut Option<mpsc::Receiver<()>>) -> Option<()> {
    match wake {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}
