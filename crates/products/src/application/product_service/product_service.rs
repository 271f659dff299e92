// crates/products/src/application/product_service/product_service.rs

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use futures_util::future::BoxFuture;
use rand::Rng;
use tokio_util::sync::CancellationToken;

use crate::application::ports::ProductApplicationService;
use crate::domain::entities::Product;
use crate::domain::events::ProductEvent;
use crate::domain::repositories::ProductRepository;
use shared_kernel::application::ports::MetricsCollector;
use shared_kernel::domain::outbox::{OutboxEvent, OutboxStore};
use shared_kernel::domain::transaction::{UnitOfWork, UowFactory};
use shared_kernel::errors::{Result, internal_err};
use shared_kernel::infrastructure::retry::{RetryConfig, with_retry};

/// Service applicatif produit : orchestre unit of work, repositories et
/// moteur de retry pour garantir "mutation + événement" atomiques.
pub struct ProductService {
    uow_factory: Arc<dyn UowFactory>,
    products: Arc<dyn ProductRepository>,
    outbox: Arc<dyn OutboxStore>,
    retry_config: RetryConfig,
    metrics: Option<Arc<dyn MetricsCollector>>,
}

impl ProductService {
    pub fn new(
        uow_factory: Arc<dyn UowFactory>,
        products: Arc<dyn ProductRepository>,
        outbox: Arc<dyn OutboxStore>,
        metrics: Option<Arc<dyn MetricsCollector>>,
    ) -> Self {
        // Retry court : on vise les erreurs transitoires de transaction,
        // pas la résilience longue durée (c'est le rôle du dispatcher)
        let retry_config = RetryConfig {
            max_attempts: 3,
            base_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_secs(1),
            initial_delay: Duration::from_millis(50),
        };

        Self {
            uow_factory,
            products,
            outbox,
            retry_config,
            metrics,
        }
    }

    /// Ouvre un unit of work, exécute `f`, commit si `f` a réussi, rollback
    /// sinon. Le bloc entier (begin compris) est enveloppé dans le moteur de
    /// retry ; seule la dernière erreur observée est rendue à l'épuisement.
    ///
    /// Un échec de rollback est loggé sans masquer l'erreur d'origine ; un
    /// échec de commit tente un rollback puis remonte l'erreur de commit.
    pub async fn execute_in_transaction<T, F>(&self, cancel: &CancellationToken, f: F) -> Result<T>
    where
        T: Send,
        F: for<'a> Fn(&'a mut dyn UnitOfWork) -> BoxFuture<'a, Result<T>> + Send + Sync,
    {
        let attempts = AtomicU32::new(0);

        let result = with_retry(cancel, self.retry_config.clone(), || async {
            let attempt = attempts.fetch_add(1, Ordering::SeqCst) + 1;
            if attempt > 1 {
                if let Some(metrics) = &self.metrics {
                    metrics.increment_transaction_retry();
                }
            }

            let mut uow = self.uow_factory.create_unit_of_work();

            uow.begin().await.map_err(|e| {
                tracing::error!(
                    error = %e,
                    retry_attempt = attempt,
                    "Failed to start transaction"
                );
                e
            })?;

            match f(uow.as_mut()).await {
                Ok(value) => {
                    if let Err(commit_err) = uow.commit().await {
                        tracing::error!(error = %commit_err, "Failed to commit transaction");
                        if let Err(rollback_err) = uow.rollback().await {
                            tracing::error!(
                                error = %rollback_err,
                                commit_error = %commit_err,
                                "Failed to rollback after failed commit"
                            );
                        }
                        return Err(commit_err);
                    }
                    Ok(value)
                }
                Err(original_err) => {
                    if let Err(rollback_err) = uow.rollback().await {
                        tracing::error!(
                            error = %rollback_err,
                            original_error = %original_err,
                            "Failed to rollback transaction"
                        );
                    }
                    Err(original_err)
                }
            }
        })
        .await;

        if let Some(metrics) = &self.metrics {
            match &result {
                Ok(_) if attempts.load(Ordering::SeqCst) > 1 => {
                    metrics.increment_transaction_retry_success();
                }
                Err(_) => metrics.increment_transaction_retry_failed(),
                _ => {}
            }
        }

        result
    }
}

#[async_trait]
impl ProductApplicationService for ProductService {
    async fn create_product_with_event(
        &self,
        cancel: &CancellationToken,
        product: Product,
        idempotency_key: Option<String>,
    ) -> Result<Product> {
        let idempotency_key = resolve_idempotency_key(idempotency_key);

        self.execute_in_transaction(cancel, |uow| {
            let products = Arc::clone(&self.products);
            let outbox = Arc::clone(&self.outbox);
            let metrics = self.metrics.clone();
            let mut product = product.clone();
            let idempotency_key = idempotency_key.clone();

            Box::pin(async move {
                // Garde de rejeu : la prise de clé verrouille les écrivains
                // concurrents partageant la même clé pour la durée de la
                // transaction. Si la clé a déjà produit un événement, on ne
                // réécrit rien et on rend le produit tel quel (id non assigné)
                if outbox
                    .claim_idempotency_key(&idempotency_key, uow.transaction())
                    .await?
                {
                    tracing::info!(
                        idempotency_key = %idempotency_key,
                        "Duplicate create request replayed, nothing written"
                    );
                    return Ok(product);
                }

                products
                    .create(&mut product, uow.transaction())
                    .await
                    .map_err(|e| {
                        tracing::error!(
                            error = %e,
                            product_name = %product.name(),
                            "Failed to save product to repository"
                        );
                        e
                    })?;

                product.record_created_event();

                let events = product.pull_events();
                if events.is_empty() {
                    return Err(internal_err("no domain event recorded for created product"));
                }

                persist_events_to_outbox(
                    outbox.as_ref(),
                    metrics.as_deref(),
                    &events,
                    &idempotency_key,
                    uow,
                )
                .await
                .map_err(|e| {
                    tracing::error!(
                        error = %e,
                        product_id = product.id(),
                        "Failed to save events to outbox"
                    );
                    e
                })?;

                tracing::info!(
                    product_id = product.id(),
                    product_name = %product.name(),
                    "Product created successfully"
                );

                Ok(product)
            })
        })
        .await
    }

    async fn delete_product_with_event(
        &self,
        cancel: &CancellationToken,
        product: Product,
        idempotency_key: Option<String>,
    ) -> Result<()> {
        let idempotency_key = resolve_idempotency_key(idempotency_key);

        self.execute_in_transaction(cancel, |uow| {
            let products = Arc::clone(&self.products);
            let outbox = Arc::clone(&self.outbox);
            let metrics = self.metrics.clone();
            let mut product = product.clone();
            let idempotency_key = idempotency_key.clone();

            Box::pin(async move {
                products
                    .delete(product.id(), uow.transaction())
                    .await
                    .map_err(|e| {
                        if e.is_not_found() {
                            tracing::warn!(
                                product_id = product.id(),
                                "Product not found for deletion"
                            );
                        } else {
                            tracing::error!(
                                error = %e,
                                product_id = product.id(),
                                "Failed to delete product from repository"
                            );
                        }
                        e
                    })?;

                let events = product.pull_events();
                if events.is_empty() {
                    return Err(internal_err(
                        "no domain events found on product, the delete event must be recorded by the use case layer",
                    ));
                }

                persist_events_to_outbox(
                    outbox.as_ref(),
                    metrics.as_deref(),
                    &events,
                    &idempotency_key,
                    uow,
                )
                .await
                .map_err(|e| {
                    tracing::error!(
                        error = %e,
                        product_id = product.id(),
                        "Failed to save events to outbox"
                    );
                    e
                })?;

                tracing::info!(product_id = product.id(), "Product deleted successfully");

                Ok(())
            })
        })
        .await
    }
}

/// Sérialise les événements de domaine en lignes outbox et les insère par le
/// chemin batch, la clé d'idempotence threadée sur chaque ligne.
async fn persist_events_to_outbox(
    outbox: &dyn OutboxStore,
    metrics: Option<&dyn MetricsCollector>,
    events: &[ProductEvent],
    idempotency_key: &str,
    uow: &mut dyn UnitOfWork,
) -> Result<()> {
    let mut outbox_events = Vec::with_capacity(events.len());
    for event in events {
        outbox_events.push(OutboxEvent::pending(
            event.event_type(),
            event.to_payload()?,
            Some(idempotency_key.to_string()),
        ));
    }

    if let Some(metrics) = metrics {
        metrics.record_batch_size("save_events", outbox_events.len());
    }

    outbox
        .save_events_batch(&mut outbox_events, uow.transaction())
        .await
}

/// Clé fournie par le client, sinon clé de service : 128 bits aléatoires en
/// hexadécimal, seul point de sérialisation inter-processus des doublons.
fn resolve_idempotency_key(idempotency_key: Option<String>) -> String {
    match idempotency_key {
        Some(key) if !key.trim().is_empty() => key,
        _ => generate_idempotency_key(),
    }
}

fn generate_idempotency_key() -> String {
    let bytes: [u8; 16] = rand::rng().random();
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
