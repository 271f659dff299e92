// crates/shared-kernel/src/utils/outbox_stubs.rs
#![cfg(test)]

use std::sync::Mutex;
use std::sync::atomic::{AtomicI32, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use crate::application::ports::{MetricsCollector, OutboxPublisher};
use crate::domain::outbox::{OutboxEvent, OutboxStore};
use crate::domain::transaction::Transaction;
use crate::errors::{AppError, AppResult, DomainError, ErrorCode, Result};

// --- STUB OUTBOX STORE ---
#[derive(Default)]
pub struct OutboxStoreStub {
    pub pending: Mutex<Vec<OutboxEvent>>,
    pub saved: Mutex<Vec<OutboxEvent>>,
    pub published: Mutex<Vec<i64>>,
    pub failed: Mutex<Vec<(i64, i32)>>,
    pub dlq: Mutex<Vec<(i64, String)>>,
    pub fail_dlq: bool,
}

impl OutboxStoreStub {
    pub fn with_pending(events: Vec<OutboxEvent>) -> Self {
        Self {
            pending: Mutex::new(events),
            ..Default::default()
        }
    }
}

#[async_trait]
impl OutboxStore for OutboxStoreStub {
    async fn save_event(
        &self,
        event: &mut OutboxEvent,
        _tx: Option<&mut dyn Transaction>,
    ) -> Result<()> {
        self.saved.lock().unwrap().push(event.clone());
        Ok(())
    }

    async fn get_pending_events(&self, limit: u32) -> Result<Vec<OutboxEvent>> {
        let mut pending = self.pending.lock().unwrap();
        let take = (limit as usize).min(pending.len());
        Ok(pending.drain(..take).collect())
    }

    async fn mark_as_published(&self, event_id: i64) -> Result<()> {
        self.published.lock().unwrap().push(event_id);
        Ok(())
    }

    async fn mark_as_failed(&self, event_id: i64, retry_count: i32) -> Result<()> {
        self.failed.lock().unwrap().push((event_id, retry_count));
        Ok(())
    }

    async fn move_to_dlq(&self, event_id: i64, reason: &str) -> Result<()> {
        if self.fail_dlq {
            return Err(DomainError::Infrastructure("dlq write refused".into()));
        }
        self.dlq.lock().unwrap().push((event_id, reason.to_string()));
        Ok(())
    }

    async fn check_idempotency_key(&self, idempotency_key: &str) -> Result<bool> {
        Ok(self
            .saved
            .lock()
            .unwrap()
            .iter()
            .any(|e| e.idempotency_key.as_deref() == Some(idempotency_key)))
    }
}

// --- STUB PUBLISHER ---
pub struct OutboxPublisherStub {
    pub published: Mutex<Vec<i64>>,
    /// Nombre d'échecs restants avant de réussir ; négatif = échoue toujours
    pub fail_remaining: AtomicI32,
    pub delay: Duration,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

impl Default for OutboxPublisherStub {
    fn default() -> Self {
        Self {
            published: Mutex::new(Vec::new()),
            fail_remaining: AtomicI32::new(0),
            delay: Duration::ZERO,
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }
}

impl OutboxPublisherStub {
    pub fn always_failing() -> Self {
        Self {
            fail_remaining: AtomicI32::new(-1),
            ..Default::default()
        }
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            ..Default::default()
        }
    }
}

#[async_trait]
impl OutboxPublisher for OutboxPublisherStub {
    async fn publish(&self, event: &OutboxEvent) -> AppResult<()> {
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let remaining = self.fail_remaining.load(Ordering::SeqCst);
        if remaining < 0 {
            return Err(AppError::new(ErrorCode::InternalError, "bus unreachable"));
        }
        if remaining > 0 {
            self.fail_remaining.fetch_sub(1, Ordering::SeqCst);
            return Err(AppError::new(ErrorCode::InternalError, "transient bus failure"));
        }

        self.published.lock().unwrap().push(event.id);
        Ok(())
    }
}

// --- STUB METRICS ---
#[derive(Default)]
pub struct MetricsCollectorStub {
    pub outcomes: Mutex<Vec<(String, String)>>,
    pub retry_attempts: Mutex<Vec<(String, i32)>>,
    pub batch_sizes: Mutex<Vec<(String, usize)>>,
    pub transaction_retries: AtomicUsize,
}

impl MetricsCollector for MetricsCollectorStub {
    fn record_outbox_event_processed(&self, event_type: &str, outcome: &str) {
        self.outcomes
            .lock()
            .unwrap()
            .push((event_type.to_string(), outcome.to_string()));
    }

    fn record_outbox_retry_attempt(&self, event_type: &str, retry_count: i32) {
        self.retry_attempts
            .lock()
            .unwrap()
            .push((event_type.to_string(), retry_count));
    }

    fn record_batch_size(&self, operation: &str, size: usize) {
        self.batch_sizes
            .lock()
            .unwrap()
            .push((operation.to_string(), size));
    }

    fn record_database_query_duration(&self, _duration: Duration) {}

    fn increment_transaction_retry(&self) {
        self.transaction_retries.fetch_add(1, Ordering::SeqCst);
    }

    fn increment_transaction_retry_success(&self) {}

    fn increment_transaction_retry_failed(&self) {}
}
