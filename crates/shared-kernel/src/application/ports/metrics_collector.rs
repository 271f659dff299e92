// crates/shared-kernel/src/application/ports/metrics_collector.rs

use std::time::Duration;

/// Port d'observation. Aucun backend d'export ici : les workers et les
/// décorateurs de repositories enregistrent, l'implémentation décide quoi en
/// faire.
pub trait MetricsCollector: Send + Sync {
    /// Résolution finale d'un événement outbox : "published", "failed" ou "dlq"
    fn record_outbox_event_processed(&self, event_type: &str, outcome: &str);

    fn record_outbox_retry_attempt(&self, event_type: &str, retry_count: i32);

    fn record_batch_size(&self, operation: &str, size: usize);

    fn record_database_query_duration(&self, duration: Duration);

    fn increment_transaction_retry(&self);

    fn increment_transaction_retry_success(&self);

    fn increment_transaction_retry_failed(&self);
}
