// crates/shared-kernel/src/application/ports/mod.rs

mod metrics_collector;
mod outbox_publisher;

pub use metrics_collector::MetricsCollector;
pub use outbox_publisher::OutboxPublisher;
