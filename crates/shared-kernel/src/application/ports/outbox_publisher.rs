// crates/shared-kernel/src/application/ports/outbox_publisher.rs

use async_trait::async_trait;
use crate::domain::outbox::OutboxEvent;
use crate::errors::AppResult;

/// Côté publication du dispatcher : adapte le payload d'une ligne outbox et
/// l'écrit sur le bus. Non transactionnel ; les échecs sont attendus et
/// rejoués par le dispatcher.
#[async_trait]
pub trait OutboxPublisher: Send + Sync {
    async fn publish(&self, event: &OutboxEvent) -> AppResult<()>;
}

#[async_trait]
impl<T: OutboxPublisher + ?Sized> OutboxPublisher for std::sync::Arc<T> {
    async fn publish(&self, event: &OutboxEvent) -> AppResult<()> {
        (**self).publish(event).await
    }
}
