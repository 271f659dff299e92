// crates/products/src/infrastructure/messaging/outbox_bridge.rs

use std::sync::Arc;

use async_trait::async_trait;

use crate::application::ports::EventPublisher;
use crate::domain::events::{EVENT_PRODUCT_CREATED, EVENT_PRODUCT_DELETED};
use crate::infrastructure::messaging::{EventAdapter, SmartEventAdapter};
use shared_kernel::application::ports::OutboxPublisher;
use shared_kernel::domain::outbox::OutboxEvent;
use shared_kernel::errors::{AppError, AppResult, ErrorCode};

/// Pont entre le dispatcher générique et le bus produit : adapte le payload
/// d'une ligne outbox puis route vers l'opération de publication correspondante.
pub struct ProductOutboxBridge {
    adapter: SmartEventAdapter,
    publisher: Arc<dyn EventPublisher>,
}

impl ProductOutboxBridge {
    pub fn new(publisher: Arc<dyn EventPublisher>) -> Self {
        Self {
            adapter: SmartEventAdapter::new(),
            publisher,
        }
    }
}

#[async_trait]
impl OutboxPublisher for ProductOutboxBridge {
    async fn publish(&self, event: &OutboxEvent) -> AppResult<()> {
        let adapted = self.adapter.adapt(event).map_err(|e| {
            AppError::new(
                ErrorCode::InternalError,
                format!("Failed to adapt outbox event {}: {e}", event.id),
            )
        })?;

        match adapted.event_type.as_str() {
            EVENT_PRODUCT_CREATED => {
                self.publisher
                    .publish_product_created(adapted.product_id, Some(adapted.occurred_at))
                    .await
            }
            EVENT_PRODUCT_DELETED => {
                self.publisher
                    .publish_product_deleted(adapted.product_id, Some(adapted.occurred_at))
                    .await
            }
            other => Err(AppError::new(
                ErrorCode::InternalError,
                format!("unknown event type: {other}"),
            )),
        }
    }
}
