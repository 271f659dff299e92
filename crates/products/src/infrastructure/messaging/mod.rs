// crates/products/src/infrastructure/messaging/mod.rs

mod event_adapter;
mod outbox_bridge;
mod rabbitmq_config;
mod rabbitmq_publisher;

pub use event_adapter::{
    AdaptedEvent, DomainEventAdapter, EventAdapter, InfrastructureEventAdapter, SmartEventAdapter,
};
pub use outbox_bridge::ProductOutboxBridge;
pub use rabbitmq_config::RabbitMqConfig;
pub use rabbitmq_publisher::RabbitMqPublisher;
