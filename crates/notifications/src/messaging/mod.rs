// crates/notifications/src/messaging/mod.rs

mod consumer;

pub use consumer::{RabbitMqConsumer, RabbitMqConsumerConfig};
