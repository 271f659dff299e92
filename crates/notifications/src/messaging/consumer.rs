// crates/notifications/src/messaging/consumer.rs

use futures_util::StreamExt;
use lapin::message::Delivery;
use lapin::options::{
    BasicAckOptions, BasicConsumeOptions, BasicNackOptions, ExchangeDeclareOptions,
    QueueBindOptions, QueueDeclareOptions,
};
use lapin::protocol::constants::REPLY_SUCCESS;
use lapin::types::FieldTable;
use lapin::{Channel, Connection, ConnectionProperties, ExchangeKind};
use tokio_util::sync::CancellationToken;

use crate::domain::ProductEvent;
use shared_kernel::errors::AppResult;

pub struct RabbitMqConsumerConfig {
    pub host: String,
    pub port: String,
    pub user: String,
    pub password: String,
    pub exchange: String,
}

impl RabbitMqConsumerConfig {
    pub fn from_env() -> Self {
        Self {
            host: env_or("RABBITMQ_HOST", "localhost"),
            port: env_or("RABBITMQ_PORT", "5672"),
            user: env_or("RABBITMQ_USER", "guest"),
            password: env_or("RABBITMQ_PASSWORD", "guest"),
            exchange: env_or("RABBITMQ_EXCHANGE", "products_events"),
        }
    }

    pub fn url(&self) -> String {
        format!(
            "amqp://{}:{}@{}:{}",
            self.user, self.password, self.host, self.port
        )
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Abonné de l'exchange fanout : file anonyme exclusive auto-supprimée,
/// routing key vide. Décode, filtre les types inconnus, ack/nack.
pub struct RabbitMqConsumer {
    connection: Connection,
    channel: Channel,
    exchange: String,
    queue_name: String,
}

impl RabbitMqConsumer {
    pub async fn connect(config: &RabbitMqConsumerConfig) -> AppResult<Self> {
        let connection =
            Connection::connect(&config.url(), ConnectionProperties::default()).await?;
        let channel = connection.create_channel().await?;

        channel
            .exchange_declare(
                &config.exchange,
                ExchangeKind::Fanout,
                ExchangeDeclareOptions {
                    durable: true,
                    ..Default::default()
                },
                FieldTable::default(),
            )
            .await?;

        // File anonyme : le broker choisit le nom, la file meurt avec nous
        let queue = channel
            .queue_declare(
                "",
                QueueDeclareOptions {
                    exclusive: true,
                    auto_delete: true,
                    ..Default::default()
                },
                FieldTable::default(),
            )
            .await?;

        channel
            .queue_bind(
                queue.name().as_str(),
                &config.exchange,
                "",
                QueueBindOptions::default(),
                FieldTable::default(),
            )
            .await?;

        Ok(Self {
            connection,
            channel,
            exchange: config.exchange.clone(),
            queue_name: queue.name().as_str().to_string(),
        })
    }

    /// Boucle de lecture unique, jusqu'à annulation ou fermeture du canal
    pub async fn run(&self, cancel: CancellationToken) -> AppResult<()> {
        let mut consumer = self
            .channel
            .basic_consume(
                &self.queue_name,
                "",
                BasicConsumeOptions::default(),
                FieldTable::default(),
            )
            .await?;

        tracing::info!(
            exchange = %self.exchange,
            queue = %self.queue_name,
            "Started consuming messages"
        );

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Context cancelled, stopping consumer");
                    break;
                }
                delivery = consumer.next() => {
                    match delivery {
                        Some(Ok(delivery)) => handle_message(delivery).await,
                        Some(Err(e)) => {
                            tracing::error!(error = %e, "Failed to receive delivery");
                        }
                        None => {
                            tracing::info!("Message channel closed");
                            break;
                        }
                    }
                }
            }
        }

        Ok(())
    }

    pub async fn close(&self) -> AppResult<()> {
        if let Err(e) = self.channel.close(REPLY_SUCCESS, "closing").await {
            tracing::warn!(error = %e, "Channel close reported an error");
        }
        if let Err(e) = self.connection.close(REPLY_SUCCESS, "closing").await {
            tracing::warn!(error = %e, "Connection close reported an error");
        }
        Ok(())
    }
}

async fn handle_message(delivery: Delivery) {
    let event: ProductEvent = match serde_json::from_slice(&delivery.data) {
        Ok(event) => event,
        Err(e) => {
            tracing::error!(
                error = %e,
                body = %String::from_utf8_lossy(&delivery.data),
                "Failed to decode message"
            );
            // Message illisible : on le rejette sans le remettre en file
            if let Err(nack_err) = delivery
                .nack(BasicNackOptions {
                    requeue: false,
                    ..Default::default()
                })
                .await
            {
                tracing::error!(error = %nack_err, "Failed to nack message");
            }
            return;
        }
    };

    if !event.is_known_kind() {
        // Type inconnu : bénin, un producteur plus récent parle sans doute
        tracing::warn!(
            event_type = %event.kind,
            body = %String::from_utf8_lossy(&delivery.data),
            "Unknown event type"
        );
        ack(delivery).await;
        return;
    }

    tracing::info!(
        event_type = %event.kind,
        product_id = event.product_id,
        timestamp = ?event.timestamp,
        "Received product event"
    );

    ack(delivery).await;
}

async fn ack(delivery: Delivery) {
    // Un ack raté se log, il ne fait pas tomber le consumer
    if let Err(e) = delivery.ack(BasicAckOptions::default()).await {
        tracing::error!(error = %e, "Failed to acknowledge message");
    }
}
