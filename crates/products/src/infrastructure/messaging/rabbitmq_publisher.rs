// crates/products/src/infrastructure/messaging/rabbitmq_publisher.rs

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lapin::options::{BasicPublishOptions, ExchangeDeclareOptions, QueueDeclareOptions};
use lapin::protocol::constants::REPLY_SUCCESS;
use lapin::types::FieldTable;
use lapin::{BasicProperties, Channel, Connection, ConnectionProperties, ExchangeKind};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::application::ports::EventPublisher;
use crate::domain::events::{EVENT_PRODUCT_CREATED, EVENT_PRODUCT_DELETED};
use crate::infrastructure::messaging::RabbitMqConfig;
use shared_kernel::errors::{AppError, AppResult, DomainError, ErrorCode};
use shared_kernel::infrastructure::retry::{RetryConfig, with_retry};

/// Forme de fil d'un événement produit
#[derive(Debug, Serialize)]
struct InfrastructureEvent {
    #[serde(rename = "type")]
    kind: &'static str,
    product_id: i32,
    timestamp: DateTime<Utc>,
}

/// Publisher AMQP : exchange fanout durable, routing key vide,
/// content-type application/json.
pub struct RabbitMqPublisher {
    connection: Connection,
    channel: Channel,
    exchange: String,
}

impl RabbitMqPublisher {
    /// L'établissement de la connexion est enveloppé dans le moteur de retry
    /// pour survivre aux démarrages à froid (broker pas encore prêt).
    pub async fn connect(cancel: &CancellationToken, config: &RabbitMqConfig) -> AppResult<Self> {
        let retry_config = RetryConfig {
            max_attempts: 5,
            base_backoff: Duration::from_secs(2),
            max_backoff: Duration::from_secs(10),
            initial_delay: Duration::from_secs(1),
        };

        let url = config.url();
        let connection = with_retry(cancel, retry_config.clone(), || async {
            Connection::connect(&url, ConnectionProperties::default())
                .await
                .map_err(|e| DomainError::Infrastructure(format!("Failed to dial RabbitMQ: {e}")))
        })
        .await
        .map_err(connect_error)?;

        let channel = with_retry(cancel, retry_config.clone(), || async {
            connection
                .create_channel()
                .await
                .map_err(|e| DomainError::Infrastructure(format!("Failed to create channel: {e}")))
        })
        .await
        .map_err(connect_error)?;

        let exchange = config.exchange.clone();
        with_retry(cancel, retry_config, || async {
            channel
                .exchange_declare(
                    &exchange,
                    ExchangeKind::Fanout,
                    ExchangeDeclareOptions {
                        durable: true,
                        ..Default::default()
                    },
                    FieldTable::default(),
                )
                .await
                .map_err(|e| DomainError::Infrastructure(format!("Failed to declare exchange: {e}")))
        })
        .await
        .map_err(connect_error)?;

        tracing::info!(exchange = %exchange, "Connected to RabbitMQ");

        Ok(Self {
            connection,
            channel,
            exchange,
        })
    }

    async fn publish_infrastructure_event(&self, event: InfrastructureEvent) -> AppResult<()> {
        let body = serde_json::to_vec(&event).map_err(|e| {
            AppError::new(
                ErrorCode::InternalError,
                format!("Failed to serialize infrastructure event: {e}"),
            )
        })?;

        self.channel
            .basic_publish(
                &self.exchange,
                "",
                BasicPublishOptions::default(),
                &body,
                BasicProperties::default()
                    .with_content_type("application/json".into())
                    .with_timestamp(event.timestamp.timestamp() as u64),
            )
            .await
            .map_err(|e| {
                tracing::error!(error = %e, event_type = event.kind, "Failed to publish event");
                AppError::from(e)
            })?
            .await
            .map_err(|e| {
                tracing::error!(error = %e, event_type = event.kind, "Broker rejected event");
                AppError::from(e)
            })?;

        tracing::info!(
            event_type = event.kind,
            product_id = event.product_id,
            "Event published to exchange"
        );

        Ok(())
    }
}

fn connect_error(e: DomainError) -> AppError {
    AppError::new(
        ErrorCode::ServiceUnavailable,
        format!("Failed to connect to RabbitMQ after retries: {e}"),
    )
}

#[async_trait]
impl EventPublisher for RabbitMqPublisher {
    async fn publish_product_created(
        &self,
        product_id: i32,
        occurred_at: Option<DateTime<Utc>>,
    ) -> AppResult<()> {
        self.publish_infrastructure_event(InfrastructureEvent {
            kind: EVENT_PRODUCT_CREATED,
            product_id,
            timestamp: occurred_at.unwrap_or_else(Utc::now),
        })
        .await
    }

    async fn publish_product_deleted(
        &self,
        product_id: i32,
        occurred_at: Option<DateTime<Utc>>,
    ) -> AppResult<()> {
        self.publish_infrastructure_event(InfrastructureEvent {
            kind: EVENT_PRODUCT_DELETED,
            product_id,
            timestamp: occurred_at.unwrap_or_else(Utc::now),
        })
        .await
    }

    async fn is_healthy(&self) -> bool {
        if !self.connection.status().connected() {
            return false;
        }

        // Sonde légère : déclaration d'une file anonyme éphémère
        self.channel
            .queue_declare(
                "",
                QueueDeclareOptions {
                    exclusive: true,
                    auto_delete: true,
                    ..Default::default()
                },
                FieldTable::default(),
            )
            .await
            .is_ok()
    }

    async fn close(&self) -> AppResult<()> {
        // Canal puis connexion ; une fermeture déjà faite n'est pas une erreur
        if let Err(e) = self.channel.close(REPLY_SUCCESS, "closing").await {
            tracing::warn!(error = %e, "Channel close reported an error");
        }
        if let Err(e) = self.connection.close(REPLY_SUCCESS, "closing").await {
            tracing::warn!(error = %e, "Connection close reported an error");
        }
        Ok(())
    }
}
