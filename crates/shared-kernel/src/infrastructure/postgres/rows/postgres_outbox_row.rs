// crates/shared-kernel/src/infrastructure/postgres/rows/postgres_outbox_row.rs

use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::FromRow;

use crate::domain::outbox::{OutboxEvent, OutboxStatus};
use crate::errors::DomainError;

/// Struct privé à l'infrastructure pour le mapping sqlx
#[derive(FromRow)]
pub struct OutboxRow {
    id: i64,
    event_type: String,
    event_data: Value,
    idempotency_key: Option<String>,
    status: String,
    retry_count: i32,
    created_at: DateTime<Utc>,
    published_at: Option<DateTime<Utc>>,
    dlq_reason: Option<String>,
}

impl TryFrom<OutboxRow> for OutboxEvent {
    type Error = DomainError;

    fn try_from(row: OutboxRow) -> Result<Self, Self::Error> {
        let status = OutboxStatus::parse(&row.status).ok_or(DomainError::DataCorruption {
            entity: "OutboxEvent",
            reason: format!("unknown outbox status '{}'", row.status),
        })?;

        Ok(Self {
            id: row.id,
            event_type: row.event_type,
            event_data: row.event_data,
            idempotency_key: row.idempotency_key,
            status,
            retry_count: row.retry_count,
            created_at: row.created_at,
            published_at: row.published_at,
            dlq_reason: row.dlq_reason,
        })
    }
}
