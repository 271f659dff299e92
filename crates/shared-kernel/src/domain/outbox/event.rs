// crates/shared-kernel/src/domain/outbox/event.rs

use chrono::{DateTime, Utc};
use serde_json::Value;

/// Cycle de vie d'une ligne outbox.
/// `Published` et `Dlq` sont terminaux ; `Failed` est repris par le poll
/// tant que `retry_count` n'a pas dépassé le plafond configuré.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutboxStatus {
    Pending,
    Published,
    Failed,
    Dlq,
}

impl OutboxStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Published => "published",
            Self::Failed => "failed",
            Self::Dlq => "dlq",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(Self::Pending),
            "published" => Some(Self::Published),
            "failed" => Some(Self::Failed),
            "dlq" => Some(Self::Dlq),
            _ => None,
        }
    }
}

impl std::fmt::Display for OutboxStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Une ligne de la table outbox : l'événement métier sérialisé, écrit dans la
/// même transaction que la mutation qu'il décrit.
#[derive(Debug, Clone)]
pub struct OutboxEvent {
    /// Assigné par le store (BIGSERIAL). Reste à 0 tant que la ligne n'est pas
    /// insérée, et après un rejeu idempotent (conflit silencieux) : les
    /// appelants ne doivent pas dépendre de l'id dans ce cas.
    pub id: i64,
    pub event_type: String,
    pub event_data: Value,
    pub idempotency_key: Option<String>,
    pub status: OutboxStatus,
    pub retry_count: i32,
    pub created_at: DateTime<Utc>,
    pub published_at: Option<DateTime<Utc>>,
    pub dlq_reason: Option<String>,
}

impl OutboxEvent {
    /// Construit un événement prêt à être inséré (`status = pending`).
    /// `created_at` définitif est assigné par le store (NOW()).
    pub fn pending(
        event_type: impl Into<String>,
        event_data: Value,
        idempotency_key: Option<String>,
    ) -> Self {
        Self {
            id: 0,
            event_type: event_type.into(),
            event_data,
            idempotency_key,
            status: OutboxStatus::Pending,
            retry_count: 0,
            created_at: Utc::now(),
            published_at: None,
            dlq_reason: None,
        }
    }
}
