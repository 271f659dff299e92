// crates/products/src/domain/events/product_events.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use shared_kernel::errors::{DomainError, Result};

pub const EVENT_PRODUCT_CREATED: &str = "PRODUCT_CREATED";
pub const EVENT_PRODUCT_DELETED: &str = "PRODUCT_DELETED";

/// Événements du cycle de vie produit. La forme sérialisée est le format de
/// fil : `{"type": ..., "product_id": ..., "timestamp": ...}`, timestamp en
/// RFC 3339 nanosecondes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ProductEvent {
    #[serde(rename = "PRODUCT_CREATED")]
    Created {
        product_id: i32,
        #[serde(rename = "timestamp")]
        occurred_at: DateTime<Utc>,
    },

    #[serde(rename = "PRODUCT_DELETED")]
    Deleted {
        product_id: i32,
        #[serde(rename = "timestamp")]
        occurred_at: DateTime<Utc>,
    },
}

impl ProductEvent {
    pub fn created(product_id: i32) -> Self {
        Self::Created {
            product_id,
            occurred_at: Utc::now(),
        }
    }

    pub fn deleted(product_id: i32) -> Self {
        Self::Deleted {
            product_id,
            occurred_at: Utc::now(),
        }
    }

    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Created { .. } => EVENT_PRODUCT_CREATED,
            Self::Deleted { .. } => EVENT_PRODUCT_DELETED,
        }
    }

    pub fn product_id(&self) -> i32 {
        match self {
            Self::Created { product_id, .. } | Self::Deleted { product_id, .. } => *product_id,
        }
    }

    pub fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            Self::Created { occurred_at, .. } | Self::Deleted { occurred_at, .. } => *occurred_at,
        }
    }

    /// Payload JSON destiné à la colonne `event_data` de l'outbox
    pub fn to_payload(&self) -> Result<Value> {
        serde_json::to_value(self)
            .map_err(|e| DomainError::Internal(format!("Failed to serialize domain event: {e}")))
    }
}
