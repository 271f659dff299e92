// crates/products/src/infrastructure/messaging/event_adapter.rs

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::domain::events::{EVENT_PRODUCT_CREATED, EVENT_PRODUCT_DELETED};
use shared_kernel::domain::outbox::OutboxEvent;
use shared_kernel::errors::{DomainError, Result};

/// Ce que le dispatcher a besoin de savoir pour router un payload outbox
/// vers la bonne opération du publisher.
#[derive(Debug, Clone, PartialEq)]
pub struct AdaptedEvent {
    pub event_type: String,
    pub product_id: i32,
    pub occurred_at: DateTime<Utc>,
}

pub trait EventAdapter: Send + Sync {
    fn adapt(&self, event: &OutboxEvent) -> Result<AdaptedEvent>;
}

/// Décodage indulgent : champs absents tolérés, validés ensuite par
/// l'adaptateur qui consomme la forme.
#[derive(Deserialize)]
struct RawEventPayload {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    product_id: i32,
    #[serde(default)]
    timestamp: Option<DateTime<Utc>>,
}

fn decode_raw(event: &OutboxEvent) -> Result<RawEventPayload> {
    serde_json::from_value(event.event_data.clone())
        .map_err(|e| DomainError::Internal(format!("Failed to decode outbox payload: {e}")))
}

/// Forme "infrastructure" `{type, product_id, timestamp}` : on fait confiance
/// au producteur, seul un timestamp absent est remplacé par l'heure courante.
pub struct InfrastructureEventAdapter;

impl EventAdapter for InfrastructureEventAdapter {
    fn adapt(&self, event: &OutboxEvent) -> Result<AdaptedEvent> {
        let raw = decode_raw(event)?;

        Ok(AdaptedEvent {
            event_type: raw.kind,
            product_id: raw.product_id,
            occurred_at: raw.timestamp.unwrap_or_else(Utc::now),
        })
    }
}

/// Forme "domaine" : mêmes champs, mais un type manquant est une erreur et un
/// événement produit doit porter un product_id non nul.
pub struct DomainEventAdapter;

impl EventAdapter for DomainEventAdapter {
    fn adapt(&self, event: &OutboxEvent) -> Result<AdaptedEvent> {
        let raw = decode_raw(event)?;

        if raw.kind.is_empty() {
            return Err(DomainError::Internal(
                "missing event type in domain event payload".into(),
            ));
        }

        if (raw.kind == EVENT_PRODUCT_CREATED || raw.kind == EVENT_PRODUCT_DELETED)
            && raw.product_id == 0
        {
            return Err(DomainError::Internal(
                "missing product_id in product event payload".into(),
            ));
        }

        Ok(AdaptedEvent {
            event_type: raw.kind,
            product_id: raw.product_id,
            occurred_at: raw.timestamp.unwrap_or_else(Utc::now),
        })
    }
}

/// Shim de compatibilité pour les formes de payload historiques : tente la
/// forme infrastructure, retombe sur la forme domaine quand le type manque.
pub struct SmartEventAdapter {
    infrastructure: InfrastructureEventAdapter,
    domain: DomainEventAdapter,
}

impl SmartEventAdapter {
    pub fn new() -> Self {
        Self {
            infrastructure: InfrastructureEventAdapter,
            domain: DomainEventAdapter,
        }
    }
}

impl Default for SmartEventAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl EventAdapter for SmartEventAdapter {
    fn adapt(&self, event: &OutboxEvent) -> Result<AdaptedEvent> {
        if let Ok(adapted) = self.infrastructure.adapt(event) {
            if !adapted.event_type.is_empty() {
                return Ok(adapted);
            }
        }

        self.domain.adapt(event)
    }
}
