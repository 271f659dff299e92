// crates/notifications/src/domain/event.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const EVENT_PRODUCT_CREATED: &str = "PRODUCT_CREATED";
pub const EVENT_PRODUCT_DELETED: &str = "PRODUCT_DELETED";

/// Événement produit tel que reçu sur l'exchange fanout. Décodage indulgent :
/// seul un JSON invalide est une erreur, un type inconnu est bénin.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductEvent {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub product_id: i32,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

impl ProductEvent {
    pub fn is_known_kind(&self) -> bool {
        self.kind == EVENT_PRODUCT_CREATED || self.kind == EVENT_PRODUCT_DELETED
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decodes_wire_event() {
        let body = br#"{"type":"PRODUCT_CREATED","product_id":5,"timestamp":"2024-05-01T10:00:00.123456789Z"}"#;

        let event: ProductEvent = serde_json::from_slice(body).unwrap();

        assert_eq!(event.kind, EVENT_PRODUCT_CREATED);
        assert_eq!(event.product_id, 5);
        assert!(event.is_known_kind());
        assert!(event.timestamp.is_some());
    }

    #[test]
    fn test_unknown_kind_is_decodable_but_not_known() {
        let body = br#"{"type":"SOMETHING_ELSE","product_id":1}"#;

        let event: ProductEvent = serde_json::from_slice(body).unwrap();

        assert!(!event.is_known_kind());
    }

    #[test]
    fn test_missing_fields_default() {
        let event: ProductEvent = serde_json::from_slice(b"{}").unwrap();

        assert_eq!(event.kind, "");
        assert_eq!(event.product_id, 0);
        assert!(event.timestamp.is_none());
        assert!(!event.is_known_kind());
    }

    #[test]
    fn test_malformed_json_is_an_error() {
        assert!(serde_json::from_slice::<ProductEvent>(b"not json").is_err());
    }
}
