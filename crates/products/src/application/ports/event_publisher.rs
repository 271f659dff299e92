// crates/products/src/application/ports/event_publisher.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use shared_kernel::errors::AppResult;

/// Port du bus de messages côté produit. Les appels ne sont pas
/// transactionnels : les échecs sont attendus et rejoués par le dispatcher.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// `occurred_at` vient du payload outbox quand il est connu, sinon
    /// l'implémentation prend l'heure courante.
    async fn publish_product_created(
        &self,
        product_id: i32,
        occurred_at: Option<DateTime<Utc>>,
    ) -> AppResult<()>;

    async fn publish_product_deleted(
        &self,
        product_id: i32,
        occurred_at: Option<DateTime<Utc>>,
    ) -> AppResult<()>;

    /// Connexion ouverte ET sonde légère côté broker
    async fn is_healthy(&self) -> bool;

    /// Ferme canal puis connexion ; idempotent
    async fn close(&self) -> AppResult<()>;
}
