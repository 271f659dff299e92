// crates/products/src/application/ports/application_service.rs

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::domain::entities::Product;
use shared_kernel::errors::Result;

/// Port du service applicatif : "muter la ligne + émettre l'événement"
/// atomiquement, avec retry sur les échecs transitoires.
#[async_trait]
pub trait ProductApplicationService: Send + Sync {
    /// Insère le produit et son événement PRODUCT_CREATED dans la même
    /// transaction. Rend le produit avec l'identité assignée par le store.
    async fn create_product_with_event(
        &self,
        cancel: &CancellationToken,
        product: Product,
        idempotency_key: Option<String>,
    ) -> Result<Product>;

    /// Supprime la ligne et persiste les événements déjà enregistrés sur le
    /// produit (la couche use case attache PRODUCT_DELETED avant l'appel).
    /// Ligne absente : NotFound.
    async fn delete_product_with_event(
        &self,
        cancel: &CancellationToken,
        product: Product,
        idempotency_key: Option<String>,
    ) -> Result<()>;
}
