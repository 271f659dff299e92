// crates/products/src/application/delete_product/delete_product_use_case.rs

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::application::delete_product::DeleteProductCommand;
use crate::application::ports::ProductApplicationService;
use crate::domain::repositories::ProductRepository;
use crate::domain::services::ProductDomainService;
use shared_kernel::errors::{DomainError, Result};

pub struct DeleteProductUseCase {
    repo: Arc<dyn ProductRepository>,
    app_service: Arc<dyn ProductApplicationService>,
    domain_service: Arc<dyn ProductDomainService>,
}

impl DeleteProductUseCase {
    pub fn new(
        repo: Arc<dyn ProductRepository>,
        app_service: Arc<dyn ProductApplicationService>,
        domain_service: Arc<dyn ProductDomainService>,
    ) -> Self {
        Self {
            repo,
            app_service,
            domain_service,
        }
    }

    pub async fn execute(
        &self,
        cancel: &CancellationToken,
        command: DeleteProductCommand,
    ) -> Result<()> {
        if command.id <= 0 {
            tracing::warn!(product_id = command.id, "Invalid product id for deletion");
            return Err(DomainError::Validation {
                field: "id",
                reason: "Product id must be a positive integer".into(),
            });
        }

        // 1. Chargement : un id absent sort ici en NotFound, avant toute écriture
        let mut product = self.repo.get_by_id(command.id).await.map_err(|e| {
            if e.is_not_found() {
                tracing::warn!(product_id = command.id, "Product not found for deletion");
            } else {
                tracing::error!(
                    error = %e,
                    product_id = command.id,
                    "Failed to load product for deletion"
                );
            }
            e
        })?;

        self.domain_service.can_delete_product(&product)?;

        // 2. Le fait métier est enregistré ici ; le service applicatif le
        //    persiste dans la même transaction que le DELETE
        product.record_deleted_event();

        self.app_service
            .delete_product_with_event(cancel, product, command.idempotency_key)
            .await
    }
}
