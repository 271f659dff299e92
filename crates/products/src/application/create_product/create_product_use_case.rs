// crates/products/src/application/create_product/create_product_use_case.rs

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::application::create_product::CreateProductCommand;
use crate::application::ports::ProductApplicationService;
use crate::domain::entities::Product;
use crate::domain::services::ProductDomainService;
use shared_kernel::errors::Result;

pub struct CreateProductUseCase {
    app_service: Arc<dyn ProductApplicationService>,
    domain_service: Arc<dyn ProductDomainService>,
}

impl CreateProductUseCase {
    pub fn new(
        app_service: Arc<dyn ProductApplicationService>,
        domain_service: Arc<dyn ProductDomainService>,
    ) -> Self {
        Self {
            app_service,
            domain_service,
        }
    }

    pub async fn execute(
        &self,
        cancel: &CancellationToken,
        command: CreateProductCommand,
    ) -> Result<Product> {
        // 1. Règles métier branchables, avant toute construction
        self.domain_service
            .validate_product_for_creation(&command.name, command.price)
            .map_err(|e| {
                tracing::warn!(
                    error = %e,
                    name = %command.name,
                    price = command.price,
                    "Product validation failed"
                );
                e
            })?;

        // 2. Instanciation via les factories validantes du domaine
        let product = Product::try_new(command.name.as_str(), command.price).map_err(|e| {
            tracing::warn!(
                error = %e,
                name = %command.name,
                price = command.price,
                "Failed to create product domain entity"
            );
            e
        })?;

        // 3. Écriture atomique ligne + événement
        self.app_service
            .create_product_with_event(cancel, product, command.idempotency_key)
            .await
    }
}
