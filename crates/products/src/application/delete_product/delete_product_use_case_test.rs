// crates/products/src/application/delete_product/delete_product_use_case_test.rs

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tokio_util::sync::CancellationToken;

    use crate::application::delete_product::{DeleteProductCommand, DeleteProductUseCase};
    use crate::application::ports::ProductApplicationService;
    use crate::domain::entities::Product;
    use crate::domain::repositories::ProductRepository;
    use crate::domain::services::DefaultProductDomainService;
    use crate::utils::product_stubs::{AppServiceStub, ProductRepositoryStub};
    use shared_kernel::errors::DomainError;

    fn setup() -> (
        DeleteProductUseCase,
        Arc<ProductRepositoryStub>,
        Arc<AppServiceStub>,
    ) {
        let repo = Arc::new(ProductRepositoryStub::default());
        let app_service = Arc::new(AppServiceStub::default());
        let use_case = DeleteProductUseCase::new(
            Arc::clone(&repo) as Arc<dyn ProductRepository>,
            Arc::clone(&app_service) as Arc<dyn ProductApplicationService>,
            Arc::new(DefaultProductDomainService::default()),
        );
        (use_case, repo, app_service)
    }

    fn stored_product(id: i32) -> Product {
        let mut product = Product::try_new("Widget", 9.99).unwrap();
        product.mark_persisted(id, chrono::Utc::now());
        product
    }

    #[tokio::test]
    async fn test_delete_records_event_then_calls_service() {
        // Arrange
        let (use_case, repo, app_service) = setup();
        *repo.product_to_return.lock().unwrap() = Some(stored_product(7));
        let cancel = CancellationToken::new();

        // Act
        use_case
            .execute(
                &cancel,
                DeleteProductCommand {
                    id: 7,
                    idempotency_key: Some("k1".into()),
                },
            )
            .await
            .unwrap();

        // Assert : le produit transmis porte l'événement de suppression
        let deleted = app_service.deleted.lock().unwrap();
        assert_eq!(deleted.len(), 1);
        let (product, key) = &deleted[0];
        assert_eq!(product.id(), 7);
        assert!(product.has_pending_events());
        assert_eq!(key.as_deref(), Some("k1"));
    }

    #[tokio::test]
    async fn test_invalid_id_is_rejected() {
        let (use_case, _repo, app_service) = setup();
        let cancel = CancellationToken::new();

        let result = use_case
            .execute(
                &cancel,
                DeleteProductCommand {
                    id: 0,
                    idempotency_key: None,
                },
            )
            .await;

        assert!(matches!(
            result,
            Err(DomainError::Validation { field: "id", .. })
        ));
        assert!(app_service.deleted.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_absent_product_surfaces_not_found_without_service_call() {
        // Arrange : le repo ne connaît pas cet id
        let (use_case, _repo, app_service) = setup();
        let cancel = CancellationToken::new();

        // Act
        let result = use_case
            .execute(
                &cancel,
                DeleteProductCommand {
                    id: 9999,
                    idempotency_key: Some("k4".into()),
                },
            )
            .await;

        // Assert
        assert!(matches!(
            result,
            Err(DomainError::NotFound { entity: "Product", .. })
        ));
        assert!(app_service.deleted.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_service_error_is_propagated() {
        let (use_case, repo, app_service) = setup();
        *repo.product_to_return.lock().unwrap() = Some(stored_product(3));
        *app_service.error_to_return.lock().unwrap() =
            Some(DomainError::Infrastructure("db down".into()));
        let cancel = CancellationToken::new();

        let result = use_case
            .execute(
                &cancel,
                DeleteProductCommand {
                    id: 3,
                    idempotency_key: None,
                },
            )
            .await;

        assert!(result.is_err());
    }
}
