// crates/products/src/application/product_service/product_service_test.rs

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::Ordering;

    use tokio_util::sync::CancellationToken;

    use crate::application::ports::ProductApplicationService;
    use crate::application::product_service::ProductService;
    use crate::domain::entities::Product;
    use crate::domain::repositories::ProductRepository;
    use crate::utils::product_stubs::{
        MetricsCollectorStub, OutboxStoreStub, ProductRepositoryStub, UowFactoryStub,
    };
    use shared_kernel::application::ports::MetricsCollector;
    use shared_kernel::domain::outbox::OutboxStore;
    use shared_kernel::domain::transaction::UowFactory;
    use shared_kernel::errors::DomainError;

    struct Harness {
        service: ProductService,
        repo: Arc<ProductRepositoryStub>,
        outbox: Arc<OutboxStoreStub>,
        uow: Arc<UowFactoryStub>,
        metrics: Arc<MetricsCollectorStub>,
    }

    fn setup() -> Harness {
        let repo = Arc::new(ProductRepositoryStub::default());
        let outbox = Arc::new(OutboxStoreStub::default());
        let uow = Arc::new(UowFactoryStub::default());
        let metrics = Arc::new(MetricsCollectorStub::default());

        let service = ProductService::new(
            Arc::clone(&uow) as Arc<dyn UowFactory>,
            Arc::clone(&repo) as Arc<dyn ProductRepository>,
            Arc::clone(&outbox) as Arc<dyn OutboxStore>,
            Some(Arc::clone(&metrics) as Arc<dyn MetricsCollector>),
        );

        Harness {
            service,
            repo,
            outbox,
            uow,
            metrics,
        }
    }

    #[tokio::test]
    async fn test_create_persists_product_and_outbox_event_atomically() {
        // Arrange
        let h = setup();
        let cancel = CancellationToken::new();
        let product = Product::try_new("Widget", 9.99).unwrap();

        // Act
        let created = h
            .service
            .create_product_with_event(&cancel, product, Some("k1".into()))
            .await
            .unwrap();

        // Assert : identité assignée, buffer d'événements vidé
        assert_eq!(created.id(), 42);
        assert!(!created.has_pending_events());

        assert_eq!(h.repo.created.lock().unwrap().len(), 1);

        let saved = h.outbox.saved.lock().unwrap();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].event_type, "PRODUCT_CREATED");
        assert_eq!(saved[0].idempotency_key.as_deref(), Some("k1"));
        assert_eq!(saved[0].event_data["product_id"], 42);

        // Une seule transaction : begin + commit, pas de rollback
        assert_eq!(h.uow.journal.begun.load(Ordering::SeqCst), 1);
        assert_eq!(h.uow.journal.committed.load(Ordering::SeqCst), 1);
        assert_eq!(h.uow.journal.rolled_back.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_create_generates_key_when_caller_omits_one() {
        let h = setup();
        let cancel = CancellationToken::new();
        let product = Product::try_new("Widget", 9.99).unwrap();

        h.service
            .create_product_with_event(&cancel, product, None)
            .await
            .unwrap();

        let saved = h.outbox.saved.lock().unwrap();
        let key = saved[0].idempotency_key.as_deref().unwrap();
        // 128 bits en hexadécimal
        assert_eq!(key.len(), 32);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[tokio::test]
    async fn test_duplicate_create_collapses_to_a_single_write() {
        // Arrange
        let h = setup();
        let cancel = CancellationToken::new();
        let first = Product::try_new("Widget", 9.99).unwrap();

        h.service
            .create_product_with_event(&cancel, first, Some("dup".into()))
            .await
            .unwrap();

        // Act : même clé, même payload
        let replay = Product::try_new("Widget", 9.99).unwrap();
        let replayed = h
            .service
            .create_product_with_event(&cancel, replay, Some("dup".into()))
            .await
            .unwrap();

        // Assert : succès, mais aucune seconde écriture ; l'id du rejeu n'est
        // pas renseigné
        assert_eq!(replayed.id(), 0);
        assert_eq!(h.repo.created.lock().unwrap().len(), 1);
        assert_eq!(h.outbox.saved.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_outbox_failure_rolls_back_and_surfaces_last_error() {
        // Arrange : le repo est ok, mais l'outbox échoue systématiquement
        let h = setup();
        *h.outbox.error_to_return.lock().unwrap() =
            Some(DomainError::Infrastructure("outbox disk full".into()));
        let cancel = CancellationToken::new();
        let product = Product::try_new("Widget", 9.99).unwrap();

        // Act
        let result = h
            .service
            .create_product_with_event(&cancel, product, Some("k2".into()))
            .await;

        // Assert : toutes les tentatives ont échoué, dernière erreur enveloppée
        match result.unwrap_err() {
            DomainError::RetryExhausted {
                max_attempts,
                source,
            } => {
                assert_eq!(max_attempts, 3);
                assert_eq!(
                    *source,
                    DomainError::Infrastructure("outbox disk full".into())
                );
            }
            other => panic!("expected RetryExhausted, got {other:?}"),
        }

        // Chaque tentative a rollback, aucune n'a commit
        assert_eq!(h.uow.journal.rolled_back.load(Ordering::SeqCst), 3);
        assert_eq!(h.uow.journal.committed.load(Ordering::SeqCst), 0);
        assert!(h.outbox.saved.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_transient_begin_failure_is_retried() {
        let h = setup();
        h.uow.fail_begin.store(1, Ordering::SeqCst);
        let cancel = CancellationToken::new();
        let product = Product::try_new("Widget", 9.99).unwrap();

        let created = h
            .service
            .create_product_with_event(&cancel, product, Some("k3".into()))
            .await
            .unwrap();

        assert_eq!(created.id(), 42);
        // La deuxième tentative a abouti
        assert_eq!(h.uow.journal.committed.load(Ordering::SeqCst), 1);
        assert!(h.metrics.transaction_retries.load(Ordering::SeqCst) >= 1);
    }

    #[tokio::test]
    async fn test_commit_failure_surfaces_as_transaction_error() {
        let h = setup();
        h.uow.fail_commit.store(i32::MAX, Ordering::SeqCst);
        let cancel = CancellationToken::new();
        let product = Product::try_new("Widget", 9.99).unwrap();

        let result = h
            .service
            .create_product_with_event(&cancel, product, Some("k4".into()))
            .await;

        let err = result.unwrap_err();
        assert!(err.is_retry_exhausted());
        assert!(matches!(
            err.root_cause(),
            DomainError::Infrastructure(msg) if msg.contains("commit refused")
        ));
    }

    #[tokio::test]
    async fn test_delete_of_absent_product_writes_nothing_to_outbox() {
        // Arrange : la suppression ne touche aucune ligne
        let h = setup();
        *h.repo.delete_error.lock().unwrap() = Some(DomainError::NotFound {
            entity: "Product",
            id: "9999".into(),
        });
        let cancel = CancellationToken::new();

        let mut product = Product::try_new("Ghost", 1.0).unwrap();
        product.record_deleted_event();

        // Act
        let result = h
            .service
            .delete_product_with_event(&cancel, product, Some("k5".into()))
            .await;

        // Assert : NotFound dans la chaîne, aucune ligne outbox
        let err = result.unwrap_err();
        assert!(matches!(
            err.root_cause(),
            DomainError::NotFound { entity: "Product", .. }
        ));
        assert!(h.outbox.saved.lock().unwrap().is_empty());
        assert_eq!(h.uow.journal.committed.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_delete_persists_recorded_delete_event() {
        let h = setup();
        let cancel = CancellationToken::new();

        let mut product = Product::try_new("Widget", 9.99).unwrap();
        product.mark_persisted(7, chrono::Utc::now());
        product.record_deleted_event();

        h.service
            .delete_product_with_event(&cancel, product, Some("k6".into()))
            .await
            .unwrap();

        assert_eq!(h.repo.deleted.lock().unwrap().clone(), vec![7]);

        let saved = h.outbox.saved.lock().unwrap();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].event_type, "PRODUCT_DELETED");
        assert_eq!(saved[0].event_data["product_id"], 7);
    }

    #[tokio::test]
    async fn test_delete_without_recorded_event_is_rejected() {
        let h = setup();
        let cancel = CancellationToken::new();

        // Aucun événement attaché : contrat de la couche use case violé
        let product = Product::try_new("Widget", 9.99).unwrap();

        let result = h
            .service
            .delete_product_with_event(&cancel, product, None)
            .await;

        assert!(result.is_err());
        assert!(h.outbox.saved.lock().unwrap().is_empty());
    }
}
