// crates/products/tests/product_repository_it.rs

use serde_json::json;

use products::domain::entities::Product;
use products::domain::repositories::ProductRepository;
use products::infrastructure::postgres::repositories::PostgresProductRepository;
use shared_kernel::domain::outbox::{OutboxEvent, OutboxStore};
use shared_kernel::domain::transaction::UnitOfWork;
use shared_kernel::errors::DomainError;
use shared_kernel::infrastructure::postgres::utils::PostgresTestContext;
use shared_kernel::infrastructure::postgres::{PostgresOutboxStore, PostgresUnitOfWork};

const MIGRATIONS: &[&str] = &[
    "../shared-kernel/migrations/postgres",
    "./migrations/postgres",
];

#[tokio::test]
async fn test_create_assigns_identity_and_get_by_id_round_trips() {
    let ctx = PostgresTestContext::start(MIGRATIONS).await;
    let repo = PostgresProductRepository::new(ctx.pool());

    let mut product = Product::try_new("Widget", 9.99).unwrap();
    repo.create(&mut product, None).await.unwrap();
    assert!(product.id() > 0);

    let loaded = repo.get_by_id(product.id()).await.unwrap();
    assert_eq!(loaded.id(), product.id());
    assert_eq!(loaded.name().as_str(), "Widget");
    assert_eq!(loaded.price().value(), 9.99);
}

#[tokio::test]
async fn test_unit_of_work_commit_persists_product_and_outbox_together() {
    let ctx = PostgresTestContext::start(MIGRATIONS).await;
    let repo = PostgresProductRepository::new(ctx.pool());
    let outbox = PostgresOutboxStore::new(ctx.pool());

    let mut uow = PostgresUnitOfWork::new(ctx.pool());
    uow.begin().await.unwrap();

    let mut product = Product::try_new("Atomic", 5.0).unwrap();
    repo.create(&mut product, uow.transaction()).await.unwrap();

    let mut events = vec![OutboxEvent::pending(
        "PRODUCT_CREATED",
        json!({"type": "PRODUCT_CREATED", "product_id": product.id(), "timestamp": "2024-05-01T10:00:00Z"}),
        Some("atomic-commit".to_string()),
    )];
    outbox
        .save_events_batch(&mut events, uow.transaction())
        .await
        .unwrap();

    uow.commit().await.unwrap();

    // Les deux lignes existent exactement une fois
    let (products,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM products WHERE name = 'Atomic'")
        .fetch_one(&ctx.pool())
        .await
        .unwrap();
    let (outbox_rows,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM outbox WHERE idempotency_key = 'atomic-commit'")
            .fetch_one(&ctx.pool())
            .await
            .unwrap();
    assert_eq!(products, 1);
    assert_eq!(outbox_rows, 1);
}

#[tokio::test]
async fn test_unit_of_work_rollback_leaves_no_trace() {
    let ctx = PostgresTestContext::start(MIGRATIONS).await;
    let repo = PostgresProductRepository::new(ctx.pool());
    let outbox = PostgresOutboxStore::new(ctx.pool());

    let mut uow = PostgresUnitOfWork::new(ctx.pool());
    uow.begin().await.unwrap();

    let mut product = Product::try_new("Ghost", 5.0).unwrap();
    repo.create(&mut product, uow.transaction()).await.unwrap();

    let mut event = OutboxEvent::pending(
        "PRODUCT_CREATED",
        json!({"type": "PRODUCT_CREATED", "product_id": product.id(), "timestamp": "2024-05-01T10:00:00Z"}),
        Some("atomic-rollback".to_string()),
    );
    outbox
        .save_event(&mut event, uow.transaction())
        .await
        .unwrap();

    uow.rollback().await.unwrap();

    // Rien ne doit exister
    let (products,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM products WHERE name = 'Ghost'")
        .fetch_one(&ctx.pool())
        .await
        .unwrap();
    let (outbox_rows,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM outbox WHERE idempotency_key = 'atomic-rollback'")
            .fetch_one(&ctx.pool())
            .await
            .unwrap();
    assert_eq!(products, 0);
    assert_eq!(outbox_rows, 0);

    // Commit après rollback : no-op, pas d'erreur
    uow.commit().await.unwrap();
    assert!(!uow.in_transaction());
}

#[tokio::test]
async fn test_delete_of_absent_product_is_not_found() {
    let ctx = PostgresTestContext::start(MIGRATIONS).await;
    let repo = PostgresProductRepository::new(ctx.pool());

    let err = repo.delete(9999, None).await.unwrap_err();
    assert!(matches!(
        err,
        DomainError::NotFound {
            entity: "Product",
            ..
        }
    ));
}

#[tokio::test]
async fn test_delete_removes_the_row() {
    let ctx = PostgresTestContext::start(MIGRATIONS).await;
    let repo = PostgresProductRepository::new(ctx.pool());

    let mut product = Product::try_new("Doomed", 2.0).unwrap();
    repo.create(&mut product, None).await.unwrap();

    repo.delete(product.id(), None).await.unwrap();

    let err = repo.get_by_id(product.id()).await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_list_pages_with_windowed_total() {
    let ctx = PostgresTestContext::start(MIGRATIONS).await;
    let repo = PostgresProductRepository::new(ctx.pool());

    for i in 0..5 {
        let mut product = Product::try_new(format!("Item {i}"), 1.0 + i as f64).unwrap();
        repo.create(&mut product, None).await.unwrap();
    }

    let (page, total) = repo.list(1, 2).await.unwrap();
    assert_eq!(page.len(), 2);
    assert_eq!(total, 5);

    let (last_page, total) = repo.list(3, 2).await.unwrap();
    assert_eq!(last_page.len(), 1);
    assert_eq!(total, 5);
}

#[tokio::test]
async fn test_corrupted_row_fails_loading_with_data_corruption() {
    let ctx = PostgresTestContext::start(MIGRATIONS).await;
    let repo = PostgresProductRepository::new(ctx.pool());

    // Ligne insérée en contournant les factories du domaine
    let (id,): (i32,) = sqlx::query_as(
        "INSERT INTO products (name, price, created_at) VALUES ('Broken', -5.0, NOW()) RETURNING id",
    )
    .fetch_one(&ctx.pool())
    .await
    .unwrap();

    let err = repo.get_by_id(id).await.unwrap_err();
    assert!(matches!(err, DomainError::DataCorruption { .. }));
}
