// crates/products/tests/product_service_it.rs

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use products::application::ports::ProductApplicationService;
use products::application::product_service::ProductService;
use products::domain::entities::Product;
use products::infrastructure::postgres::repositories::PostgresProductRepository;
use shared_kernel::infrastructure::postgres::utils::PostgresTestContext;
use shared_kernel::infrastructure::postgres::{PostgresOutboxStore, PostgresUowFactory};

const MIGRATIONS: &[&str] = &[
    "../shared-kernel/migrations/postgres",
    "./migrations/postgres",
];

fn service(ctx: &PostgresTestContext) -> ProductService {
    ProductService::new(
        Arc::new(PostgresUowFactory::new(ctx.pool())),
        Arc::new(PostgresProductRepository::new(ctx.pool())),
        Arc::new(PostgresOutboxStore::new(ctx.pool())),
        None,
    )
}

async fn count_products(ctx: &PostgresTestContext, name: &str) -> i64 {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM products WHERE name = $1")
        .bind(name)
        .fetch_one(&ctx.pool())
        .await
        .unwrap();
    count
}

async fn count_outbox(ctx: &PostgresTestContext, key: &str) -> i64 {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM outbox WHERE idempotency_key = $1")
        .bind(key)
        .fetch_one(&ctx.pool())
        .await
        .unwrap();
    count
}

#[tokio::test]
async fn test_create_commits_product_and_pending_event_together() {
    let ctx = PostgresTestContext::start(MIGRATIONS).await;
    let service = service(&ctx);
    let cancel = CancellationToken::new();

    let product = Product::try_new("Widget", 9.99).unwrap();
    let created = service
        .create_product_with_event(&cancel, product, Some("svc-1".into()))
        .await
        .unwrap();

    assert!(created.id() > 0);
    assert_eq!(count_products(&ctx, "Widget").await, 1);
    assert_eq!(count_outbox(&ctx, "svc-1").await, 1);

    let (event_type, status): (String, String) =
        sqlx::query_as("SELECT event_type, status FROM outbox WHERE idempotency_key = 'svc-1'")
            .fetch_one(&ctx.pool())
            .await
            .unwrap();
    assert_eq!(event_type, "PRODUCT_CREATED");
    assert_eq!(status, "pending");
}

#[tokio::test]
async fn test_sequential_duplicate_create_is_a_noop_success() {
    let ctx = PostgresTestContext::start(MIGRATIONS).await;
    let service = service(&ctx);
    let cancel = CancellationToken::new();

    let first = Product::try_new("Widget", 9.99).unwrap();
    service
        .create_product_with_event(&cancel, first, Some("svc-dup".into()))
        .await
        .unwrap();

    let replay = Product::try_new("Widget", 9.99).unwrap();
    let replayed = service
        .create_product_with_event(&cancel, replay, Some("svc-dup".into()))
        .await
        .unwrap();

    // Succès sans écriture ; l'id du rejeu n'est pas renseigné
    assert_eq!(replayed.id(), 0);
    assert_eq!(count_products(&ctx, "Widget").await, 1);
    assert_eq!(count_outbox(&ctx, "svc-dup").await, 1);
}

#[tokio::test]
async fn test_concurrent_duplicate_creates_collapse_to_one_product() {
    let ctx = PostgresTestContext::start(MIGRATIONS).await;
    let service = service(&ctx);
    let cancel = CancellationToken::new();

    // Deux soumissions simultanées de la même requête : le verrou pris sur la
    // clé dans la transaction force la seconde à attendre le commit de la
    // première, qui devient alors un rejeu sans écriture
    let first = Product::try_new("Raced", 4.2).unwrap();
    let second = Product::try_new("Raced", 4.2).unwrap();

    let (r1, r2) = tokio::join!(
        service.create_product_with_event(&cancel, first, Some("svc-race".into())),
        service.create_product_with_event(&cancel, second, Some("svc-race".into())),
    );

    // Les deux appels réussissent, une seule écriture a eu lieu
    r1.unwrap();
    r2.unwrap();
    assert_eq!(count_products(&ctx, "Raced").await, 1);
    assert_eq!(count_outbox(&ctx, "svc-race").await, 1);
}

#[tokio::test]
async fn test_delete_commits_removal_and_deleted_event_together() {
    let ctx = PostgresTestContext::start(MIGRATIONS).await;
    let service = service(&ctx);
    let cancel = CancellationToken::new();

    let product = Product::try_new("Doomed", 2.0).unwrap();
    let mut created = service
        .create_product_with_event(&cancel, product, Some("svc-del-create".into()))
        .await
        .unwrap();

    created.record_deleted_event();
    service
        .delete_product_with_event(&cancel, created, Some("svc-del".into()))
        .await
        .unwrap();

    assert_eq!(count_products(&ctx, "Doomed").await, 0);
    assert_eq!(count_outbox(&ctx, "svc-del").await, 1);

    let (event_type,): (String,) =
        sqlx::query_as("SELECT event_type FROM outbox WHERE idempotency_key = 'svc-del'")
            .fetch_one(&ctx.pool())
            .await
            .unwrap();
    assert_eq!(event_type, "PRODUCT_DELETED");
}
