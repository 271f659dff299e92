// crates/products/src/infrastructure/bootstrap/dispatcher.rs

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::application::ports::EventPublisher;
use crate::infrastructure::messaging::{ProductOutboxBridge, RabbitMqConfig, RabbitMqPublisher};
use shared_kernel::application::workers::{OutboxConfig, OutboxDispatcher};
use shared_kernel::errors::AppResult;
use shared_kernel::infrastructure::postgres::factories::{PostgresConfig, create_postgres_pool};
use shared_kernel::infrastructure::postgres::{OutboxListener, PostgresOutboxStore};

/// Monte et fait tourner le dispatcher outbox jusqu'au signal d'arrêt.
pub async fn run_outbox_dispatcher() -> AppResult<()> {
    // 1. Initialisation des logs
    tracing_subscriber::fmt::init();
    tracing::info!("📡 Starting outbox dispatcher");

    // 2. Configuration via environnement
    let outbox_config = OutboxConfig::from_env();
    let postgres_config = PostgresConfig::from_env()?;
    let rabbitmq_config = RabbitMqConfig::from_env();

    // 3. Signal d'arrêt racine (Ctrl+C / SIGTERM)
    let root = CancellationToken::new();
    let signal_token = root.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("🛑 Shutdown signal received, stopping dispatcher...");
                signal_token.cancel();
            }
            Err(err) => {
                tracing::error!(error = %err, "❌ Unable to listen for shutdown signal");
            }
        }
    });

    // 4. Montage de l'infrastructure
    let pool = create_postgres_pool(&postgres_config).await?;
    let publisher = Arc::new(RabbitMqPublisher::connect(&root, &rabbitmq_config).await?);
    let store = PostgresOutboxStore::with_config(
        pool.clone(),
        outbox_config.max_batch_size,
        outbox_config.max_retries,
    );
    let bridge = ProductOutboxBridge::new(Arc::clone(&publisher) as Arc<dyn EventPublisher>);

    let mut dispatcher = OutboxDispatcher::new(store, bridge, outbox_config, None);

    // 5. Réveil LISTEN/NOTIFY en plus du tick (facultatif : sans lui, le
    //    polling périodique suffit)
    match OutboxListener::spawn(&pool, root.clone()).await {
        Ok(wake) => {
            dispatcher = dispatcher.with_wake_signal(wake);
        }
        Err(e) => {
            tracing::warn!(error = %e, "Outbox listener unavailable, polling only");
        }
    }

    // 6. Exécution jusqu'au signal d'arrêt
    dispatcher.start(root.clone());
    root.cancelled().await;
    dispatcher.stop().await;

    // 7. Fermeture propre
    publisher.close().await?;
    pool.close().await;

    tracing::info!("👋 Outbox dispatcher exited clean");
    Ok(())
}
