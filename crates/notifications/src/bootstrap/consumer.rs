// crates/notifications/src/bootstrap/consumer.rs

use tokio_util::sync::CancellationToken;

use crate::messaging::{RabbitMqConsumer, RabbitMqConsumerConfig};
use shared_kernel::errors::AppResult;

/// Monte et fait tourner le consumer de notifications jusqu'au signal d'arrêt.
pub async fn run_consumer() -> AppResult<()> {
    tracing_subscriber::fmt::init();
    tracing::info!("📡 Starting notifications consumer");

    let config = RabbitMqConsumerConfig::from_env();

    let root = CancellationToken::new();
    let signal_token = root.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("🛑 Shutdown signal received, stopping consumer...");
                signal_token.cancel();
            }
            Err(err) => {
                tracing::error!(error = %err, "❌ Unable to listen for shutdown signal");
            }
        }
    });

    let consumer = RabbitMqConsumer::connect(&config).await?;
    consumer.run(root).await?;
    consumer.close().await?;

    tracing::info!("👋 Notifications consumer exited clean");
    Ok(())
}
