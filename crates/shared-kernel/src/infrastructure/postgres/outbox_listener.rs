// crates/shared-kernel/src/infrastructure/postgres/outbox_listener.rs

use std::time::Duration;

use sqlx::PgPool;
use sqlx::postgres::PgListener;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::errors::Result;
use crate::infrastructure::postgres::SqlxErrorExt;

/// Canal NOTIFY alimenté par le trigger d'insertion de la table outbox
pub const OUTBOX_CHANNEL: &str = "outbox_events";

/// Écoute LISTEN/NOTIFY et réveille le dispatcher dès qu'une ligne est
/// insérée, sans attendre le prochain tick. Le canal a une capacité de 1 :
/// les notifications en rafale se coalescent en un seul réveil.
pub struct OutboxListener;

impl OutboxListener {
    pub async fn spawn(
        pool: &PgPool,
        cancel: CancellationToken,
    ) -> Result<mpsc::Receiver<()>> {
        let mut listener = PgListener::connect_with(pool)
            .await
            .map_domain_infra("Failed to open LISTEN session")?;
        listener
            .listen(OUTBOX_CHANNEL)
            .await
            .map_domain_infra("Failed to LISTEN on outbox channel")?;

        let (tx, rx) = mpsc::channel(1);

        tokio::spawn(async move {
            tracing::info!(channel = OUTBOX_CHANNEL, "Outbox listener started");

            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    notification = listener.recv() => match notification {
                        Ok(n) => {
                            tracing::debug!(
                                channel = n.channel(),
                                payload = n.payload(),
                                "Outbox notification received"
                            );
                            // try_send : un réveil déjà en attente suffit
                            let _ = tx.try_send(());
                        }
                        Err(e) => {
                            tracing::warn!(error = %e, "Outbox listener connection lost, retrying");
                            tokio::time::sleep(Duration::from_secs(1)).await;
                        }
                    }
                }
            }

            tracing::info!("Outbox listener stopped");
        });

        Ok(rx)
    }
}
