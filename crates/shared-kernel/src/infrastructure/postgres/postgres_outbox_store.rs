// crates/shared-kernel/src/infrastructure/postgres/postgres_outbox_store.rs

use async_trait::async_trait;
use sqlx::postgres::PgQueryResult;
use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder, Row};

use crate::domain::outbox::{OutboxEvent, OutboxStatus, OutboxStore};
use crate::domain::transaction::Transaction;
use crate::errors::{DomainError, Result};
use crate::infrastructure::postgres::{OutboxRow, SqlxErrorExt};

pub const DEFAULT_MAX_BATCH_SIZE: usize = 100;

/// Réclame les lignes `pending`, plus les lignes `failed` dont le compteur de
/// tentatives n'a pas dépassé le plafond : un échec transitoire est repris au
/// tick suivant au lieu de rester échoué jusqu'à intervention.
const QUERY_GET_PENDING_EVENTS: &str = r#"
    WITH claimed AS (
        SELECT id FROM outbox
        WHERE status = 'pending'
           OR (status = 'failed' AND retry_count <= $2)
        ORDER BY created_at ASC
        LIMIT $1
        FOR UPDATE SKIP LOCKED
    )
    SELECT
        id, event_type, event_data, idempotency_key,
        status, retry_count, created_at, published_at, dlq_reason
    FROM outbox
    WHERE id IN (SELECT id FROM claimed)
    ORDER BY created_at ASC
"#;

const QUERY_SAVE_EVENT: &str = r#"
    INSERT INTO outbox (event_type, event_data, idempotency_key, status, created_at)
    VALUES ($1, $2, $3, $4, NOW())
    ON CONFLICT (idempotency_key) DO NOTHING
    RETURNING id, created_at
"#;

const QUERY_MARK_AS_PUBLISHED: &str = r#"
    UPDATE outbox
    SET status = $1, published_at = NOW()
    WHERE id = $2
"#;

const QUERY_MARK_AS_FAILED: &str = r#"
    UPDATE outbox
    SET status = $1, retry_count = $2
    WHERE id = $3
"#;

const QUERY_MOVE_TO_DLQ: &str = r#"
    UPDATE outbox
    SET status = $1, retry_count = retry_count + 1, dlq_reason = $3
    WHERE id = $2
"#;

const QUERY_CHECK_IDEMPOTENCY_KEY: &str = r#"
    SELECT EXISTS(SELECT 1 FROM outbox WHERE idempotency_key = $1)
"#;

/// Verrou consultatif lié à la transaction : relâché au commit/rollback.
/// Deux écrivains partageant la même clé ne passent donc jamais ensemble la
/// séquence check-puis-insert.
const QUERY_LOCK_IDEMPOTENCY_KEY: &str = r#"
    SELECT pg_advisory_xact_lock(hashtext($1))
"#;

pub struct PostgresOutboxStore {
    pool: PgPool,
    max_batch_size: usize,
    max_retries: i32,
}

/// Paramètres possédés d'une ligne du statement multi-values
struct BatchRow {
    event_type: String,
    event_data: serde_json::Value,
    idempotency_key: Option<String>,
    status: &'static str,
}

/// Ligne effectivement insérée, rendue par le RETURNING du batch
struct InsertedRow {
    id: i64,
    created_at: chrono::DateTime<chrono::Utc>,
    idempotency_key: Option<String>,
}

impl PostgresOutboxStore {
    pub fn new(pool: PgPool) -> Self {
        Self::with_config(pool, DEFAULT_MAX_BATCH_SIZE, 3)
    }

    pub fn with_config(pool: PgPool, max_batch_size: usize, max_retries: i32) -> Self {
        Self {
            pool,
            max_batch_size: max_batch_size.max(1),
            max_retries,
        }
    }

    async fn save_chunk(chunk: Vec<BatchRow>, conn: &mut PgConnection) -> Result<Vec<InsertedRow>> {
        let mut builder = QueryBuilder::<Postgres>::new(
            "INSERT INTO outbox (event_type, event_data, idempotency_key, status, created_at) ",
        );

        builder.push_values(chunk, |mut row, event| {
            row.push_bind(event.event_type)
                .push_bind(event.event_data)
                .push_bind(event.idempotency_key)
                .push_bind(event.status)
                .push("NOW()");
        });
        // La clé revient avec chaque ligne insérée : c'est elle qui permet de
        // réassocier les lignes à leurs événements quand des conflits ont
        // fait des trous dans le RETURNING
        builder.push(
            " ON CONFLICT (idempotency_key) DO NOTHING RETURNING id, created_at, idempotency_key",
        );

        let rows = builder
            .build()
            .fetch_all(&mut *conn)
            .await
            .map_domain_infra("Failed to execute outbox batch insert")?;

        rows.iter()
            .map(|row| {
                let id = row
                    .try_get("id")
                    .map_domain_infra("Failed to scan outbox batch insert result")?;
                let created_at = row
                    .try_get("created_at")
                    .map_domain_infra("Failed to scan outbox batch insert result")?;
                let idempotency_key = row
                    .try_get("idempotency_key")
                    .map_domain_infra("Failed to scan outbox batch insert result")?;
                Ok(InsertedRow {
                    id,
                    created_at,
                    idempotency_key,
                })
            })
            .collect()
    }

    fn ensure_single_row(result: PgQueryResult, event_id: i64) -> Result<()> {
        if result.rows_affected() == 0 {
            return Err(DomainError::NotFound {
                entity: "OutboxEvent",
                id: event_id.to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl OutboxStore for PostgresOutboxStore {
    async fn save_event(
        &self,
        event: &mut OutboxEvent,
        tx: Option<&mut dyn Transaction>,
    ) -> Result<()> {
        let pool = self.pool.clone();
        let event_type = event.event_type.clone();
        let event_data = event.event_data.clone();
        let idempotency_key = event.idempotency_key.clone();
        let status = event.status.as_str();
        let had_key = event.idempotency_key.is_some();

        let inserted = <dyn Transaction>::execute_on(&pool, tx, move |conn| {
            Box::pin(async move {
                sqlx::query(QUERY_SAVE_EVENT)
                    .bind(event_type)
                    .bind(event_data)
                    .bind(idempotency_key)
                    .bind(status)
                    .fetch_optional(&mut *conn)
                    .await
                    .map_domain_infra("Failed to save outbox event")
            })
        })
        .await?;

        match inserted {
            Some(row) => {
                event.id = row
                    .try_get("id")
                    .map_domain_infra("Failed to scan outbox insert result")?;
                event.created_at = row
                    .try_get("created_at")
                    .map_domain_infra("Failed to scan outbox insert result")?;
                Ok(())
            }
            // Conflit d'idempotence avalé : succès sans id
            None if had_key => Ok(()),
            None => Err(DomainError::Internal(
                "outbox insert returned no row without idempotency conflict".into(),
            )),
        }
    }

    async fn save_events_batch(
        &self,
        events: &mut [OutboxEvent],
        mut tx: Option<&mut dyn Transaction>,
    ) -> Result<()> {
        if events.is_empty() {
            return Ok(());
        }

        let pool = self.pool.clone();
        let total = events.len();
        let mut start = 0usize;

        while start < total {
            let end = (start + self.max_batch_size).min(total);

            // Données possédées pour la clôture transactionnelle
            let chunk: Vec<BatchRow> = events[start..end]
                .iter()
                .map(|event| BatchRow {
                    event_type: event.event_type.clone(),
                    event_data: event.event_data.clone(),
                    idempotency_key: event.idempotency_key.clone(),
                    status: event.status.as_str(),
                })
                .collect();

            let returned = <dyn Transaction>::execute_on(&pool, tx.as_deref_mut(), move |conn| {
                Box::pin(async move { Self::save_chunk(chunk, conn).await })
            })
            .await?;

            // Réassociation par clé : les lignes en conflit d'idempotence ne
            // reviennent pas, donc un zip positionnel décalerait les ids dès
            // le premier trou. Les événements rejoués gardent leur id à 0.
            // Les lignes sans clé ne conflictent jamais et reviennent dans
            // l'ordre d'insertion : on les réaffecte en séquence.
            let chunk_events = &mut events[start..end];
            for inserted in returned {
                let slot = chunk_events.iter_mut().find(|event| {
                    event.id == 0
                        && match (&inserted.idempotency_key, &event.idempotency_key) {
                            (Some(returned_key), Some(event_key)) => returned_key == event_key,
                            (None, None) => true,
                            _ => false,
                        }
                });

                if let Some(event) = slot {
                    event.id = inserted.id;
                    event.created_at = inserted.created_at;
                }
            }

            start = end;
        }

        Ok(())
    }

    async fn get_pending_events(&self, limit: u32) -> Result<Vec<OutboxEvent>> {
        let rows = sqlx::query_as::<_, OutboxRow>(QUERY_GET_PENDING_EVENTS)
            .bind(limit as i64)
            .bind(self.max_retries)
            .fetch_all(&self.pool)
            .await
            .map_domain_infra("Failed to get pending outbox events")?;

        rows.into_iter().map(OutboxEvent::try_from).collect()
    }

    async fn mark_as_published(&self, event_id: i64) -> Result<()> {
        let result = sqlx::query(QUERY_MARK_AS_PUBLISHED)
            .bind(OutboxStatus::Published.as_str())
            .bind(event_id)
            .execute(&self.pool)
            .await
            .map_domain_infra("Failed to mark outbox event as published")?;

        Self::ensure_single_row(result, event_id)
    }

    async fn mark_as_failed(&self, event_id: i64, retry_count: i32) -> Result<()> {
        let result = sqlx::query(QUERY_MARK_AS_FAILED)
            .bind(OutboxStatus::Failed.as_str())
            .bind(retry_count)
            .bind(event_id)
            .execute(&self.pool)
            .await
            .map_domain_infra("Failed to mark outbox event as failed")?;

        Self::ensure_single_row(result, event_id)
    }

    async fn move_to_dlq(&self, event_id: i64, reason: &str) -> Result<()> {
        let result = sqlx::query(QUERY_MOVE_TO_DLQ)
            .bind(OutboxStatus::Dlq.as_str())
            .bind(event_id)
            .bind(reason)
            .execute(&self.pool)
            .await
            .map_domain_infra("Failed to move outbox event to DLQ")?;

        Self::ensure_single_row(result, event_id)
    }

    async fn check_idempotency_key(&self, idempotency_key: &str) -> Result<bool> {
        if idempotency_key.is_empty() {
            return Ok(false);
        }

        let (exists,): (bool,) = sqlx::query_as(QUERY_CHECK_IDEMPOTENCY_KEY)
            .bind(idempotency_key)
            .fetch_one(&self.pool)
            .await
            .map_domain_infra("Failed to check idempotency key")?;

        Ok(exists)
    }

    async fn claim_idempotency_key(
        &self,
        idempotency_key: &str,
        mut tx: Option<&mut dyn Transaction>,
    ) -> Result<bool> {
        if idempotency_key.is_empty() {
            return Ok(false);
        }

        let pool = self.pool.clone();
        let key = idempotency_key.to_string();

        <dyn Transaction>::execute_on(&pool, tx.as_deref_mut(), move |conn| {
            Box::pin(async move {
                // Prise du verrou d'abord : un rejeu concurrent attend ici le
                // commit du premier écrivain, puis sa lecture voit la ligne
                sqlx::query(QUERY_LOCK_IDEMPOTENCY_KEY)
                    .bind(&key)
                    .execute(&mut *conn)
                    .await
                    .map_domain_infra("Failed to lock idempotency key")?;

                let (exists,): (bool,) = sqlx::query_as(QUERY_CHECK_IDEMPOTENCY_KEY)
                    .bind(&key)
                    .fetch_one(&mut *conn)
                    .await
                    .map_domain_infra("Failed to check idempotency key")?;

                Ok(exists)
            })
        })
        .await
    }
}
