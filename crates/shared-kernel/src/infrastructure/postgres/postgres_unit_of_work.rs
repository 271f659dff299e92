// crates/shared-kernel/src/infrastructure/postgres/postgres_unit_of_work.rs

use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::transaction::{Transaction, UnitOfWork, UowFactory};
use crate::errors::Result;
use crate::infrastructure::postgres::{PostgresTransaction, SqlxErrorExt};

/// Unit of work Postgres : une transaction sqlx au plus, confinée à une
/// connexion de la pool pour toute sa durée de vie.
pub struct PostgresUnitOfWork {
    pool: PgPool,
    tx: Option<PostgresTransaction>,
}

impl PostgresUnitOfWork {
    pub fn new(pool: PgPool) -> Self {
        Self { pool, tx: None }
    }
}

#[async_trait]
impl UnitOfWork for PostgresUnitOfWork {
    async fn begin(&mut self) -> Result<()> {
        if self.tx.is_some() {
            return Ok(());
        }

        let tx = self
            .pool
            .begin()
            .await
            .map_domain_infra("Failed to begin transaction")?;
        self.tx = Some(PostgresTransaction::new(tx));

        Ok(())
    }

    async fn commit(&mut self) -> Result<()> {
        match self.tx.take() {
            Some(tx) => tx
                .into_inner()
                .commit()
                .await
                .map_domain_infra("Failed to commit transaction"),
            // Déjà terminée (ou jamais ouverte) : no-op
            None => Ok(()),
        }
    }

    async fn rollback(&mut self) -> Result<()> {
        match self.tx.take() {
            Some(tx) => tx
                .into_inner()
                .rollback()
                .await
                .map_domain_infra("Failed to rollback transaction"),
            None => Ok(()),
        }
    }

    fn in_transaction(&self) -> bool {
        self.tx.is_some()
    }

    fn transaction(&mut self) -> Option<&mut dyn Transaction> {
        self.tx.as_mut().map(|tx| tx as &mut dyn Transaction)
    }
}

pub struct PostgresUowFactory {
    pool: PgPool,
}

impl PostgresUowFactory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl UowFactory for PostgresUowFactory {
    fn create_unit_of_work(&self) -> Box<dyn UnitOfWork> {
        Box::new(PostgresUnitOfWork::new(self.pool.clone()))
    }
}
