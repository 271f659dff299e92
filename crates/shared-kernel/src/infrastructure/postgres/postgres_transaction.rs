// crates/shared-kernel/src/infrastructure/postgres/postgres_transaction.rs

use sqlx::{Postgres, Transaction as SqlxTransaction};
use crate::domain::transaction::Transaction;

pub struct PostgresTransaction {
    inner: SqlxTransaction<'static, Postgres>,
}

impl PostgresTransaction {
    pub fn new(tx: SqlxTransaction<'static, Postgres>) -> Self {
        Self { inner: tx }
    }

    pub fn get_mut(&mut self) -> &mut SqlxTransaction<'static, Postgres> {
        &mut self.inner
    }

    pub fn into_inner(self) -> SqlxTransaction<'static, Postgres> {
        self.inner
    }
}

impl Transaction for PostgresTransaction {
    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
}
