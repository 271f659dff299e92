// crates/shared-kernel/src/infrastructure/transaction.rs

use std::future::Future;
use std::pin::Pin;

use sqlx::{PgConnection, PgPool};

use crate::domain::transaction::Transaction;
use crate::errors::{DomainError, Result};
use crate::infrastructure::postgres::PostgresTransaction;

/// Extension pour retrouver la transaction sqlx concrète derrière le trait object
pub trait TransactionExt {
    fn downcast_mut_sqlx(&mut self) -> Result<&mut sqlx::Transaction<'static, sqlx::Postgres>>;
}

impl<'t> TransactionExt for dyn Transaction + 't {
    fn downcast_mut_sqlx(&mut self) -> Result<&mut sqlx::Transaction<'static, sqlx::Postgres>> {
        self.as_any_mut()
            .downcast_mut::<PostgresTransaction>()
            .map(|tx| tx.get_mut())
            .ok_or_else(|| {
                DomainError::Internal("Transaction type mismatch: expected sqlx transaction".into())
            })
    }
}

impl<'r, 't> TransactionExt for &'r mut (dyn Transaction + 't) {
    fn downcast_mut_sqlx(&mut self) -> Result<&mut sqlx::Transaction<'static, sqlx::Postgres>> {
        (**self).downcast_mut_sqlx()
    }
}

impl dyn Transaction {
    /// Exécute `f` sur la transaction fournie quand il y en a une, sinon sur
    /// une connexion de la pool (auto-commit). C'est ce qui permet aux
    /// repositories de participer au unit of work sans en dépendre.
    pub async fn execute_on<F, T>(
        pool: &PgPool,
        tx: Option<&mut dyn Transaction>,
        f: F,
    ) -> Result<T>
    where
        F: for<'a> FnOnce(
                &'a mut PgConnection,
            ) -> Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>
            + Send,
    {
        match tx {
            Some(t) => {
                let sqlx_tx = t.downcast_mut_sqlx()?;
                f(&mut **sqlx_tx).await
            }
            None => {
                let mut conn = pool
                    .acquire()
                    .await
                    .map_err(|e| DomainError::Infrastructure(e.to_string()))?;
                f(&mut *conn).await
            }
        }
    }
}
