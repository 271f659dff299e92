// crates/shared-kernel/src/domain/transaction/unit_of_work.rs

use async_trait::async_trait;
use crate::domain::transaction::Transaction;
use crate::errors::Result;

/// Unité de travail : possède une transaction unique du store et l'expose aux
/// repositories le temps de sa vie.
///
/// Contrat :
/// - `begin` alors qu'une transaction est active est un no-op ;
/// - `commit` et `rollback` consomment la transaction ; tout appel suivant
///   (commit après rollback, double commit) est un no-op ;
/// - après commit ou rollback, `transaction()` rend `None` et les statements
///   repartent en auto-commit. Une nouvelle opération passe par une instance
///   fraîche produite par la factory.
#[async_trait]
pub trait UnitOfWork: Send {
    async fn begin(&mut self) -> Result<()>;
    async fn commit(&mut self) -> Result<()>;
    async fn rollback(&mut self) -> Result<()>;

    fn in_transaction(&self) -> bool;

    /// Handle de la transaction active, à threader dans les appels de
    /// repositories pour qu'ils participent à la même transaction.
    fn transaction(&mut self) -> Option<&mut dyn Transaction>;
}

pub trait UowFactory: Send + Sync {
    fn create_unit_of_work(&self) -> Box<dyn UnitOfWork>;
}
