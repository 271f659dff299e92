// crates/products/src/domain/repositories/product_repository.rs

use async_trait::async_trait;

use crate::domain::entities::Product;
use shared_kernel::domain::transaction::Transaction;
use shared_kernel::errors::Result;

#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Insère la ligne produit et assigne id + created_at rendus par le store.
    /// Participe à la transaction du unit of work quand elle est fournie.
    async fn create(&self, product: &mut Product, tx: Option<&mut dyn Transaction>) -> Result<()>;

    /// Charge par id. Absent : NotFound. Ligne qui ne passe plus la
    /// validation du domaine : DataCorruption.
    async fn get_by_id(&self, id: i32) -> Result<Product>;

    /// Page de produits (created_at décroissant) et total global
    async fn list(&self, page: u32, limit: u32) -> Result<(Vec<Product>, i64)>;

    /// Supprime par id. Zéro ligne affectée : NotFound.
    async fn delete(&self, id: i32, tx: Option<&mut dyn Transaction>) -> Result<()>;
}
