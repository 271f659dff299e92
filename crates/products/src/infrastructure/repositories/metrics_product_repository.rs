// crates/products/src/infrastructure/repositories/metrics_product_repository.rs

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;

use crate::domain::entities::Product;
use crate::domain::repositories::ProductRepository;
use shared_kernel::application::ports::MetricsCollector;
use shared_kernel::domain::transaction::Transaction;
use shared_kernel::errors::Result;

/// Décorateur d'observation : chaque couche transmet le contrat inchangé,
/// seule la durée des requêtes est enregistrée au passage.
pub struct MetricsProductRepository {
    repo: Arc<dyn ProductRepository>,
    metrics: Arc<dyn MetricsCollector>,
}

impl MetricsProductRepository {
    pub fn new(repo: Arc<dyn ProductRepository>, metrics: Arc<dyn MetricsCollector>) -> Self {
        Self { repo, metrics }
    }
}

#[async_trait]
impl ProductRepository for MetricsProductRepository {
    async fn create(&self, product: &mut Product, tx: Option<&mut dyn Transaction>) -> Result<()> {
        let start = Instant::now();
        let result = self.repo.create(product, tx).await;
        self.metrics.record_database_query_duration(start.elapsed());
        result
    }

    async fn get_by_id(&self, id: i32) -> Result<Product> {
        let start = Instant::now();
        let result = self.repo.get_by_id(id).await;
        self.metrics.record_database_query_duration(start.elapsed());
        result
    }

    async fn list(&self, page: u32, limit: u32) -> Result<(Vec<Product>, i64)> {
        let start = Instant::now();
        let result = self.repo.list(page, limit).await;
        self.metrics.record_database_query_duration(start.elapsed());
        result
    }

    async fn delete(&self, id: i32, tx: Option<&mut dyn Transaction>) -> Result<()> {
        let start = Instant::now();
        let result = self.repo.delete(id, tx).await;
        self.metrics.record_database_query_duration(start.elapsed());
        result
    }
}
