// crates/products/src/application/list_products/list_products_use_case.rs

use std::sync::Arc;

use crate::application::list_products::ListProductsQuery;
use crate::domain::entities::Product;
use crate::domain::repositories::ProductRepository;
use shared_kernel::errors::Result;

#[derive(Debug, Clone)]
pub struct ProductPage {
    pub products: Vec<Product>,
    pub total: i64,
    pub page: u32,
    pub limit: u32,
}

pub struct ListProductsUseCase {
    repo: Arc<dyn ProductRepository>,
}

impl ListProductsUseCase {
    pub const DEFAULT_LIMIT: u32 = 10;
    pub const MAX_LIMIT: u32 = 100;

    pub fn new(repo: Arc<dyn ProductRepository>) -> Self {
        Self { repo }
    }

    pub async fn execute(&self, query: ListProductsQuery) -> Result<ProductPage> {
        let page = query.page.max(1);
        let limit = match query.limit {
            0 => Self::DEFAULT_LIMIT,
            l => l.min(Self::MAX_LIMIT),
        };

        let (products, total) = self.repo.list(page, limit).await.map_err(|e| {
            tracing::error!(
                error = %e,
                page,
                limit,
                "Failed to list products from repository"
            );
            e
        })?;

        tracing::debug!(
            count = products.len(),
            total,
            page,
            "Products listed successfully"
        );

        Ok(ProductPage {
            products,
            total,
            page,
            limit,
        })
    }
}
