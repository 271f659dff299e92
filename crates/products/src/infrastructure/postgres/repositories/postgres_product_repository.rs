// crates/products/src/infrastructure/postgres/repositories/postgres_product_repository.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::entities::Product;
use crate::domain::repositories::ProductRepository;
use crate::infrastructure::postgres::rows::{PostgresProductListRow, PostgresProductRow};
use shared_kernel::domain::transaction::Transaction;
use shared_kernel::errors::{DomainError, Result};
use shared_kernel::infrastructure::postgres::SqlxErrorExt;

const QUERY_CREATE_PRODUCT: &str = r#"
    INSERT INTO products (name, price, created_at)
    VALUES ($1, $2, NOW())
    RETURNING id, created_at
"#;

const QUERY_GET_PRODUCT_BY_ID: &str = r#"
    SELECT id, name, price, created_at
    FROM products
    WHERE id = $1
"#;

const QUERY_LIST_PRODUCTS: &str = r#"
    SELECT
        id,
        name,
        price,
        created_at,
        COUNT(*) OVER() AS total
    FROM products
    ORDER BY created_at DESC
    LIMIT $1 OFFSET $2
"#;

const QUERY_DELETE_PRODUCT: &str = r#"
    DELETE FROM products WHERE id = $1
"#;

pub struct PostgresProductRepository {
    pool: PgPool,
}

impl PostgresProductRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProductRepository for PostgresProductRepository {
    async fn create(&self, product: &mut Product, tx: Option<&mut dyn Transaction>) -> Result<()> {
        let pool = self.pool.clone();
        let name = product.name().as_str().to_string();
        let price = product.price().value();

        let (id, created_at): (i32, DateTime<Utc>) =
            <dyn Transaction>::execute_on(&pool, tx, move |conn| {
                Box::pin(async move {
                    sqlx::query_as(QUERY_CREATE_PRODUCT)
                        .bind(name)
                        .bind(price)
                        .fetch_one(&mut *conn)
                        .await
                        .map_domain("Product")
                })
            })
            .await?;

        product.mark_persisted(id, created_at);

        Ok(())
    }

    async fn get_by_id(&self, id: i32) -> Result<Product> {
        let row = sqlx::query_as::<_, PostgresProductRow>(QUERY_GET_PRODUCT_BY_ID)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_domain_infra("Failed to fetch product")?;

        match row {
            Some(row) => row.try_into(),
            None => Err(DomainError::NotFound {
                entity: "Product",
                id: id.to_string(),
            }),
        }
    }

    async fn list(&self, page: u32, limit: u32) -> Result<(Vec<Product>, i64)> {
        let offset = (page.saturating_sub(1) as i64) * limit as i64;

        let rows = sqlx::query_as::<_, PostgresProductListRow>(QUERY_LIST_PRODUCTS)
            .bind(limit as i64)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_domain_infra("Failed to list products")?;

        let mut total = 0;
        let mut products = Vec::with_capacity(rows.len());
        for row in rows {
            let (row, row_total) = row.split();
            total = row_total;
            products.push(Product::try_from(row)?);
        }

        Ok((products, total))
    }

    async fn delete(&self, id: i32, tx: Option<&mut dyn Transaction>) -> Result<()> {
        let pool = self.pool.clone();

        let rows_affected = <dyn Transaction>::execute_on(&pool, tx, move |conn| {
            Box::pin(async move {
                let result = sqlx::query(QUERY_DELETE_PRODUCT)
                    .bind(id)
                    .execute(&mut *conn)
                    .await
                    .map_domain_infra("Failed to delete product")?;
                Ok(result.rows_affected())
            })
        })
        .await?;

        if rows_affected == 0 {
            return Err(DomainError::NotFound {
                entity: "Product",
                id: id.to_string(),
            });
        }

        Ok(())
    }
}
