// crates/products/src/infrastructure/postgres/rows/postgres_product_row.rs

use chrono::{DateTime, Utc};
use sqlx::FromRow;

use crate::domain::entities::Product;
use crate::domain::value_objects::{Price, ProductName};
use shared_kernel::errors::DomainError;

/// Struct privé à l'infrastructure pour le mapping sqlx
#[derive(FromRow)]
pub struct PostgresProductRow {
    pub id: i32,
    pub name: String,
    pub price: f64,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<PostgresProductRow> for Product {
    type Error = DomainError;

    /// Une ligne stockée qui ne passe plus les factories du domaine est de la
    /// donnée corrompue, pas une erreur de validation client.
    fn try_from(row: PostgresProductRow) -> Result<Self, Self::Error> {
        let name = ProductName::try_new(row.name).map_err(|e| DomainError::DataCorruption {
            entity: "Product",
            reason: format!("invalid name for product {}: {e}", row.id),
        })?;

        let price = Price::try_new(row.price).map_err(|e| DomainError::DataCorruption {
            entity: "Product",
            reason: format!("invalid price for product {}: {e}", row.id),
        })?;

        Ok(Product::restore(row.id, name, price, row.created_at))
    }
}

/// Variante de listing : la fenêtre COUNT(*) OVER() évite un second round-trip
#[derive(FromRow)]
pub struct PostgresProductListRow {
    pub id: i32,
    pub name: String,
    pub price: f64,
    pub created_at: DateTime<Utc>,
    pub total: i64,
}

impl PostgresProductListRow {
    pub fn split(self) -> (PostgresProductRow, i64) {
        (
            PostgresProductRow {
                id: self.id,
                name: self.name,
                price: self.price,
                created_at: self.created_at,
            },
            self.total,
        )
    }
}
