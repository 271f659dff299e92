// crates/products/src/domain/services/product_domain_service.rs

use std::sync::Arc;

use crate::domain::entities::Product;
use shared_kernel::errors::{DomainError, Result};

/// Point d'extension pour des règles de validation métier branchables
/// (catalogues interdits, nomenclature interne, etc.)
pub trait ProductValidator: Send + Sync {
    fn validate_product_name(&self, name: &str) -> Result<()>;
}

pub trait ProductDomainService: Send + Sync {
    fn validate_product_for_creation(&self, name: &str, price: f64) -> Result<()>;

    fn can_delete_product(&self, product: &Product) -> Result<()>;
}

pub struct DefaultProductDomainService {
    validator: Option<Arc<dyn ProductValidator>>,
}

impl DefaultProductDomainService {
    pub fn new(validator: Option<Arc<dyn ProductValidator>>) -> Self {
        Self { validator }
    }
}

impl Default for DefaultProductDomainService {
    fn default() -> Self {
        Self::new(None)
    }
}

impl ProductDomainService for DefaultProductDomainService {
    fn validate_product_for_creation(&self, name: &str, _price: f64) -> Result<()> {
        if let Some(validator) = &self.validator {
            validator.validate_product_name(name).map_err(|e| match e {
                DomainError::Validation { .. } => e,
                other => DomainError::Validation {
                    field: "name",
                    reason: other.to_string(),
                },
            })?;
        }

        Ok(())
    }

    fn can_delete_product(&self, _product: &Product) -> Result<()> {
        Ok(())
    }
}
