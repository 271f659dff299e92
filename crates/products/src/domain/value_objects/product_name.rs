// crates/products/src/domain/value_objects/product_name.rs

use serde::{Deserialize, Serialize};

use shared_kernel::domain::value_objects::ValueObject;
use shared_kernel::errors::{DomainError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ProductName {
    inner: String,
}

impl ProductName {
    pub const MAX_LEN: usize = 255;

    /// Constructeur sécurisé : trim puis validation
    pub fn try_new(value: impl Into<String>) -> Result<Self> {
        let name = Self {
            inner: value.into().trim().to_string(),
        };

        name.validate()?;

        Ok(name)
    }

    pub fn as_str(&self) -> &str {
        &self.inner
    }
}

impl ValueObject for ProductName {
    fn validate(&self) -> Result<()> {
        if self.inner.is_empty() {
            return Err(DomainError::Validation {
                field: "name",
                reason: "Product name cannot be empty".into(),
            });
        }

        if self.inner.chars().count() > Self::MAX_LEN {
            return Err(DomainError::Validation {
                field: "name",
                reason: format!("Product name cannot exceed {} characters", Self::MAX_LEN),
            });
        }

        Ok(())
    }
}

// --- CONVERSIONS ---

impl TryFrom<String> for ProductName {
    type Error = DomainError;
    fn try_from(value: String) -> Result<Self> {
        Self::try_new(value)
    }
}

impl From<ProductName> for String {
    fn from(name: ProductName) -> Self {
        name.inner
    }
}

impl std::fmt::Display for ProductName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.inner)
    }
}
