// crates/products/src/domain/value_objects/price.rs

use serde::{Deserialize, Serialize};

use shared_kernel::domain::value_objects::ValueObject;
use shared_kernel::errors::{DomainError, Result};

#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Price(f64);

impl Price {
    /// Plafond au-delà duquel un prix n'a plus de sens métier
    pub const MAX_VALUE: f64 = 1e15;

    pub fn try_new(value: f64) -> Result<Self> {
        let price = Self(value);
        price.validate()?;
        Ok(price)
    }

    pub fn value(&self) -> f64 {
        self.0
    }
}

impl ValueObject for Price {
    fn validate(&self) -> Result<()> {
        if !self.0.is_finite() || self.0 <= 0.0 {
            return Err(DomainError::Validation {
                field: "price",
                reason: "Product price must be greater than zero".into(),
            });
        }

        if self.0 > Self::MAX_VALUE {
            return Err(DomainError::Validation {
                field: "price",
                reason: format!("Product price cannot exceed {:e}", Self::MAX_VALUE),
            });
        }

        Ok(())
    }
}

// --- CONVERSIONS ---

impl TryFrom<f64> for Price {
    type Error = DomainError;
    fn try_from(value: f64) -> Result<Self> {
        Self::try_new(value)
    }
}

impl From<Price> for f64 {
    fn from(price: Price) -> Self {
        price.0
    }
}

impl std::fmt::Display for Price {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
