// crates/shared-kernel/src/domain/value_objects/value_object.rs

use crate::errors::Result;

/// Contrat commun des value objects : construits via une factory validante,
/// jamais mutés après coup.
pub trait ValueObject {
    fn validate(&self) -> Result<()>;
}
