// crates/shared-kernel/src/domain/transaction/transaction.rs

use std::any::Any;

/// Handle opaque sur une transaction du store. Le domaine ne connaît pas le
/// driver ; l'infrastructure downcaste vers son type concret.
pub trait Transaction: Send + Any {
    fn as_any_mut(&mut self) -> &mut dyn Any;
}
