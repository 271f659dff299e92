// crates/shared-kernel/src/domain/transaction/mod.rs

mod transaction;
mod unit_of_work;

pub use transaction::Transaction;
pub use unit_of_work::{UnitOfWork, UowFactory};
