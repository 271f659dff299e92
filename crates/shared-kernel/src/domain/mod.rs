// crates/shared-kernel/src/domain/mod.rs

pub mod outbox;
pub mod transaction;
pub mod value_objects;
