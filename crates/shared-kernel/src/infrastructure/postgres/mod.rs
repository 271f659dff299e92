// crates/shared-kernel/src/infrastructure/postgres/mod.rs

pub mod factories;
pub mod mappers;
mod outbox_listener;
mod postgres_outbox_store;
mod postgres_transaction;
mod postgres_unit_of_work;
mod rows;
pub mod utils;

pub use mappers::SqlxErrorExt;
pub use outbox_listener::OutboxListener;
pub use postgres_outbox_store::PostgresOutboxStore;
pub use postgres_transaction::PostgresTransaction;
pub use postgres_unit_of_work::{PostgresUnitOfWork, PostgresUowFactory};
pub use rows::OutboxRow;
