// crates/shared-kernel/src/infrastructure/postgres/factories/mod.rs

mod postgres_factory;

pub use postgres_factory::{PostgresConfig, create_postgres_pool};
