// crates/shared-kernel/src/infrastructure/postgres/utils/mod.rs

mod postgres_test_context;

pub use postgres_test_context::PostgresTestContext;
