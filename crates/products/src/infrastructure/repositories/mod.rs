// crates/products/src/infrastructure/repositories/mod.rs

mod metrics_product_repository;

pub use metrics_product_repository::MetricsProductRepository;
