// crates/products/src/domain/repositories/mod.rs

mod product_repository;

pub use product_repository::ProductRepository;
