// crates/products/src/application/product_service/mod.rs

mod product_service;
#[cfg(test)]
mod product_service_test;

pub use product_service::ProductService;
