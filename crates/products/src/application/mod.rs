// crates/products/src/application/mod.rs

pub mod create_product;
pub mod delete_product;
pub mod list_products;
pub mod ports;
pub mod product_service;
