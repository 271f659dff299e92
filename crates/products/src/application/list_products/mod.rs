// crates/products/src/application/list_products/mod.rs

mod list_products_query;
mod list_products_use_case;

pub use list_products_query::ListProductsQuery;
pub use list_products_use_case::{ListProductsUseCase, ProductPage};
