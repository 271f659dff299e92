// crates/products/src/domain/value_objects/mod.rs

mod price;
mod product_name;

pub use price::Price;
pub use product_name::ProductName;
