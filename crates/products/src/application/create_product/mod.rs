// crates/products/src/application/create_product/mod.rs

mod create_product_command;
mod create_product_use_case;

pub use create_product_command::CreateProductCommand;
pub use create_product_use_case::CreateProductUseCase;
