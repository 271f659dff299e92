// crates/products/src/application/delete_product/mod.rs

mod delete_product_command;
mod delete_product_use_case;
#[cfg(test)]
mod delete_product_use_case_test;

pub use delete_product_command::DeleteProductCommand;
pub use delete_product_use_case::DeleteProductUseCase;
