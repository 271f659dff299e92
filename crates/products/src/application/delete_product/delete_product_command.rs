// crates/products/src/application/delete_product/delete_product_command.rs

#[derive(Debug, Clone)]
pub struct DeleteProductCommand {
    pub id: i32,
    pub idempotency_key: Option<String>,
}
