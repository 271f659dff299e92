// crates/products/src/application/create_product/create_product_command.rs

/// Commande telle que reçue du bord : brute, non validée
#[derive(Debug, Clone)]
pub struct CreateProductCommand {
    pub name: String,
    pub price: f64,
    /// Clé client (header Idempotency-Key) ; générée par le service si absente
    pub idempotency_key: Option<String>,
}
