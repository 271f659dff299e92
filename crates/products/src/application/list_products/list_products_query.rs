// crates/products/src/application/list_products/list_products_query.rs

/// Pagination brute du bord ; bornée par le use case
#[derive(Debug, Clone, Copy)]
pub struct ListProductsQuery {
    pub page: u32,
    pub limit: u32,
}
