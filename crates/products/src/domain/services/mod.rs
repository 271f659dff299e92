// crates/products/src/domain/services/mod.rs

mod product_domain_service;

pub use product_domain_service::{
    DefaultProductDomainService, ProductDomainService, ProductValidator,
};
