// crates/products/src/domain/events/mod.rs

mod product_events;

pub use product_events::{EVENT_PRODUCT_CREATED, EVENT_PRODUCT_DELETED, ProductEvent};
