// crates/notifications/src/domain/mod.rs

mod event;

pub use event::{EVENT_PRODUCT_CREATED, EVENT_PRODUCT_DELETED, ProductEvent};
