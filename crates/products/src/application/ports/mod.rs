// crates/products/src/application/ports/mod.rs

mod application_service;
mod event_publisher;

pub use application_service::ProductApplicationService;
pub use event_publisher::EventPublisher;
