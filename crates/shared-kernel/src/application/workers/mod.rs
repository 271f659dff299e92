// crates/shared-kernel/src/application/workers/mod.rs

mod outbox_dispatcher;
#[cfg(test)]
mod outbox_dispatcher_test;

pub use outbox_dispatcher::{OutboxConfig, OutboxDispatcher};
