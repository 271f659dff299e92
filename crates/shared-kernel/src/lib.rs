// crates/shared-kernel/src/lib.rs

pub mod application;
pub mod domain;
pub mod errors;
pub mod infrastructure;
pub mod utils;
