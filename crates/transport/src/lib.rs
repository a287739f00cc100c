// crates/transport/src/lib.rs
pub mod breaker;
pub mod client;
pub mod config;
pub mod error;
pub mod payload;

pub use breaker::*;
pub use client::*;
pub use config::*;
pub use error::*;
pub use payload::*;
