// crates/ingest/src/lib.rs
mod engine;
pub mod parser;
pub mod store;

pub use parser::*;
pub use store::*;
