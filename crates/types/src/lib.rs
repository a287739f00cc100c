// crates/types/src/lib.rs
pub mod event;
pub mod health;
pub mod model;
pub mod session;

pub use event::*;
pub use health::*;
pub use model::*;
pub use session::*;
