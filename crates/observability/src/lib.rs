// crates/observability/src/lib.rs
//! Tracing subscriber setup: leveled, JSON-formatted structured logs.
//!
//! The library crates only emit through the `tracing` facade; installing a
//! subscriber is the host process's job. The daemon calls [`init`] once at
//! startup; tests that want log output can call [`try_init`] and ignore the
//! already-installed error.

use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::EnvFilter;

/// Install a JSON subscriber filtered by `RUST_LOG` (default `info`).
///
/// Errors if a global subscriber is already set.
pub fn try_init() -> Result<(), TryInitError> {
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .finish()
        .try_init()
}

/// [`try_init`], panicking on double initialization. For process entry
/// points only.
pub fn init() {
    try_init().expect("tracing subscriber already installed");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_init_is_rejected() {
        try_init().unwrap();
        assert!(try_init().is_err());
        tracing::info!("subscriber installed");
    }
}
