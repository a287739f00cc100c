// crates/transport/src/error.rs
use thiserror::Error;

/// Errors surfaced to the daemon loop by the monitor uplink.
///
/// `CircuitOpen` is raised without any network attempt; everything else
/// reflects a real request that failed and already counted toward the
/// breaker.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("circuit breaker is open")]
    CircuitOpen,

    #[error("{action}: {status} {status_text}")]
    Http {
        action: &'static str,
        status: u16,
        status_text: String,
    },

    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),
}

impl TransportError {
    pub fn is_circuit_open(&self) -> bool {
        matches!(self, TransportError::CircuitOpen)
    }
}
