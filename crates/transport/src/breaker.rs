// crates/transport/src/breaker.rs
//! Circuit breaker state machine.
//!
//! Closed → (threshold consecutive failures) → Open → (cooldown elapses,
//! next call becomes the probe) → HalfOpen → success closes / failure
//! re-opens immediately. All failure kinds count identically toward the
//! threshold.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::error::TransportError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CircuitState {
    Closed,
    Open { since: Instant },
    HalfOpen,
}

#[derive(Debug)]
struct BreakerInner {
    state: CircuitState,
    consecutive_failures: u32,
}

/// Per-client breaker. The mutex keeps the open→half-open handoff atomic:
/// exactly one caller wins the probe slot after the cooldown.
#[derive(Debug)]
pub struct CircuitBreaker {
    inner: Mutex<BreakerInner>,
    threshold: u32,
    cooldown: Duration,
}

impl CircuitBreaker {
    pub fn new(threshold: u32, cooldown: Duration) -> Self {
        Self {
            inner: Mutex::new(BreakerInner {
                state: CircuitState::Closed,
                consecutive_failures: 0,
            }),
            threshold,
            cooldown,
        }
    }

    /// Gate one call. `Ok` means the caller may issue its request and must
    /// report the outcome via [`record_success`](Self::record_success) or
    /// [`record_failure`](Self::record_failure).
    pub fn try_acquire(&self) -> Result<(), TransportError> {
        let mut inner = self.lock();
        match inner.state {
            CircuitState::Closed => Ok(()),
            CircuitState::Open { since } => {
                if since.elapsed() >= self.cooldown {
                    inner.state = CircuitState::HalfOpen;
                    info!("circuit breaker half-open, allowing one probe");
                    Ok(())
                } else {
                    Err(TransportError::CircuitOpen)
                }
            }
            // The single probe slot is taken.
            CircuitState::HalfOpen => Err(TransportError::CircuitOpen),
        }
    }

    pub fn record_success(&self) {
        let mut inner = self.lock();
        inner.consecutive_failures = 0;
        if inner.state != CircuitState::Closed {
            info!("circuit breaker closed after successful request");
            inner.state = CircuitState::Closed;
        }
    }

    pub fn record_failure(&self) {
        let mut inner = self.lock();
        inner.consecutive_failures += 1;
        match inner.state {
            CircuitState::Closed => {
                if inner.consecutive_failures >= self.threshold {
                    warn!(
                        failures = inner.consecutive_failures,
                        cooldown_secs = self.cooldown.as_secs(),
                        "circuit breaker opened"
                    );
                    inner.state = CircuitState::Open {
                        since: Instant::now(),
                    };
                }
            }
            // A failed probe re-opens without requiring the full threshold.
            CircuitState::HalfOpen => {
                warn!("circuit breaker re-opened after failed probe");
                inner.state = CircuitState::Open {
                    since: Instant::now(),
                };
            }
            CircuitState::Open { .. } => {}
        }
    }

    pub fn state_name(&self) -> &'static str {
        match self.lock().state {
            CircuitState::Closed => "closed",
            CircuitState::Open { .. } => "open",
            CircuitState::HalfOpen => "half-open",
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BreakerInner> {
        // A poisoned breaker lock means a panic mid-transition; the inner
        // state is a copy-type pair, safe to keep using.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn breaker(cooldown_ms: u64) -> CircuitBreaker {
        CircuitBreaker::new(5, Duration::from_millis(cooldown_ms))
    }

    #[test]
    fn stays_closed_below_threshold() {
        let b = breaker(60_000);
        for _ in 0..4 {
            b.try_acquire().unwrap();
            b.record_failure();
        }
        assert_eq!(b.state_name(), "closed");
        assert!(b.try_acquire().is_ok());
    }

    #[test]
    fn opens_at_exactly_five_consecutive_failures() {
        let b = breaker(60_000);
        for _ in 0..5 {
            b.try_acquire().unwrap();
            b.record_failure();
        }
        assert_eq!(b.state_name(), "open");
        assert!(b.try_acquire().unwrap_err().is_circuit_open());
    }

    #[test]
    fn success_resets_the_failure_count() {
        let b = breaker(60_000);
        for _ in 0..4 {
            b.record_failure();
        }
        b.record_success();
        for _ in 0..4 {
            b.record_failure();
        }
        assert_eq!(b.state_name(), "closed");
    }

    #[test]
    fn probe_allowed_after_cooldown() {
        let b = breaker(20);
        for _ in 0..5 {
            b.record_failure();
        }
        assert!(b.try_acquire().unwrap_err().is_circuit_open());

        std::thread::sleep(Duration::from_millis(30));
        assert!(b.try_acquire().is_ok());
        assert_eq!(b.state_name(), "half-open");
    }

    #[test]
    fn only_one_probe_in_half_open() {
        let b = breaker(20);
        for _ in 0..5 {
            b.record_failure();
        }
        std::thread::sleep(Duration::from_millis(30));

        assert!(b.try_acquire().is_ok());
        // Second caller while the probe is in flight is rejected.
        assert!(b.try_acquire().unwrap_err().is_circuit_open());
    }

    #[test]
    fn probe_success_closes_and_resets() {
        let b = breaker(20);
        for _ in 0..5 {
            b.record_failure();
        }
        std::thread::sleep(Duration::from_millis(30));
        b.try_acquire().unwrap();
        b.record_success();

        assert_eq!(b.state_name(), "closed");
        // Counter was reset: four more failures don't re-open.
        for _ in 0..4 {
            b.record_failure();
        }
        assert_eq!(b.state_name(), "closed");
    }

    #[test]
    fn probe_failure_reopens_immediately() {
        let b = breaker(20);
        for _ in 0..5 {
            b.record_failure();
        }
        std::thread::sleep(Duration::from_millis(30));
        b.try_acquire().unwrap();
        b.record_failure();

        assert_eq!(b.state_name(), "open");
        // Cooldown re-armed: still rejecting right away.
        assert!(b.try_acquire().unwrap_err().is_circuit_open());
    }
}
