// crates/transport/src/config.rs
use std::time::Duration;

/// Connection and resilience settings for the monitor uplink.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Base URL of the monitor server, scheme + host + port.
    pub base_url: String,
    /// Consecutive failures that trip the circuit breaker open.
    pub failure_threshold: u32,
    /// How long the breaker stays open before allowing one probe.
    pub cooldown: Duration,
    /// Client-side deadline on every request. A hung connection counts as a
    /// breaker failure instead of wedging the daemon loop.
    pub request_timeout: Duration,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:3100".to_string(),
            failure_threshold: 5,
            cooldown: Duration::from_secs(60),
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl MonitorConfig {
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = MonitorConfig::default();
        assert_eq!(config.failure_threshold, 5);
        assert_eq!(config.cooldown, Duration::from_secs(60));
        assert_eq!(config.request_timeout, Duration::from_secs(30));
    }
}
