// crates/transport/src/client.rs
//! HTTP client for the monitor server, gated by the circuit breaker.

use serde::Serialize;
use tracing::debug;

use claude_pulse_types::SessionRecord;

use crate::breaker::CircuitBreaker;
use crate::config::MonitorConfig;
use crate::error::TransportError;
use crate::payload::{DeregisterPayload, HeartbeatPayload, IngestPayload, RegisterInfo};

const REGISTER_PATH: &str = "/api/cli-monitor/register";
const HEARTBEAT_PATH: &str = "/api/cli-monitor/heartbeat";
const INGEST_PATH: &str = "/api/cli-monitor/ingest";
const DEREGISTER_PATH: &str = "/api/cli-monitor/deregister";

/// One client per daemon: the breaker state inside is the daemon's single
/// view of the monitor server's health.
#[derive(Debug)]
pub struct MonitorClient {
    http: reqwest::Client,
    base_url: String,
    breaker: CircuitBreaker,
}

impl MonitorClient {
    pub fn new(config: MonitorConfig) -> Result<Self, TransportError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            breaker: CircuitBreaker::new(config.failure_threshold, config.cooldown),
        })
    }

    pub async fn register(&self, info: &RegisterInfo) -> Result<(), TransportError> {
        self.post("Registration failed", REGISTER_PATH, info).await
    }

    pub async fn heartbeat(
        &self,
        daemon_id: &str,
        session_count: usize,
    ) -> Result<(), TransportError> {
        let payload = HeartbeatPayload {
            daemon_id,
            session_count,
        };
        self.post("Heartbeat failed", HEARTBEAT_PATH, &payload).await
    }

    pub async fn ingest(
        &self,
        daemon_id: &str,
        sessions: &[SessionRecord],
        removed_session_ids: &[String],
    ) -> Result<(), TransportError> {
        let payload = IngestPayload {
            daemon_id,
            sessions,
            removed_session_ids,
        };
        self.post("Ingest failed", INGEST_PATH, &payload).await
    }

    pub async fn deregister(&self, daemon_id: &str) -> Result<(), TransportError> {
        let payload = DeregisterPayload { daemon_id };
        self.post("Deregistration failed", DEREGISTER_PATH, &payload)
            .await
    }

    /// Breaker state for diagnostics (heartbeat logging, status endpoints).
    pub fn circuit_state(&self) -> &'static str {
        self.breaker.state_name()
    }

    async fn post<T: Serialize>(
        &self,
        action: &'static str,
        path: &str,
        body: &T,
    ) -> Result<(), TransportError> {
        self.breaker.try_acquire()?;

        let url = format!("{}{}", self.base_url, path);
        match self.http.post(&url).json(body).send().await {
            Ok(response) if response.status().is_success() => {
                self.breaker.record_success();
                Ok(())
            }
            Ok(response) => {
                self.breaker.record_failure();
                let status = response.status();
                debug!(%url, status = status.as_u16(), "monitor server rejected request");
                Err(TransportError::Http {
                    action,
                    status: status.as_u16(),
                    status_text: status.canonical_reason().unwrap_or("unknown").to_string(),
                })
            }
            Err(e) => {
                self.breaker.record_failure();
                debug!(%url, error = %e, "monitor server unreachable");
                Err(TransportError::Network(e))
            }
        }
    }
}
