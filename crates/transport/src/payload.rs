// crates/transport/src/payload.rs
//! JSON request bodies for the monitor server endpoints. All camelCase on
//! the wire; responses are inspected for HTTP status only.

use chrono::{DateTime, Utc};
use serde::Serialize;

use claude_pulse_types::SessionRecord;

/// Body of `POST /api/cli-monitor/register`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterInfo {
    pub daemon_id: String,
    pub pid: u32,
    pub version: String,
    pub watch_path: String,
    pub capabilities: Vec<String>,
    pub started_at: DateTime<Utc>,
}

/// Body of `POST /api/cli-monitor/heartbeat`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct HeartbeatPayload<'a> {
    pub daemon_id: &'a str,
    pub session_count: usize,
}

/// Body of `POST /api/cli-monitor/ingest`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct IngestPayload<'a> {
    pub daemon_id: &'a str,
    pub sessions: &'a [SessionRecord],
    pub removed_session_ids: &'a [String],
}

/// Body of `POST /api/cli-monitor/deregister`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DeregisterPayload<'a> {
    pub daemon_id: &'a str,
}
