// crates/types/src/health.rs
//! Health classification: a pure function of the session's derived metrics.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Warning,
    Critical,
}

/// Derive health from context pressure, cache efficiency, and compaction
/// activity.
///
/// The cache-ratio clauses only kick in after 3 turns — the first few turns
/// of a session legitimately run cold.
pub fn health_status(
    context_pressure: f64,
    cache_hit_ratio: f64,
    turn_count: u64,
    compaction_count: u64,
) -> HealthStatus {
    if context_pressure > 0.9 || (cache_hit_ratio < 0.1 && turn_count > 3) {
        HealthStatus::Critical
    } else if context_pressure > 0.7
        || (cache_hit_ratio < 0.3 && turn_count > 3)
        || compaction_count > 0
    {
        HealthStatus::Warning
    } else {
        HealthStatus::Healthy
    }
}
