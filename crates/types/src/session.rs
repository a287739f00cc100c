// crates/types/src/session.rs
//! Per-session state derived from the transcript: identity, lifecycle,
//! conversation counters, token accounting, and performance metrics.
//!
//! These are the wire types shipped to the monitor server's `ingest`
//! endpoint, so everything serializes camelCase.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::event::{RawCacheCreation, RawUsage};
use crate::health::HealthStatus;
use crate::model::DEFAULT_CONTEXT_WINDOW;

/// Upper bound on the `recent_turns` ring buffer.
pub const RECENT_TURNS_CAP: usize = 10;

/// Lifecycle status of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Working,
    WaitingForApproval,
    WaitingForInput,
    Idle,
}

/// A tool call the assistant has issued but the user has not yet approved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingToolUse {
    pub tool_name: String,
    pub tool_id: String,
}

/// Monotonic token accumulators. Never reset for the lifetime of a session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub cache_creation_tokens: u64,
    pub cache_read_tokens: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ephemeral_5m_tokens: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ephemeral_1h_tokens: Option<u64>,
}

impl TokenUsage {
    /// Add one message's usage. Missing fields count as 0. The ephemeral
    /// accumulators only materialize once a `cache_creation` breakdown has
    /// been seen.
    pub fn accumulate(&mut self, usage: &RawUsage) {
        self.input_tokens += usage.input_tokens.unwrap_or(0);
        self.output_tokens += usage.output_tokens.unwrap_or(0);
        self.cache_read_tokens += usage.cache_read_input_tokens.unwrap_or(0);
        self.cache_creation_tokens += usage.cache_creation_input_tokens.unwrap_or(0);

        if let Some(RawCacheCreation {
            ephemeral_5m_input_tokens,
            ephemeral_1h_input_tokens,
        }) = &usage.cache_creation
        {
            let t5m = self.ephemeral_5m_tokens.unwrap_or(0);
            self.ephemeral_5m_tokens = Some(t5m + ephemeral_5m_input_tokens.unwrap_or(0));
            let t1h = self.ephemeral_1h_tokens.unwrap_or(0);
            self.ephemeral_1h_tokens = Some(t1h + ephemeral_1h_input_tokens.unwrap_or(0));
        }
    }

    pub fn is_zero(&self) -> bool {
        self.input_tokens == 0
            && self.output_tokens == 0
            && self.cache_creation_tokens == 0
            && self.cache_read_tokens == 0
    }
}

/// Kind of context-trimming event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompactionKind {
    Compact,
    Microcompact,
}

/// One compaction or microcompaction boundary. Appended, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompactionEvent {
    #[serde(rename = "type")]
    pub kind: CompactionKind,
    pub timestamp: DateTime<Utc>,
    pub trigger: String,
    pub pre_tokens: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tokens_saved: Option<u64>,
    pub session_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_session_id: Option<String>,
}

/// Token metrics for one completed turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnMetric {
    pub turn_number: u64,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub cache_read_tokens: u64,
    pub cache_creation_tokens: u64,
    pub timestamp: DateTime<Utc>,
}

/// Operational health derived from the transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceMetrics {
    pub compaction_count: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_compaction_at: Option<DateTime<Utc>>,
    pub compaction_events: Vec<CompactionEvent>,
    /// Last [`RECENT_TURNS_CAP`] turns, oldest evicted on overflow.
    pub recent_turns: VecDeque<TurnMetric>,
    /// cache_read / (cache_read + input) over `recent_turns`, in [0, 1].
    pub cache_hit_ratio: f64,
    /// `input_tokens` of the most recent completed turn.
    pub context_window_used: u64,
    pub context_window_limit: u64,
    /// `context_window_used / context_window_limit`.
    pub context_pressure: f64,
    pub health_status: HealthStatus,
}

impl Default for PerformanceMetrics {
    fn default() -> Self {
        Self {
            compaction_count: 0,
            last_compaction_at: None,
            compaction_events: Vec::new(),
            recent_turns: VecDeque::with_capacity(RECENT_TURNS_CAP),
            cache_hit_ratio: 0.0,
            context_window_used: 0,
            context_window_limit: DEFAULT_CONTEXT_WINDOW,
            context_pressure: 0.0,
            health_status: HealthStatus::Healthy,
        }
    }
}

impl PerformanceMetrics {
    /// Append a turn metric, evicting the oldest once the ring exceeds
    /// [`RECENT_TURNS_CAP`], and recompute the cache hit ratio.
    pub fn record_turn(&mut self, turn: TurnMetric) {
        self.recent_turns.push_back(turn);
        while self.recent_turns.len() > RECENT_TURNS_CAP {
            self.recent_turns.pop_front();
        }
        self.cache_hit_ratio = self.compute_cache_hit_ratio();
    }

    fn compute_cache_hit_ratio(&self) -> f64 {
        let cache_read: u64 = self.recent_turns.iter().map(|t| t.cache_read_tokens).sum();
        let input: u64 = self.recent_turns.iter().map(|t| t.input_tokens).sum();
        let denominator = cache_read + input;
        if denominator == 0 {
            0.0
        } else {
            cache_read as f64 / denominator as f64
        }
    }
}

/// One monitored session, keyed by `session_id` in the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub session_id: String,
    pub file_path: String,
    pub cwd: String,
    /// Basename of `cwd`.
    pub project_name: String,
    /// Second-to-last path segment of `file_path` (the hashed project
    /// directory under `~/.claude/projects/`).
    pub project_hash: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub git_branch: Option<String>,

    pub status: SessionStatus,
    pub started_at: DateTime<Utc>,
    pub last_activity_at: DateTime<Utc>,
    /// Byte offset tracked by the daemon loop; the engine never advances it.
    pub last_read_offset: u64,

    pub message_count: u64,
    pub turn_count: u64,
    /// First plain-string user message, truncated to 200 chars. Write-once.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub goal: Option<String>,
    /// Last assistant text seen, truncated to 500 chars. Overwritten freely.
    pub recent_output: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pending_tool_use: Option<PendingToolUse>,

    pub token_usage: TokenUsage,

    pub is_subagent: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_session_id: Option<String>,

    pub performance_metrics: PerformanceMetrics,
}

/// Truncate to at most `max` characters, exactly. No ellipsis: the caller
/// contracts (goal ≤ 200, recent output ≤ 500) are hard limits on what gets
/// shipped, not display previews.
pub fn truncate_chars(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        s.chars().take(max).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn usage(input: u64, output: u64, creation: u64, read: u64) -> RawUsage {
        RawUsage {
            input_tokens: Some(input),
            output_tokens: Some(output),
            cache_creation_input_tokens: Some(creation),
            cache_read_input_tokens: Some(read),
            cache_creation: None,
        }
    }

    fn turn(n: u64, input: u64, cache_read: u64) -> TurnMetric {
        TurnMetric {
            turn_number: n,
            input_tokens: input,
            output_tokens: 0,
            cache_read_tokens: cache_read,
            cache_creation_tokens: 0,
            timestamp: Utc.with_ymd_and_hms(2026, 1, 15, 10, 30, 0).unwrap(),
        }
    }

    #[test]
    fn token_usage_additive_across_messages() {
        let mut totals = TokenUsage::default();
        totals.accumulate(&usage(100, 50, 10, 20));
        totals.accumulate(&usage(200, 80, 5, 30));

        assert_eq!(totals.input_tokens, 300);
        assert_eq!(totals.output_tokens, 130);
        assert_eq!(totals.cache_creation_tokens, 15);
        assert_eq!(totals.cache_read_tokens, 50);
        assert!(totals.ephemeral_5m_tokens.is_none());
    }

    #[test]
    fn token_usage_missing_fields_count_as_zero() {
        let mut totals = TokenUsage::default();
        totals.accumulate(&RawUsage {
            input_tokens: Some(40),
            ..Default::default()
        });
        assert_eq!(totals.input_tokens, 40);
        assert_eq!(totals.output_tokens, 0);
        assert!(!totals.is_zero());
    }

    #[test]
    fn ephemeral_accumulators_materialize_on_first_breakdown() {
        let mut totals = TokenUsage::default();
        totals.accumulate(&usage(1, 1, 1, 1));
        assert!(totals.ephemeral_5m_tokens.is_none());

        let mut with_breakdown = usage(1, 1, 1, 1);
        with_breakdown.cache_creation = Some(RawCacheCreation {
            ephemeral_5m_input_tokens: Some(7),
            ephemeral_1h_input_tokens: None,
        });
        totals.accumulate(&with_breakdown);
        totals.accumulate(&with_breakdown);
        assert_eq!(totals.ephemeral_5m_tokens, Some(14));
        assert_eq!(totals.ephemeral_1h_tokens, Some(0));
    }

    #[test]
    fn recent_turns_evicts_oldest_beyond_cap() {
        let mut metrics = PerformanceMetrics::default();
        for n in 0..15 {
            metrics.record_turn(turn(n, 100, 0));
        }
        assert_eq!(metrics.recent_turns.len(), RECENT_TURNS_CAP);
        assert_eq!(metrics.recent_turns.front().unwrap().turn_number, 5);
        assert_eq!(metrics.recent_turns.back().unwrap().turn_number, 14);
    }

    #[test]
    fn cache_hit_ratio_over_ring_buffer() {
        let mut metrics = PerformanceMetrics::default();
        metrics.record_turn(turn(1, 100, 300));
        // 300 / (300 + 100)
        assert!((metrics.cache_hit_ratio - 0.75).abs() < f64::EPSILON);

        metrics.record_turn(turn(2, 300, 100));
        // (300+100) / (400 + 400)
        assert!((metrics.cache_hit_ratio - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn cache_hit_ratio_zero_denominator() {
        let mut metrics = PerformanceMetrics::default();
        metrics.record_turn(turn(1, 0, 0));
        assert_eq!(metrics.cache_hit_ratio, 0.0);
    }

    #[test]
    fn truncation_is_exact() {
        let goal = "g".repeat(300);
        assert_eq!(truncate_chars(&goal, 200).chars().count(), 200);

        let output = "o".repeat(600);
        assert_eq!(truncate_chars(&output, 500).chars().count(), 500);

        // Under the limit: untouched.
        assert_eq!(truncate_chars("short", 200), "short");
    }

    #[test]
    fn truncation_counts_chars_not_bytes() {
        let s = "é".repeat(250);
        let truncated = truncate_chars(&s, 200);
        assert_eq!(truncated.chars().count(), 200);
        assert_eq!(truncated.len(), 400); // 2 bytes per char
    }

    #[test]
    fn status_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&SessionStatus::WaitingForApproval).unwrap(),
            "\"waiting_for_approval\""
        );
        assert_eq!(
            serde_json::to_string(&SessionStatus::Working).unwrap(),
            "\"working\""
        );
    }

    #[test]
    fn compaction_event_wire_shape() {
        let event = CompactionEvent {
            kind: CompactionKind::Microcompact,
            timestamp: Utc.with_ymd_and_hms(2026, 1, 15, 10, 30, 0).unwrap(),
            trigger: "auto".into(),
            pre_tokens: 150_000,
            tokens_saved: None,
            session_id: "s1".into(),
            parent_session_id: None,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"microcompact\""));
        assert!(json.contains("\"preTokens\":150000"));
        assert!(!json.contains("tokensSaved"));
        assert!(!json.contains("parentSessionId"));
    }
}
