// crates/ingest/src/engine.rs
//! Session state engine: folds one decoded transcript event into the store.
//!
//! Records are created on first sight of a well-formed event for a new
//! `sessionId` (identity fields derived once, at creation) and are never
//! deleted here. Counters only go up; `goal` is write-once; status follows
//! the precedence rules below (tool use outranks text, and pending approval
//! outranks turn completion).

use chrono::{DateTime, Utc};
use tracing::debug;

use claude_pulse_types::{
    context_window_limit, health_status, truncate_chars, CompactionEvent, CompactionKind,
    ContentBlock, MessageContent, PendingToolUse, PerformanceMetrics, RawEvent, SessionRecord,
    SessionStatus, TokenUsage, TurnMetric,
};

use crate::store::SessionStore;

const GOAL_MAX_CHARS: usize = 200;
const RECENT_OUTPUT_MAX_CHARS: usize = 500;

/// Fold one event into the store. Events lacking `sessionId` or `type` are
/// dropped without error.
pub(crate) fn apply_event(file_path: &str, event: RawEvent, store: &mut SessionStore) {
    let (session_id, event_type) = match (&event.session_id, &event.event_type) {
        (Some(s), Some(t)) => (s.clone(), t.clone()),
        _ => {
            debug!(path = file_path, "Dropping event missing sessionId or type");
            return;
        }
    };

    let timestamp = parse_timestamp(event.timestamp.as_deref());

    let record = store.get_or_insert_with(&session_id, || {
        new_record(&session_id, file_path, &event, timestamp)
    });

    if let Some(ts) = timestamp {
        record.last_activity_at = ts;
    }
    if let Some(branch) = &event.git_branch {
        // Always the latest value; branches switch mid-session.
        record.git_branch = Some(branch.clone());
    }

    match event_type.as_str() {
        "user" => apply_user_message(record, &event),
        "assistant" => apply_assistant_message(record, &event),
        "summary" => apply_summary(record, &event),
        "system" => apply_compaction_boundary(record, &event),
        _ => {}
    }
}

fn apply_user_message(record: &mut SessionRecord, event: &RawEvent) {
    let Some(message) = &event.message else {
        return;
    };

    match &message.content {
        Some(MessageContent::Text(text)) => {
            record.message_count += 1;
            if record.goal.is_none() {
                record.goal = Some(truncate_chars(text, GOAL_MAX_CHARS));
            }
        }
        Some(MessageContent::Blocks(blocks)) => {
            record.message_count += 1;
            // A tool_result block means the user granted the pending tool
            // approval and the assistant is running again.
            let approval_granted = blocks
                .iter()
                .any(|b| matches!(b, ContentBlock::ToolResult { .. }));
            if approval_granted {
                record.status = SessionStatus::Working;
                record.pending_tool_use = None;
            }
        }
        None => {}
    }
}

fn apply_assistant_message(record: &mut SessionRecord, event: &RawEvent) {
    let Some(message) = &event.message else {
        return;
    };

    record.message_count += 1;
    if let Some(model) = &message.model {
        record.model = Some(model.clone());
    }
    if let Some(usage) = &message.usage {
        record.token_usage.accumulate(usage);
    }

    match &message.content {
        Some(MessageContent::Blocks(blocks)) => {
            let mut has_tool_use = false;
            let mut has_text = false;
            for block in blocks {
                match block {
                    ContentBlock::ToolUse {
                        id: Some(id),
                        name: Some(name),
                    } => {
                        record.pending_tool_use = Some(PendingToolUse {
                            tool_name: name.clone(),
                            tool_id: id.clone(),
                        });
                        has_tool_use = true;
                    }
                    ContentBlock::Text { text } => {
                        // Last text block wins.
                        record.recent_output = truncate_chars(text, RECENT_OUTPUT_MAX_CHARS);
                        has_text = true;
                    }
                    _ => {}
                }
            }
            if has_tool_use {
                // Tool use outranks text within the same message.
                record.status = SessionStatus::WaitingForApproval;
            } else if has_text {
                record.status = SessionStatus::Working;
            }
        }
        Some(MessageContent::Text(text)) => {
            record.recent_output = truncate_chars(text, RECENT_OUTPUT_MAX_CHARS);
            record.status = SessionStatus::Working;
        }
        None => {}
    }

    if message.stop_reason.is_some() {
        record.turn_count += 1;
        // Pending tool approval is never overridden by turn completion.
        if record.status != SessionStatus::WaitingForApproval {
            record.status = SessionStatus::WaitingForInput;
        }

        if let Some(usage) = &message.usage {
            let input = usage.input_tokens.unwrap_or(0);
            record.performance_metrics.record_turn(TurnMetric {
                turn_number: record.turn_count,
                input_tokens: input,
                output_tokens: usage.output_tokens.unwrap_or(0),
                cache_read_tokens: usage.cache_read_input_tokens.unwrap_or(0),
                cache_creation_tokens: usage.cache_creation_input_tokens.unwrap_or(0),
                timestamp: record.last_activity_at,
            });

            let limit = context_window_limit(record.model.as_deref());
            record.performance_metrics.context_window_used = input;
            record.performance_metrics.context_window_limit = limit;
            record.performance_metrics.context_pressure = input as f64 / limit as f64;
            recompute_health(record);
        }
    }
}

fn apply_summary(record: &mut SessionRecord, event: &RawEvent) {
    record.status = SessionStatus::Idle;
    record.pending_tool_use = None;
    if let Some(summary) = &event.summary {
        record.recent_output = truncate_chars(summary, RECENT_OUTPUT_MAX_CHARS);
    }
}

fn apply_compaction_boundary(record: &mut SessionRecord, event: &RawEvent) {
    let kind = match event.subtype.as_deref() {
        Some("compact_boundary") => CompactionKind::Compact,
        Some("microcompact_boundary") => CompactionKind::Microcompact,
        _ => return,
    };

    let metadata = match kind {
        CompactionKind::Compact => event
            .compact_metadata
            .as_ref()
            .or(event.microcompact_metadata.as_ref()),
        CompactionKind::Microcompact => event
            .microcompact_metadata
            .as_ref()
            .or(event.compact_metadata.as_ref()),
    };

    let timestamp = record.last_activity_at;
    record.performance_metrics.compaction_events.push(CompactionEvent {
        kind,
        timestamp,
        trigger: metadata
            .and_then(|m| m.trigger.clone())
            .unwrap_or_else(|| "unknown".to_string()),
        pre_tokens: metadata.and_then(|m| m.pre_tokens).unwrap_or(0),
        tokens_saved: metadata.and_then(|m| m.tokens_saved),
        session_id: record.session_id.clone(),
        parent_session_id: record.parent_session_id.clone(),
    });
    record.performance_metrics.compaction_count += 1;
    record.performance_metrics.last_compaction_at = Some(timestamp);
    recompute_health(record);
}

fn recompute_health(record: &mut SessionRecord) {
    let metrics = &mut record.performance_metrics;
    metrics.health_status = health_status(
        metrics.context_pressure,
        metrics.cache_hit_ratio,
        record.turn_count,
        metrics.compaction_count,
    );
}

fn new_record(
    session_id: &str,
    file_path: &str,
    event: &RawEvent,
    timestamp: Option<DateTime<Utc>>,
) -> SessionRecord {
    let cwd = event.cwd.clone().unwrap_or_default();
    let started_at = timestamp.unwrap_or_else(Utc::now);
    let (is_subagent, parent_session_id) = detect_subagent(file_path, event.agent_id.is_some());

    SessionRecord {
        session_id: session_id.to_string(),
        file_path: file_path.to_string(),
        project_name: project_name(&cwd),
        project_hash: project_hash(file_path),
        cwd,
        git_branch: None,
        status: SessionStatus::Working,
        started_at,
        last_activity_at: started_at,
        last_read_offset: 0,
        message_count: 0,
        turn_count: 0,
        goal: None,
        recent_output: String::new(),
        model: None,
        pending_tool_use: None,
        token_usage: TokenUsage::default(),
        is_subagent,
        parent_session_id,
        performance_metrics: PerformanceMetrics::default(),
    }
}

/// A session is a subagent if its transcript lives under a `subagents/`
/// directory or its events carry an `agentId`. The parent session ID is the
/// path segment immediately preceding `subagents`
/// (`.../{parentSessionId}/subagents/agent-{id}.jsonl`).
fn detect_subagent(file_path: &str, has_agent_id: bool) -> (bool, Option<String>) {
    let is_subagent = file_path.contains("/subagents/") || has_agent_id;
    if !is_subagent {
        return (false, None);
    }

    let segments: Vec<&str> = file_path.split('/').filter(|s| !s.is_empty()).collect();
    let parent = segments
        .iter()
        .position(|s| *s == "subagents")
        .and_then(|pos| pos.checked_sub(1))
        .and_then(|i| segments.get(i))
        .map(|s| s.to_string());

    (true, parent)
}

/// Basename of the session's working directory.
fn project_name(cwd: &str) -> String {
    std::path::Path::new(cwd)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("")
        .to_string()
}

/// Second-to-last path segment of the transcript path: the hashed project
/// directory under `~/.claude/projects/`.
fn project_hash(file_path: &str) -> String {
    let segments: Vec<&str> = file_path.split('/').filter(|s| !s.is_empty()).collect();
    segments
        .len()
        .checked_sub(2)
        .and_then(|i| segments.get(i))
        .map(|s| s.to_string())
        .unwrap_or_default()
}

fn parse_timestamp(ts: Option<&str>) -> Option<DateTime<Utc>> {
    ts.and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// Bare record for store-level tests.
    pub(crate) fn record(session_id: &str) -> SessionRecord {
        new_record(
            session_id,
            "/home/u/.claude/projects/-home-u-proj/sess.jsonl",
            &RawEvent {
                event_type: Some("user".into()),
                subtype: None,
                uuid: None,
                timestamp: None,
                session_id: Some(session_id.into()),
                cwd: Some("/home/u/proj".into()),
                git_branch: None,
                agent_id: None,
                message: None,
                summary: None,
                compact_metadata: None,
                microcompact_metadata: None,
            },
            None,
        )
    }
}
