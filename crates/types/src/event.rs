// crates/types/src/event.rs
//! Deserialization types for one JSONL transcript line.
//!
//! Claude Code JSONL wraps API messages inside a `"message"` field:
//! ```json
//! {"type":"assistant","sessionId":"...","message":{"role":"assistant","model":"...","usage":{...},"content":[...]}}
//! {"type":"user","sessionId":"...","message":{"role":"user","content":"..."},"gitBranch":"..."}
//! ```
//! Every field is optional at the serde level. Required-field checks
//! (`sessionId`, `type`) belong to the state engine, so a line with schema
//! drift degrades to a dropped event rather than a parse failure.

use serde::Deserialize;

/// One raw event, one JSONL line.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawEvent {
    #[serde(rename = "type")]
    pub event_type: Option<String>,
    pub subtype: Option<String>,
    pub uuid: Option<String>,
    pub timestamp: Option<String>,
    pub session_id: Option<String>,
    pub cwd: Option<String>,
    pub git_branch: Option<String>,
    pub agent_id: Option<String>,
    pub message: Option<RawMessage>,
    pub summary: Option<String>,
    pub compact_metadata: Option<CompactMetadata>,
    pub microcompact_metadata: Option<CompactMetadata>,
}

/// The nested API message on user/assistant events.
#[derive(Debug, Clone, Deserialize)]
pub struct RawMessage {
    pub role: Option<String>,
    pub model: Option<String>,
    pub content: Option<MessageContent>,
    pub usage: Option<RawUsage>,
    pub stop_reason: Option<String>,
}

/// Content is either a plain string or an ordered sequence of blocks.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Blocks(Vec<ContentBlock>),
}

/// A single content block, tagged by `type`. Only text/tool_use/tool_result
/// are recognized; anything else (thinking, images, future kinds) collapses
/// to `Other` and is ignored.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: Option<String>,
        name: Option<String>,
    },
    ToolResult {
        tool_use_id: Option<String>,
    },
    #[serde(other)]
    Other,
}

/// Token usage attached to an assistant message.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawUsage {
    pub input_tokens: Option<u64>,
    pub output_tokens: Option<u64>,
    pub cache_read_input_tokens: Option<u64>,
    pub cache_creation_input_tokens: Option<u64>,
    pub cache_creation: Option<RawCacheCreation>,
}

/// Ephemeral cache breakdown nested under `usage.cache_creation`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawCacheCreation {
    pub ephemeral_5m_input_tokens: Option<u64>,
    pub ephemeral_1h_input_tokens: Option<u64>,
}

/// Metadata on `compact_boundary` / `microcompact_boundary` system events.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompactMetadata {
    pub trigger: Option<String>,
    pub pre_tokens: Option<u64>,
    pub tokens_saved: Option<u64>,
}
