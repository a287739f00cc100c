// crates/ingest/src/parser.rs
//! Incremental JSONL chunk parser with byte-exact resumability.
//!
//! The daemon loop reads the new bytes appended to a transcript since its
//! last poll and hands them here as text. We split on `\n`, apply each
//! complete line to the session store, and report exactly how many UTF-8
//! bytes were safely consumed. The loop advances its offset by that amount
//! and resubmits the unconsumed tail (at most one trailing partial line)
//! prepended to the next read.

use claude_pulse_types::RawEvent;
use tracing::{debug, warn};

use crate::engine;
use crate::store::SessionStore;

/// Lines longer than this are never parsed. A single transcript line past
/// 1 MB is either corrupt or a pathological tool dump; consuming it keeps
/// the driver's carry buffer bounded.
pub const MAX_LINE_BYTES: usize = 1_000_000;

/// What to do with one framed line.
enum LineDisposition {
    /// Count the line's bytes and move on: applied, blank, oversized, or
    /// corrupt in the middle of the chunk.
    Consume,
    /// Stop the batch. The line is presumed a partial write still being
    /// flushed; its bytes stay unconsumed for the next read.
    HoldRemainder,
}

/// Apply a chunk of new transcript text to the store.
///
/// Returns the number of UTF-8 bytes of `chunk` that were consumed. Every
/// segment except the last is a complete line and its trailing newline
/// counts toward the total; the last segment has no newline and is consumed
/// only if it parses (or is blank/oversized).
///
/// Failure semantics: oversized lines and corrupt middle lines are logged
/// and skipped, events missing `sessionId` or `type` are dropped, and a
/// corrupt trailing line halts the batch unconsumed. Nothing here is fatal.
pub fn parse_chunk(file_path: &str, chunk: &str, store: &mut SessionStore) -> usize {
    let mut consumed = 0usize;

    let segments: Vec<&str> = chunk.split('\n').collect();
    let last_index = segments.len() - 1;

    for (index, segment) in segments.iter().enumerate() {
        let is_last = index == last_index;
        // Trailing newline is part of every non-final line's byte count.
        let line_bytes = segment.len() + usize::from(!is_last);

        match process_line(file_path, segment, index, is_last, store) {
            LineDisposition::Consume => consumed += line_bytes,
            LineDisposition::HoldRemainder => break,
        }
    }

    consumed
}

fn process_line(
    file_path: &str,
    segment: &str,
    index: usize,
    is_last: bool,
    store: &mut SessionStore,
) -> LineDisposition {
    if segment.len() > MAX_LINE_BYTES {
        warn!(
            path = file_path,
            line_index = index,
            bytes = segment.len(),
            "Skipping oversized transcript line"
        );
        return LineDisposition::Consume;
    }

    let trimmed = segment.trim();
    if trimmed.is_empty() {
        return LineDisposition::Consume;
    }

    let event: RawEvent = match serde_json::from_str(trimmed) {
        Ok(event) => event,
        Err(e) if is_last => {
            // Partial write in progress; the next read completes the line.
            debug!(path = file_path, error = %e, "Holding incomplete trailing line");
            return LineDisposition::HoldRemainder;
        }
        Err(e) => {
            warn!(
                path = file_path,
                line_index = index,
                error = %e,
                "Skipping corrupt transcript line"
            );
            return LineDisposition::Consume;
        }
    };

    engine::apply_event(file_path, event, store);
    LineDisposition::Consume
}
