// crates/types/src/model.rs
//! Model-name-keyed context window lookup.
//!
//! Every family currently resolves to the same 200k window, but the dispatch
//! stays keyed by family so a future model with a different window is a
//! one-arm change here rather than a schema change upstream.

/// Window applied when the model is unknown or unset.
pub const DEFAULT_CONTEXT_WINDOW: u64 = 200_000;

/// Known model-ID family prefixes and their window sizes, as seen in
/// session transcripts. One entry per family; adjust here when a family
/// ships a different window.
const FAMILY_WINDOWS: &[(&str, u64)] = &[
    ("claude-opus", 200_000),
    ("claude-sonnet", 200_000),
    ("claude-haiku", 200_000),
];

/// Resolve a model identifier to its context window limit in tokens.
pub fn context_window_limit(model: Option<&str>) -> u64 {
    let Some(model) = model else {
        return DEFAULT_CONTEXT_WINDOW;
    };

    FAMILY_WINDOWS
        .iter()
        .find(|(prefix, _)| model.starts_with(prefix))
        .map(|&(_, window)| window)
        .unwrap_or(DEFAULT_CONTEXT_WINDOW)
}
