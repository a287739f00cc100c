// crates/ingest/src/store.rs
//! In-memory session table.
//!
//! A plain keyed map with process lifetime: no eviction, no persistence, no
//! locking. The daemon loop is the single writer (it owns both the parser
//! invocations and the periodic ingest reads), so interior synchronization
//! would buy nothing here.

use std::collections::HashMap;

use claude_pulse_types::SessionRecord;

#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: HashMap<String, SessionRecord>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, session_id: &str) -> Option<&SessionRecord> {
        self.sessions.get(session_id)
    }

    pub fn get_mut(&mut self, session_id: &str) -> Option<&mut SessionRecord> {
        self.sessions.get_mut(session_id)
    }

    /// Insert or replace, keyed by the record's own `session_id`.
    pub fn upsert(&mut self, record: SessionRecord) {
        self.sessions.insert(record.session_id.clone(), record);
    }

    /// Fetch the record for `session_id`, creating it with `init` on first
    /// sight.
    pub fn get_or_insert_with<F>(&mut self, session_id: &str, init: F) -> &mut SessionRecord
    where
        F: FnOnce() -> SessionRecord,
    {
        self.sessions
            .entry(session_id.to_string())
            .or_insert_with(init)
    }

    /// Deletion is externally driven (e.g. the daemon pruning sessions whose
    /// files disappeared); the parser never removes records.
    pub fn remove(&mut self, session_id: &str) -> Option<SessionRecord> {
        self.sessions.remove(session_id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn sessions(&self) -> impl Iterator<Item = &SessionRecord> {
        self.sessions.values()
    }

    /// Owned copy of every record — what the daemon loop ships to the
    /// monitor server's ingest endpoint.
    pub fn snapshot(&self) -> Vec<SessionRecord> {
        self.sessions.values().cloned().collect()
    }
}
