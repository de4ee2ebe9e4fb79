// src/engine/sessions.rs - Known Session Directory
//! Sessions announced by the transport engine
//!
//! Order submission only accepts sessions that have been established; this
//! directory is the set consulted for that check.

use dashmap::DashMap;
use tracing::info;

use crate::{core::types::SessionId, OmsError, OmsResult};

/// Established sessions keyed by their `BEGIN:SENDER->TARGET` name
#[derive(Debug, Default)]
pub struct SessionDirectory {
    sessions: DashMap<String, SessionId>,
}

impl SessionDirectory {
    /// Empty directory
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an established session; re-registering is harmless
    pub fn register(&self, session: SessionId) {
        let name = session.to_string();
        if self.sessions.insert(name.clone(), session).is_none() {
            info!(session = %name, "Session established");
        }
    }

    /// Look up a session by name
    pub fn resolve(&self, name: &str) -> OmsResult<SessionId> {
        self.sessions
            .get(name.trim())
            .map(|entry| entry.value().clone())
            .ok_or_else(|| OmsError::Validation(format!("Invalid SessionID: {name}")))
    }

    /// Whether `session` has been established
    pub fn contains(&self, session: &SessionId) -> bool {
        self.sessions.contains_key(&session.to_string())
    }

    /// All established sessions, sorted by name
    pub fn list(&self) -> Vec<SessionId> {
        let mut sessions: Vec<SessionId> = self.sessions.iter().map(|e| e.value().clone()).collect();
        sessions.sort_by_key(ToString::to_string);
        sessions
    }

    /// Number of established sessions
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Whether no session has been established yet
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
