//! Per-user session state.
//!
//! Each browser session holds at most one live summary; questions are always
//! answered against the most recently generated one. Nothing survives a
//! process restart.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use uuid::Uuid;

/// State carried across one user's interactions.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    /// The last generated summary. None until the first successful
    /// generation; overwritten, never appended, on regeneration.
    pub summary: Option<String>,
}

impl Session {
    fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            summary: None,
        }
    }
}

/// In-memory session store, keyed by the session cookie.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: DashMap<Uuid, Session>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a session by id, creating a fresh one when the id is missing
    /// or unknown (create-on-first-access).
    pub fn get_or_create(&self, id: Option<Uuid>) -> Session {
        if let Some(id) = id {
            if let Some(session) = self.sessions.get(&id) {
                return session.clone();
            }
        }
        let session = Session::new();
        self.sessions.insert(session.id, session.clone());
        session
    }

    /// Overwrite the stored summary for a session.
    pub fn set_summary(&self, id: Uuid, summary: String) {
        if let Some(mut session) = self.sessions.get_mut(&id) {
            session.summary = Some(summary);
        }
    }

    /// The current summary for a session, if one has been generated.
    pub fn summary(&self, id: Uuid) -> Option<String> {
        self.sessions.get(&id).and_then(|s| s.summary.clone())
    }

    /// Number of active sessions.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
