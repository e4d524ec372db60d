//! In-memory session store for generated puzzles.
//!
//! The [`SessionStore`] exclusively owns every [`GameSession`] from creation
//! until its first scored submission. All access goes through one mutex, so
//! `get`/`consume` on the same id are mutually exclusive and a session can be
//! consumed at most once.
//!
//! **Lifecycle:** construct one store at process start and share it behind an
//! `Arc`; call [`SessionStore::shutdown`] when the process stops.

use std::collections::HashMap;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{debug, info};

use wordsearch_shared::{GameSession, Puzzle, Result, SessionId, WordSearchError};

/// Primary handle over the live sessions.
pub struct SessionStore {
    sessions: Mutex<HashMap<SessionId, GameSession>>,
    ttl: Option<Duration>,
}

impl SessionStore {
    /// Create an empty store. Sessions older than `ttl` are treated as absent.
    pub fn new(ttl: Option<Duration>) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    /// Bind `puzzle` to a fresh id and store it. Never replaces an existing id.
    pub async fn create(&self, puzzle: Puzzle) -> SessionId {
        let mut sessions = self.sessions.lock().await;
        self.purge_expired(&mut sessions);

        let mut id = SessionId::generate();
        while sessions.contains_key(&id) {
            id = SessionId::generate();
        }

        let session = GameSession::new(id.clone(), puzzle);
        info!(
            session = %id,
            topic = %session.topic,
            targets = session.target_terms.len(),
            "game session created"
        );
        sessions.insert(id.clone(), session);
        id
    }

    /// Read a session without removing it.
    pub async fn get(&self, id: &SessionId) -> Result<GameSession> {
        let mut sessions = self.sessions.lock().await;
        self.purge_expired(&mut sessions);

        sessions
            .get(id)
            .cloned()
            .ok_or_else(|| WordSearchError::SessionNotFound(id.to_string()))
    }

    /// Atomically remove and return a session.
    pub async fn consume(&self, id: &SessionId) -> Result<GameSession> {
        let mut sessions = self.sessions.lock().await;
        self.purge_expired(&mut sessions);

        let session = sessions
            .remove(id)
            .ok_or_else(|| WordSearchError::SessionNotFound(id.to_string()))?;
        debug!(session = %id, remaining = sessions.len(), "game session consumed");
        Ok(session)
    }

    /// Number of live sessions.
    pub async fn count(&self) -> usize {
        let mut sessions = self.sessions.lock().await;
        self.purge_expired(&mut sessions);
        sessions.len()
    }

    /// Ids of live sessions, sorted. Debug surface only.
    pub async fn list_ids(&self) -> Vec<SessionId> {
        let mut sessions = self.sessions.lock().await;
        self.purge_expired(&mut sessions);

        let mut ids: Vec<SessionId> = sessions.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Drop every session. Returns how many were discarded.
    pub async fn shutdown(&self) -> usize {
        let mut sessions = self.sessions.lock().await;
        let dropped = sessions.len();
        sessions.clear();
        info!(dropped, "session store shut down");
        dropped
    }

    fn purge_expired(&self, sessions: &mut HashMap<SessionId, GameSession>) {
        let Some(ttl) = self.ttl else {
            return;
        };
        let Ok(ttl) = chrono::Duration::from_std(ttl) else {
            return;
        };

        let now = Utc::now();
        let before = sessions.len();
        sessions.retain(|_, s| now - s.created_at < ttl);

        let expired = before - sessions.len();
        if expired > 0 {
            debug!(expired, "expired game sessions purged");
        }
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(None)
    }
}
