//! In-memory session store (tests and ephemeral runs)

use async_trait::async_trait;
use council_application::ports::session_store::{SessionStore, StoreError};
use council_domain::{CouncilSession, SessionId};
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: Mutex<HashMap<SessionId, CouncilSession>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored sessions
    pub fn len(&self) -> usize {
        self.sessions.lock().map(|s| s.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn save(&self, session: &CouncilSession) -> Result<(), StoreError> {
        let mut sessions = self
            .sessions
            .lock()
            .map_err(|_| StoreError::Other("session map poisoned".to_string()))?;
        sessions.insert(session.session_id, session.clone());
        Ok(())
    }

    async fn load(&self, session_id: SessionId) -> Result<CouncilSession, StoreError> {
        self.sessions
            .lock()
            .map_err(|_| StoreError::Other("session map poisoned".to_string()))?
            .get(&session_id)
            .cloned()
            .ok_or(StoreError::NotFound(session_id))
    }

    async fn recent(&self, limit: usize) -> Result<Vec<CouncilSession>, StoreError> {
        let mut sessions: Vec<CouncilSession> = self
            .sessions
            .lock()
            .map_err(|_| StoreError::Other("session map poisoned".to_string()))?
            .values()
            .cloned()
            .collect();
        sessions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        sessions.truncate(limit);
        Ok(sessions)
    }
}
