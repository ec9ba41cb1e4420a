//! Keyed store of active combat sessions.
//!
//! Each session sits behind its own mutex: one lock per encounter, held for
//! the whole of an action resolution or turn advance. The map lock is only
//! held long enough to look a handle up.

use crate::combatant::SessionId;
use crate::error::CombatError;
use crate::session::CombatSession;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::info;

/// Shared handle to one session.
pub type SessionHandle = Arc<Mutex<CombatSession>>;

#[derive(Default)]
pub struct SessionRepository {
    sessions: RwLock<HashMap<SessionId, SessionHandle>>,
}

impl SessionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a session under its own id.
    pub async fn insert(&self, session: CombatSession) -> Result<SessionHandle, CombatError> {
        session.check_invariants()?;
        let id = session.session_id;

        let mut sessions = self.sessions.write().await;
        if sessions.contains_key(&id) {
            return Err(CombatError::SessionExists(id));
        }
        let handle = Arc::new(Mutex::new(session));
        sessions.insert(id, Arc::clone(&handle));
        info!(session = %id, active = sessions.len(), "combat session registered");
        Ok(handle)
    }

    pub async fn get(&self, id: SessionId) -> Result<SessionHandle, CombatError> {
        self.sessions
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(CombatError::SessionNotFound(id))
    }

    /// Remove a session and return its final state.
    ///
    /// Waits for any in-flight resolution on the session to finish.
    pub async fn archive(&self, id: SessionId) -> Result<CombatSession, CombatError> {
        let handle = self
            .sessions
            .write()
            .await
            .remove(&id)
            .ok_or(CombatError::SessionNotFound(id))?;
        let session = handle.lock().await.clone();
        info!(session = %id, outcome = ?session.outcome(), "combat session archived");
        Ok(session)
    }

    pub async fn ids(&self) -> Vec<SessionId> {
        self.sessions.read().await.keys().copied().collect()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}
