//! Trait abstractions for session persistence
//!
//! The dispatcher never touches storage; the session manager loads history
//! through this trait and appends each finished turn.

use crate::state_machine::Message;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Storage for per-session conversation history
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Full history of a session; empty for an unknown session
    async fn load(&self, session_id: &str) -> Result<Vec<Message>, String>;

    /// Append messages to the end of a session's history
    async fn append(&self, session_id: &str, messages: &[Message]) -> Result<(), String>;

    /// Drop a session's history. Returns whether it existed.
    async fn clear(&self, session_id: &str) -> Result<bool, String>;
}

/// Process-local session store
#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<String, Vec<Message>>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn load(&self, session_id: &str) -> Result<Vec<Message>, String> {
        Ok(self
            .sessions
            .read()
            .await
            .get(session_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn append(&self, session_id: &str, messages: &[Message]) -> Result<(), String> {
        self.sessions
            .write()
            .await
            .entry(session_id.to_string())
            .or_default()
            .extend_from_slice(messages);
        Ok(())
    }

    async fn clear(&self, session_id: &str) -> Result<bool, String> {
        Ok(self.sessions.write().await.remove(session_id).is_some())
    }
}
