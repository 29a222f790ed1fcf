//! Session manager: per-session serialization around the dispatcher
//!
//! Holds one async lock per session id. A turn loads the history, runs the
//! dispatcher, and appends its tail before the lock is released, so the next
//! turn on the same session always sees the previous one in full. A lock is
//! dropped from the map once nobody holds or waits on it.

use super::dispatcher::{DispatchError, Dispatcher, TurnOutcome};
use super::traits::SessionStore;
use crate::state_machine::Message;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;

type SessionLocks = Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>;

pub struct SessionManager {
    dispatcher: Arc<Dispatcher>,
    store: Arc<dyn SessionStore>,
    locks: SessionLocks,
}

/// A claim on one session's lock, released from the map on drop
struct SessionLease<'a> {
    locks: &'a SessionLocks,
    session_id: &'a str,
    lock: Arc<tokio::sync::Mutex<()>>,
}

impl Drop for SessionLease<'_> {
    fn drop(&mut self) {
        let mut locks = self
            .locks
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        // Leases are only created under this mutex, so two references
        // (the map's and ours) means no other turn holds or awaits the lock
        if Arc::strong_count(&self.lock) == 2 {
            locks.remove(self.session_id);
        }
    }
}

impl SessionManager {
    pub fn new(dispatcher: Arc<Dispatcher>, store: Arc<dyn SessionStore>) -> Self {
        Self {
            dispatcher,
            store,
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    fn lease<'a>(&'a self, session_id: &'a str) -> SessionLease<'a> {
        let mut locks = self
            .locks
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let lock = locks.entry(session_id.to_string()).or_default().clone();
        SessionLease {
            locks: &self.locks,
            session_id,
            lock,
        }
    }

    #[cfg(test)]
    fn tracked_sessions(&self) -> usize {
        self.locks.lock().unwrap().len()
    }

    /// Process one user message for a session.
    ///
    /// On a dispatcher error the user message is still recorded, followed by
    /// a system message carrying the error text. A cancelled turn records
    /// only the user message.
    pub async fn process_turn(
        &self,
        session_id: &str,
        text: impl Into<String>,
        cancel: CancellationToken,
    ) -> Result<TurnOutcome, DispatchError> {
        let lease = self.lease(session_id);
        let _guard = lease.lock.lock().await;

        let history = self
            .store
            .load(session_id)
            .await
            .map_err(DispatchError::Store)?;
        let incoming = Message::user(text);

        tracing::info!(session_id = %session_id, history_len = history.len(), "Processing turn");

        match self
            .dispatcher
            .process_turn(history, incoming.clone(), &cancel)
            .await
        {
            Ok(outcome) => {
                self.store
                    .append(session_id, &outcome.appended)
                    .await
                    .map_err(DispatchError::Store)?;
                Ok(outcome)
            }
            Err(e) => {
                let mut record = vec![incoming];
                if !matches!(e, DispatchError::Cancelled) {
                    record.push(Message::system(e.user_message()));
                }
                if let Err(store_err) = self.store.append(session_id, &record).await {
                    tracing::error!(session_id = %session_id, error = %store_err, "Failed to record failed turn");
                }
                tracing::warn!(session_id = %session_id, error = %e, "Turn failed");
                Err(e)
            }
        }
    }

    #[cfg(test)]
    pub async fn history(&self, session_id: &str) -> Result<Vec<Message>, DispatchError> {
        self.store
            .load(session_id)
            .await
            .map_err(DispatchError::Store)
    }

    /// Drop a session's history. Waits for any in-flight turn to finish.
    pub async fn clear(&self, session_id: &str) -> Result<bool, DispatchError> {
        let lease = self.lease(session_id);
        let _guard = lease.lock.lock().await;
        let existed = self
            .store
            .clear(session_id)
            .await
            .map_err(DispatchError::Store)?;
        tracing::info!(session_id = %session_id, existed, "Session cleared");
        Ok(existed)
    }
}
