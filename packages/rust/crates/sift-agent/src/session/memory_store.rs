//! In-memory session store: session_id -> per-session locked session.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock};

use crate::observability::SessionEvent;

use super::error::SessionError;
use super::message::Message;
use super::store::{Session, SessionStatus, SessionStore, new_session_id};

type SessionSlot = Arc<Mutex<Session>>;

/// Process-local store. The map lock is only held to find a session; each
/// session has its own mutex, so sessions never block each other.
#[derive(Default, Clone)]
pub struct MemorySessionStore {
    inner: Arc<RwLock<HashMap<String, SessionSlot>>>,
}

impl MemorySessionStore {
    /// Empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of sessions.
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    /// True when no session exists.
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }

    async fn slot(&self, session_id: &str) -> Result<SessionSlot, SessionError> {
        self.inner
            .read()
            .await
            .get(session_id)
            .cloned()
            .ok_or_else(|| SessionError::NotFound(session_id.to_string()))
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn create(&self, session_id: Option<String>) -> Result<String, SessionError> {
        let id = session_id.unwrap_or_else(new_session_id);
        let mut sessions = self.inner.write().await;
        match sessions.entry(id.clone()) {
            Entry::Occupied(_) => Err(SessionError::AlreadyExists(id)),
            Entry::Vacant(slot) => {
                slot.insert(Arc::new(Mutex::new(Session::new(id.clone()))));
                tracing::debug!(
                    event = SessionEvent::SessionCreated.as_str(),
                    session_id = %id,
                    backend = "memory",
                    "session created"
                );
                Ok(id)
            }
        }
    }

    async fn append(&self, session_id: &str, message: Message) -> Result<(), SessionError> {
        let slot = self.slot(session_id).await?;
        let mut session = slot.lock().await;
        session.messages.push(message);
        tracing::debug!(
            event = SessionEvent::SessionMessagesAppended.as_str(),
            session_id,
            total_messages = session.messages.len(),
            backend = "memory",
            "session message appended"
        );
        Ok(())
    }

    async fn get(&self, session_id: &str) -> Result<Session, SessionError> {
        let slot = self.slot(session_id).await?;
        let session = slot.lock().await.clone();
        tracing::debug!(
            event = SessionEvent::SessionMessagesLoaded.as_str(),
            session_id,
            loaded_messages = session.messages.len(),
            backend = "memory",
            "session loaded"
        );
        Ok(session)
    }

    async fn replace_prefix(
        &self,
        session_id: &str,
        expected_compactions: u64,
        prefix_len: usize,
        summary: Message,
    ) -> Result<(), SessionError> {
        let slot = self.slot(session_id).await?;
        let mut session = slot.lock().await;
        session.replace_prefix(expected_compactions, prefix_len, summary)?;
        tracing::debug!(
            event = SessionEvent::SessionPrefixReplaced.as_str(),
            session_id,
            replaced_messages = prefix_len,
            total_messages = session.messages.len(),
            compactions = session.compactions,
            backend = "memory",
            "session prefix replaced with summary"
        );
        Ok(())
    }

    async fn set_status(
        &self,
        session_id: &str,
        status: SessionStatus,
    ) -> Result<(), SessionError> {
        let slot = self.slot(session_id).await?;
        slot.lock().await.status = status;
        tracing::debug!(
            event = SessionEvent::SessionStatusChanged.as_str(),
            session_id,
            status = status.as_str(),
            backend = "memory",
            "session status changed"
        );
        Ok(())
    }
}
