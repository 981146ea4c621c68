//! Session store contract.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::SessionError;
use super::message::Message;

/// Session lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    /// Accepting turns.
    #[default]
    Active,
    /// Closed normally.
    Completed,
    /// Closed after a failure.
    Error,
}

impl SessionStatus {
    /// Stable label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Error => "error",
        }
    }
}

/// Snapshot of one session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Session id.
    pub id: String,
    /// Messages in insertion order.
    pub messages: Vec<Message>,
    /// Lifecycle state.
    pub status: SessionStatus,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Number of prefix replacements applied so far. Appends leave it alone,
    /// so an unchanged value means the stored prefix is still the one a
    /// snapshot saw.
    #[serde(default)]
    pub compactions: u64,
}

impl Session {
    /// Fresh active session.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            messages: Vec::new(),
            status: SessionStatus::Active,
            created_at: Utc::now(),
            compactions: 0,
        }
    }

    pub(crate) fn replace_prefix(
        &mut self,
        expected_compactions: u64,
        prefix_len: usize,
        summary: Message,
    ) -> Result<(), SessionError> {
        if self.compactions != expected_compactions {
            return Err(SessionError::PrefixConflict {
                session_id: self.id.clone(),
                expected: expected_compactions,
                actual: self.compactions,
            });
        }
        if prefix_len > self.messages.len() {
            return Err(SessionError::InvalidPrefix {
                session_id: self.id.clone(),
                prefix_len,
                available: self.messages.len(),
            });
        }
        self.messages.splice(..prefix_len, std::iter::once(summary));
        self.compactions += 1;
        Ok(())
    }
}

/// Generate a session id.
#[must_use]
pub fn new_session_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Append-only message log per session.
///
/// Every mutation of one session is serialized: concurrent `append` calls on
/// the same id land in completion order and never interleave.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Create a session, generating an id when none is given.
    async fn create(&self, session_id: Option<String>) -> Result<String, SessionError>;

    /// Append one message.
    async fn append(&self, session_id: &str, message: Message) -> Result<(), SessionError>;

    /// Snapshot of the session.
    async fn get(&self, session_id: &str) -> Result<Session, SessionError>;

    /// Replace the first `prefix_len` messages with `summary`. Messages appended
    /// after the caller's snapshot are kept.
    ///
    /// `expected_compactions` is [`Session::compactions`] from the snapshot the
    /// summary was built from. When another replacement landed in between the
    /// call fails with [`SessionError::PrefixConflict`] and nothing changes.
    async fn replace_prefix(
        &self,
        session_id: &str,
        expected_compactions: u64,
        prefix_len: usize,
        summary: Message,
    ) -> Result<(), SessionError>;

    /// Update lifecycle state.
    async fn set_status(&self, session_id: &str, status: SessionStatus)
    -> Result<(), SessionError>;
}
