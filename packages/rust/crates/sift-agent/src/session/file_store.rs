//! JSON-lines session store: one append-only `<session_id>.jsonl` log per session.
//!
//! Line 1 is a header record; later lines are messages or status changes.
//! Prefix replacement rewrites the whole log atomically (temp file, fsync, rename).

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::observability::SessionEvent;

use super::error::SessionError;
use super::message::Message;
use super::store::{Session, SessionStatus, SessionStore, new_session_id};

const LOG_EXTENSION: &str = "jsonl";
const MAX_SESSION_ID_LEN: usize = 128;

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum Record {
    Header {
        id: String,
        created_at: DateTime<Utc>,
        status: SessionStatus,
        #[serde(default)]
        compactions: u64,
    },
    Message(Box<Message>),
    Status {
        status: SessionStatus,
    },
}

/// Directory-backed store.
#[derive(Clone)]
pub struct FileSessionStore {
    dir: PathBuf,
    locks: Arc<Mutex<HashMap<String, Arc<Mutex<()>>>>>,
}

impl FileSessionStore {
    /// Open (and create) the store directory.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Unavailable`] when the directory cannot be created.
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self, SessionError> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|error| io_unavailable(&dir, &error))?;
        tracing::debug!(
            event = SessionEvent::SessionStoreLoaded.as_str(),
            dir = %dir.display(),
            backend = "jsonl",
            "session store opened"
        );
        Ok(Self {
            dir,
            locks: Arc::new(Mutex::new(HashMap::new())),
        })
    }

    /// Store directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn log_path(&self, session_id: &str) -> Result<PathBuf, SessionError> {
        validate_session_id(session_id)?;
        Ok(self.dir.join(format!("{session_id}.{LOG_EXTENSION}")))
    }

    /// Lock for a session whose log already exists. Unknown ids fail with
    /// [`SessionError::NotFound`] without leaving an entry in the lock map.
    async fn session_lock(&self, session_id: &str) -> Result<Arc<Mutex<()>>, SessionError> {
        let path = self.log_path(session_id)?;
        let mut locks = self.locks.lock().await;
        if let Some(lock) = locks.get(session_id) {
            return Ok(lock.clone());
        }
        match tokio::fs::try_exists(&path).await {
            Ok(true) => Ok(locks.entry(session_id.to_string()).or_default().clone()),
            Ok(false) => Err(SessionError::NotFound(session_id.to_string())),
            Err(error) => Err(io_unavailable(&path, &error)),
        }
    }

    async fn append_record(&self, session_id: &str, record: &Record) -> Result<(), SessionError> {
        let path = self.log_path(session_id)?;
        let mut line = encode(session_id, record)?;
        line.push('\n');
        let mut file = match tokio::fs::OpenOptions::new().append(true).open(&path).await {
            Ok(file) => file,
            Err(error) if error.kind() == ErrorKind::NotFound => {
                return Err(SessionError::NotFound(session_id.to_string()));
            }
            Err(error) => return Err(io_unavailable(&path, &error)),
        };
        file.write_all(line.as_bytes())
            .await
            .map_err(|error| io_unavailable(&path, &error))?;
        file.flush()
            .await
            .map_err(|error| io_unavailable(&path, &error))
    }

    async fn write_header(&self, session_id: &str, path: &Path) -> Result<(), SessionError> {
        let session = Session::new(session_id);
        let mut line = encode(session_id, &header_of(&session))?;
        line.push('\n');
        let mut file = match tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .await
        {
            Ok(file) => file,
            Err(error) if error.kind() == ErrorKind::AlreadyExists => {
                return Err(SessionError::AlreadyExists(session_id.to_string()));
            }
            Err(error) => return Err(io_unavailable(path, &error)),
        };
        file.write_all(line.as_bytes())
            .await
            .map_err(|error| io_unavailable(path, &error))?;
        file.sync_all()
            .await
            .map_err(|error| io_unavailable(path, &error))
    }

    async fn load(&self, session_id: &str) -> Result<Session, SessionError> {
        let path = self.log_path(session_id)?;
        let raw = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(error) if error.kind() == ErrorKind::NotFound => {
                return Err(SessionError::NotFound(session_id.to_string()));
            }
            Err(error) => return Err(io_unavailable(&path, &error)),
        };
        decode_log(session_id, &raw)
    }
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn create(&self, session_id: Option<String>) -> Result<String, SessionError> {
        let id = session_id.unwrap_or_else(new_session_id);
        let path = self.log_path(&id)?;
        let lock = self
            .locks
            .lock()
            .await
            .entry(id.clone())
            .or_default()
            .clone();
        let _guard = lock.lock().await;

        if let Err(error) = self.write_header(&id, &path).await {
            if !matches!(error, SessionError::AlreadyExists(_)) {
                self.locks.lock().await.remove(&id);
            }
            return Err(error);
        }
        tracing::debug!(
            event = SessionEvent::SessionCreated.as_str(),
            session_id = %id,
            backend = "jsonl",
            "session created"
        );
        Ok(id)
    }

    async fn append(&self, session_id: &str, message: Message) -> Result<(), SessionError> {
        let lock = self.session_lock(session_id).await?;
        let _guard = lock.lock().await;
        self.append_record(session_id, &Record::Message(Box::new(message)))
            .await?;
        tracing::debug!(
            event = SessionEvent::SessionMessagesAppended.as_str(),
            session_id,
            backend = "jsonl",
            "session message appended"
        );
        Ok(())
    }

    async fn get(&self, session_id: &str) -> Result<Session, SessionError> {
        let lock = self.session_lock(session_id).await?;
        let _guard = lock.lock().await;
        let session = self.load(session_id).await?;
        tracing::debug!(
            event = SessionEvent::SessionMessagesLoaded.as_str(),
            session_id,
            loaded_messages = session.messages.len(),
            backend = "jsonl",
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
        let lock = self.session_lock(session_id).await?;
        let _guard = lock.lock().await;
        let mut session = self.load(session_id).await?;
        session.replace_prefix(expected_compactions, prefix_len, summary)?;

        let mut content = encode(session_id, &header_of(&session))?;
        content.push('\n');
        for message in &session.messages {
            content.push_str(&encode(
                session_id,
                &Record::Message(Box::new(message.clone())),
            )?);
            content.push('\n');
        }
        let path = self.log_path(session_id)?;
        atomic_write_text(&path, &content)
            .await
            .map_err(|error| io_unavailable(&path, &error))?;
        tracing::debug!(
            event = SessionEvent::SessionPrefixReplaced.as_str(),
            session_id,
            replaced_messages = prefix_len,
            total_messages = session.messages.len(),
            compactions = session.compactions,
            backend = "jsonl",
            "session prefix replaced with summary"
        );
        Ok(())
    }

    async fn set_status(
        &self,
        session_id: &str,
        status: SessionStatus,
    ) -> Result<(), SessionError> {
        let lock = self.session_lock(session_id).await?;
        let _guard = lock.lock().await;
        self.append_record(session_id, &Record::Status { status })
            .await?;
        tracing::debug!(
            event = SessionEvent::SessionStatusChanged.as_str(),
            session_id,
            status = status.as_str(),
            backend = "jsonl",
            "session status changed"
        );
        Ok(())
    }
}

fn header_of(session: &Session) -> Record {
    Record::Header {
        id: session.id.clone(),
        created_at: session.created_at,
        status: session.status,
        compactions: session.compactions,
    }
}

fn encode(session_id: &str, record: &Record) -> Result<String, SessionError> {
    serde_json::to_string(record).map_err(|error| SessionError::Corrupt {
        session_id: session_id.to_string(),
        reason: format!("encode failed: {error}"),
    })
}

fn decode_log(session_id: &str, raw: &str) -> Result<Session, SessionError> {
    let lines: Vec<&str> = raw.lines().filter(|line| !line.trim().is_empty()).collect();
    let corrupt = |reason: String| SessionError::Corrupt {
        session_id: session_id.to_string(),
        reason,
    };

    let mut session: Option<Session> = None;
    for (index, line) in lines.iter().enumerate() {
        let record = match serde_json::from_str::<Record>(line) {
            Ok(record) => record,
            // A crash mid-append can leave a torn final line.
            Err(error) if index + 1 == lines.len() && index > 0 => {
                tracing::warn!(
                    event = SessionEvent::SessionStoreCorrupt.as_str(),
                    session_id,
                    line = index + 1,
                    error = %error,
                    "ignoring torn trailing record in session log"
                );
                break;
            }
            Err(error) => return Err(corrupt(format!("line {}: {error}", index + 1))),
        };
        match record {
            Record::Header {
                id,
                created_at,
                status,
                compactions,
            } => {
                if session.is_some() {
                    return Err(corrupt(format!("line {}: duplicate header", index + 1)));
                }
                session = Some(Session {
                    id,
                    messages: Vec::new(),
                    status,
                    created_at,
                    compactions,
                });
            }
            Record::Message(message) => session
                .as_mut()
                .ok_or_else(|| corrupt("missing header record".to_string()))?
                .messages
                .push(*message),
            Record::Status { status } => {
                session
                    .as_mut()
                    .ok_or_else(|| corrupt("missing header record".to_string()))?
                    .status = status;
            }
        }
    }
    session.ok_or_else(|| corrupt("empty session log".to_string()))
}

fn validate_session_id(session_id: &str) -> Result<(), SessionError> {
    let valid = !session_id.is_empty()
        && session_id.len() <= MAX_SESSION_ID_LEN
        && !session_id.starts_with('.')
        && session_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if valid {
        Ok(())
    } else {
        Err(SessionError::InvalidId(session_id.to_string()))
    }
}

/// Write text atomically: temp file in the same directory, fsync, rename into place.
async fn atomic_write_text(path: &Path, content: &str) -> std::io::Result<()> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .filter(|name| !name.is_empty())
        .unwrap_or("session.jsonl");
    let temp_path = parent.join(format!(".{file_name}.{}.tmp", uuid::Uuid::new_v4()));

    let mut temp_file = tokio::fs::File::create(&temp_path).await?;
    temp_file.write_all(content.as_bytes()).await?;
    temp_file.sync_all().await?;
    drop(temp_file);
    tokio::fs::rename(&temp_path, path).await
}

fn io_unavailable(path: &Path, error: &std::io::Error) -> SessionError {
    SessionError::Unavailable(format!("{}: {error}", path.display()))
}

#[cfg(test)]
#[path = "../../tests/unit/session/file_store.rs"]
mod tests;
