use thiserror::Error;

/// Session store failure. These are the only errors a turn propagates to its caller.
#[derive(Error, Debug)]
pub enum SessionError {
    /// No session with this id.
    #[error("session not found: {0}")]
    NotFound(String),

    /// `create` was given an id that is already in use.
    #[error("session already exists: {0}")]
    AlreadyExists(String),

    /// Session id cannot be used by this backend.
    #[error("invalid session id {0:?}")]
    InvalidId(String),

    /// `replace_prefix` asked for more messages than the session holds.
    #[error("cannot replace {prefix_len} messages of session {session_id}: only {available} stored")]
    InvalidPrefix {
        /// Session id.
        session_id: String,
        /// Requested prefix length.
        prefix_len: usize,
        /// Messages currently stored.
        available: usize,
    },

    /// `replace_prefix` was built from a snapshot whose prefix has since been replaced.
    #[error("session {session_id} prefix changed: expected compaction {expected}, found {actual}")]
    PrefixConflict {
        /// Session id.
        session_id: String,
        /// Compaction count the caller saw.
        expected: u64,
        /// Compaction count in the store.
        actual: u64,
    },

    /// Persistence engine unreachable or I/O failed.
    #[error("session store unavailable: {0}")]
    Unavailable(String),

    /// Stored data could not be decoded.
    #[error("session {session_id} is corrupt: {reason}")]
    Corrupt {
        /// Session id.
        session_id: String,
        /// Decoder message.
        reason: String,
    },
}
