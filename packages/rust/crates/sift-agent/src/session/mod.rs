//! Session namespace: message and trace model, store contract and backends.

mod error;
mod file_store;
mod memory_store;
mod message;
mod store;
mod trace;

pub use error::SessionError;
pub use file_store::FileSessionStore;
pub use memory_store::MemorySessionStore;
pub use message::{MESSAGE_OVERHEAD_TOKENS, Message, Role, SUMMARY_MESSAGE_NAME, total_tokens};
pub use store::{Session, SessionStatus, SessionStore, new_session_id};
pub use trace::{AbortReason, ReasoningStep, ReasoningTrace, StepType};
