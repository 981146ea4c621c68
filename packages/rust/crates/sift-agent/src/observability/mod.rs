//! Structured event ids shared by every `tracing` call in the crate.

mod session_events;

pub use session_events::SessionEvent;
