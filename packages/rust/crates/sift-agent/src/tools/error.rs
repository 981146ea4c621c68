use std::time::Duration;

use thiserror::Error;

/// Tool lookup, validation or execution failure.
///
/// Inside the reasoning loop every variant except [`ToolError::Fatal`] becomes
/// an OBSERVE step the thinker can react to.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ToolError {
    /// No tool registered under this name.
    #[error("tool not found: {0}")]
    NotFound(String),

    /// Arguments failed schema validation.
    #[error("invalid arguments for {tool}: {reason}")]
    InvalidArgs {
        /// Tool name.
        tool: String,
        /// Validation errors.
        reason: String,
    },

    /// Tool exceeded its budget.
    #[error("tool {tool} timed out after {}ms", budget.as_millis())]
    Timeout {
        /// Tool name.
        tool: String,
        /// Budget that was exceeded.
        budget: Duration,
    },

    /// Tool ran and failed.
    #[error("tool {tool} failed: {reason}")]
    Failed {
        /// Tool name.
        tool: String,
        /// Failure message.
        reason: String,
    },

    /// Unrecoverable failure; the loop stops.
    #[error("tool {tool} failed fatally: {reason}")]
    Fatal {
        /// Tool name.
        tool: String,
        /// Failure message.
        reason: String,
    },

    /// Registration rejected (duplicate name or unusable schema).
    #[error("cannot register tool {tool}: {reason}")]
    Registration {
        /// Tool name.
        tool: String,
        /// Reason.
        reason: String,
    },
}

impl ToolError {
    /// True for failures that stop the loop.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::Fatal { .. })
    }
}
