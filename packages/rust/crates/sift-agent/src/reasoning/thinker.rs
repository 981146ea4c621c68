use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::session::{Message, ReasoningTrace};
use crate::tools::ToolDescriptor;

use super::decision::ThinkerDecision;

/// Thinker failure.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ThinkerError {
    /// Output did not follow the decision contract.
    #[error("thinker protocol error: {0}")]
    Protocol(String),
    /// Thinker could not be reached.
    #[error("thinker unavailable: {0}")]
    Unavailable(String),
    /// Thinker exceeded its budget.
    #[error("thinker timed out after {}ms", .0.as_millis())]
    Timeout(Duration),
}

/// Everything the thinker sees for one decision.
#[derive(Debug, Clone, Copy)]
pub struct ThinkContext<'a> {
    /// Current user question.
    pub question: &'a str,
    /// Prior conversation (possibly starting with a summary).
    pub history: &'a [Message],
    /// Tools the thinker may call.
    pub catalog: &'a [ToolDescriptor],
    /// Steps taken so far in this loop.
    pub trace: &'a ReasoningTrace,
    /// 0-based iteration.
    pub iteration: usize,
    /// Iteration bound.
    pub max_iterations: usize,
    /// Set on the retry after a protocol error.
    pub corrective_hint: Option<&'a str>,
}

impl ThinkContext<'_> {
    /// True on the final iteration.
    #[must_use]
    pub fn is_last_iteration(&self) -> bool {
        self.iteration + 1 >= self.max_iterations
    }

    /// Catalog entry for `name`.
    #[must_use]
    pub fn tool(&self, name: &str) -> Option<&ToolDescriptor> {
        self.catalog.iter().find(|tool| tool.name == name)
    }
}

/// The LLM "thinker": picks the next action.
#[async_trait]
pub trait Thinker: Send + Sync {
    /// Decide the next step.
    async fn decide(&self, context: &ThinkContext<'_>) -> Result<ThinkerDecision, ThinkerError>;
}
