//! Conversation messages.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::trace::ReasoningTrace;

/// `name` marker carried by compression summaries.
pub const SUMMARY_MESSAGE_NAME: &str = "session.summary.segment";

/// Per-message framing cost added on top of the content tokens.
pub const MESSAGE_OVERHEAD_TOKENS: usize = 4;

/// Message author.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// End user.
    User,
    /// Agent answer.
    Assistant,
    /// Tool output.
    Tool,
    /// Synthetic context, used for compression summaries.
    System,
}

impl Role {
    /// Chat-completions role string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::Tool => "tool",
            Self::System => "system",
        }
    }
}

/// One message in a session. `token_count` is fixed when the message is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Author.
    pub role: Role,
    /// Text content.
    pub content: String,
    /// Marker name (summary messages, tool names).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Reasoning trace behind an assistant answer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace: Option<ReasoningTrace>,
    /// Estimated tokens this message occupies in the context window.
    pub token_count: usize,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Build a message and count its tokens.
    #[must_use]
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        let content = content.into();
        let token_count = sift_tokenizer::count_tokens(&content) + MESSAGE_OVERHEAD_TOKENS;
        Self {
            role,
            content,
            name: None,
            trace: None,
            token_count,
            created_at: Utc::now(),
        }
    }

    /// User turn.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Assistant answer carrying its trace.
    #[must_use]
    pub fn assistant(content: impl Into<String>, trace: Option<ReasoningTrace>) -> Self {
        let mut message = Self::new(Role::Assistant, content);
        message.trace = trace;
        message
    }

    /// Tool output attributed to `tool_name`.
    #[must_use]
    pub fn tool(tool_name: impl Into<String>, content: impl Into<String>) -> Self {
        let mut message = Self::new(Role::Tool, content);
        message.name = Some(tool_name.into());
        message
    }

    /// Synthetic summary replacing older messages.
    #[must_use]
    pub fn summary(content: impl Into<String>) -> Self {
        let mut message = Self::new(Role::System, content);
        message.name = Some(SUMMARY_MESSAGE_NAME.to_string());
        message
    }

    /// True for compression summaries.
    #[must_use]
    pub fn is_summary(&self) -> bool {
        self.role == Role::System && self.name.as_deref() == Some(SUMMARY_MESSAGE_NAME)
    }
}

/// Sum of the stored token counts.
#[must_use]
pub fn total_tokens(messages: &[Message]) -> usize {
    messages.iter().map(|message| message.token_count).sum()
}
