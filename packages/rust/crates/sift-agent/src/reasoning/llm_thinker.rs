//! Thinker backed by an OpenAI-compatible chat-completions endpoint.

use async_trait::async_trait;

use crate::llm::{LlmClient, LlmError};

use super::decision::ThinkerDecision;
use super::prompt::build_thinker_messages;
use super::thinker::{ThinkContext, Thinker, ThinkerError};

/// Thinker that asks the LLM for a JSON decision object.
#[derive(Debug, Clone)]
pub struct LlmThinker {
    client: LlmClient,
}

impl LlmThinker {
    /// Wrap a chat client.
    #[must_use]
    pub fn new(client: LlmClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Thinker for LlmThinker {
    async fn decide(&self, context: &ThinkContext<'_>) -> Result<ThinkerDecision, ThinkerError> {
        let messages = build_thinker_messages(context);
        let raw = self
            .client
            .chat(&messages, true)
            .await
            .map_err(|error| match error {
                LlmError::Malformed(reason) => ThinkerError::Protocol(reason),
                other => ThinkerError::Unavailable(other.to_string()),
            })?;
        ThinkerDecision::parse(&raw)
    }
}
