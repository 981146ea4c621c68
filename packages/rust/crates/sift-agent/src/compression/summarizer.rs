use std::fmt::Write as _;

use async_trait::async_trait;
use thiserror::Error;

use crate::llm::{ChatMessage, LlmClient};
use crate::session::Message;

/// Tokens kept per message when building the summarization prompt.
const MESSAGE_TOKEN_LIMIT: usize = 1_024;

const SUMMARY_INSTRUCTIONS: &str = "You compress conversation history for a retrieval assistant. \
Write a concise summary of the conversation below that keeps user goals, facts established, \
documents cited and open questions. Write plain prose, no preamble.";

/// Summarization failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SummarizerError {
    /// Model endpoint unreachable or returned an error.
    #[error("summarizer unavailable: {0}")]
    Unavailable(String),
    /// Model returned nothing usable.
    #[error("summarizer returned an empty summary")]
    Empty,
    /// Summarizer exceeded its budget.
    #[error("summarizer timed out after {0}ms")]
    Timeout(u64),
}

/// Produces the text of a summary message.
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Summarize `messages`, extending `previous_summary` when one exists.
    async fn summarize(
        &self,
        previous_summary: Option<&str>,
        messages: &[Message],
    ) -> Result<String, SummarizerError>;
}

/// Summarizer backed by the chat-completions endpoint.
#[derive(Debug, Clone)]
pub struct LlmSummarizer {
    client: LlmClient,
}

impl LlmSummarizer {
    /// Wrap a chat client.
    #[must_use]
    pub fn new(client: LlmClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Summarizer for LlmSummarizer {
    async fn summarize(
        &self,
        previous_summary: Option<&str>,
        messages: &[Message],
    ) -> Result<String, SummarizerError> {
        let mut transcript = String::new();
        if let Some(previous) = previous_summary {
            let _ = writeln!(transcript, "Earlier summary:\n{previous}\n");
        }
        transcript.push_str("Conversation:\n");
        for message in messages {
            let content = sift_tokenizer::truncate(&message.content, MESSAGE_TOKEN_LIMIT);
            let _ = writeln!(transcript, "{}: {content}", message.role.as_str());
        }
        let request = [
            ChatMessage::system(SUMMARY_INSTRUCTIONS),
            ChatMessage::user(transcript),
        ];
        let summary = self
            .client
            .chat(&request, false)
            .await
            .map_err(|error| SummarizerError::Unavailable(error.to_string()))?;
        let summary = summary.trim();
        if summary.is_empty() {
            return Err(SummarizerError::Empty);
        }
        Ok(summary.to_string())
    }
}
