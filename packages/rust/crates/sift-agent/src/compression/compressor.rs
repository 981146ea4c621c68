//! History compressor. Replaces everything before the last `keep_recent`
//! messages with a single summary message once the history exceeds its budget.

use std::sync::Arc;
use std::time::Duration;

use crate::observability::SessionEvent;
use crate::session::{Message, total_tokens};

use super::summarizer::{Summarizer, SummarizerError};

/// Default context budget in tokens.
pub const DEFAULT_TOKEN_BUDGET: usize = 4_096;
/// Default count of raw messages never summarized.
pub const DEFAULT_KEEP_RECENT: usize = 6;
/// Default budget for one summarizer call.
pub const DEFAULT_SUMMARIZER_TIMEOUT_MS: u64 = 30_000;

/// Compression thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressionConfig {
    /// Token budget for the whole history.
    pub token_budget: usize,
    /// Most recent messages kept verbatim.
    pub keep_recent: usize,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            token_budget: DEFAULT_TOKEN_BUDGET,
            keep_recent: DEFAULT_KEEP_RECENT,
        }
    }
}

/// What one `compress` call did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompressionStatus {
    /// History already fits.
    Unchanged,
    /// Prefix replaced by a summary.
    Compressed {
        /// Messages folded into the summary (including a previous summary).
        replaced: usize,
        /// History tokens before.
        tokens_before: usize,
        /// History tokens after.
        tokens_after: usize,
    },
    /// Over budget but nothing left to fold; history unchanged.
    OverBudget {
        /// History tokens.
        tokens: usize,
        /// Budget.
        budget: usize,
    },
    /// Summarizer failed; history unchanged.
    Failed {
        /// Failure description.
        reason: String,
    },
}

/// Compressed history plus status.
#[derive(Debug, Clone, PartialEq)]
pub struct Compression {
    /// Resulting history.
    pub messages: Vec<Message>,
    /// Outcome.
    pub status: CompressionStatus,
    /// Length of the original prefix the summary replaces (0 when unchanged).
    pub replaced_prefix: usize,
}

impl Compression {
    pub(crate) fn unchanged(messages: &[Message], status: CompressionStatus) -> Self {
        Self {
            messages: messages.to_vec(),
            status,
            replaced_prefix: 0,
        }
    }

    /// True when a prefix was summarized.
    #[must_use]
    pub fn is_compressed(&self) -> bool {
        matches!(self.status, CompressionStatus::Compressed { .. })
    }

    /// The new summary message, when a prefix was summarized.
    #[must_use]
    pub fn summary(&self) -> Option<&Message> {
        if self.is_compressed() {
            self.messages.first()
        } else {
            None
        }
    }

    /// True when the resulting history still exceeds `budget`.
    #[must_use]
    pub fn over_budget(&self, budget: usize) -> bool {
        total_tokens(&self.messages) > budget
    }
}

/// Summarizing history compressor.
#[derive(Clone)]
pub struct ContextCompressor {
    summarizer: Arc<dyn Summarizer>,
    timeout: Duration,
}

impl ContextCompressor {
    /// Compressor using `summarizer`.
    #[must_use]
    pub fn new(summarizer: Arc<dyn Summarizer>) -> Self {
        Self {
            summarizer,
            timeout: Duration::from_millis(DEFAULT_SUMMARIZER_TIMEOUT_MS),
        }
    }

    /// Bound each summarizer call.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Fit `messages` into `token_budget`, keeping the last `keep_recent`
    /// messages verbatim.
    ///
    /// A history that already starts with a summary and has nothing older
    /// than `keep_recent` left to fold is returned unchanged, so applying
    /// compression twice gives the same result as applying it once. A
    /// previous summary is folded into the new one rather than stacked.
    pub async fn compress(
        &self,
        messages: &[Message],
        token_budget: usize,
        keep_recent: usize,
    ) -> Compression {
        let tokens_before = total_tokens(messages);
        if tokens_before <= token_budget {
            tracing::debug!(
                event = SessionEvent::CompressionSkipped.as_str(),
                tokens = tokens_before,
                budget = token_budget,
                "history within budget"
            );
            return Compression::unchanged(messages, CompressionStatus::Unchanged);
        }

        let already_folded =
            messages.first().is_some_and(Message::is_summary) && messages.len() <= keep_recent + 1;
        if messages.len() <= keep_recent || already_folded {
            tracing::warn!(
                event = SessionEvent::CompressionOverBudget.as_str(),
                tokens = tokens_before,
                budget = token_budget,
                messages = messages.len(),
                keep_recent,
                "history over budget with nothing left to summarize"
            );
            return Compression::unchanged(
                messages,
                CompressionStatus::OverBudget {
                    tokens: tokens_before,
                    budget: token_budget,
                },
            );
        }

        let split = messages.len() - keep_recent;
        let (old, recent) = messages.split_at(split);
        let (previous_summary, to_fold) = match old.split_first() {
            Some((first, rest)) if first.is_summary() => (Some(first.content.as_str()), rest),
            _ => (None, old),
        };

        let summary = match tokio::time::timeout(
            self.timeout,
            self.summarizer.summarize(previous_summary, to_fold),
        )
        .await
        {
            Ok(Ok(text)) => text,
            Ok(Err(error)) => return summarizer_failed(messages, &error),
            Err(_) => {
                let millis = u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX);
                return summarizer_failed(messages, &SummarizerError::Timeout(millis));
            }
        };

        let mut compressed = Vec::with_capacity(recent.len() + 1);
        compressed.push(Message::summary(summary));
        compressed.extend_from_slice(recent);
        let tokens_after = total_tokens(&compressed);

        tracing::info!(
            event = SessionEvent::CompressionApplied.as_str(),
            replaced = split,
            kept = recent.len(),
            tokens_before,
            tokens_after,
            budget = token_budget,
            "history prefix summarized"
        );
        if tokens_after > token_budget {
            tracing::warn!(
                event = SessionEvent::CompressionOverBudget.as_str(),
                tokens = tokens_after,
                budget = token_budget,
                "history still over budget after summarization"
            );
        }

        Compression {
            messages: compressed,
            status: CompressionStatus::Compressed {
                replaced: split,
                tokens_before,
                tokens_after,
            },
            replaced_prefix: split,
        }
    }
}

fn summarizer_failed(messages: &[Message], error: &SummarizerError) -> Compression {
    tracing::warn!(
        event = SessionEvent::CompressionSummarizerFailed.as_str(),
        error = %error,
        messages = messages.len(),
        "summarizer failed; continuing with uncompressed history"
    );
    Compression::unchanged(
        messages,
        CompressionStatus::Failed {
            reason: error.to_string(),
        },
    )
}
