//! Turn orchestrator: session bookkeeping around compression and the reasoning loop.

use std::sync::Arc;
use std::time::Instant;

use sift_retrieval::{RequestDeadline, RetrievalTier};

use crate::compression::{Compression, CompressionStatus, ContextCompressor, Summarizer};
use crate::config::CoreConfig;
use crate::observability::SessionEvent;
use crate::reasoning::{ReasoningLoop, Thinker};
use crate::session::{AbortReason, Message, ReasoningTrace, Role, SessionError, SessionStore};
use crate::tools::ToolRegistry;

/// Attempts at compress-and-replace before a turn gives up on compression.
/// Each retry starts from a fresh snapshot after a concurrent compaction.
const MAX_COMPRESSION_ATTEMPTS: usize = 3;

/// How a turn ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnStatus {
    /// The thinker answered.
    Answered,
    /// Iteration limit reached; best-effort answer.
    Truncated,
    /// Loop stopped early; best-effort answer.
    Aborted,
}

impl TurnStatus {
    /// Stable label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Answered => "answered",
            Self::Truncated => "truncated",
            Self::Aborted => "aborted",
        }
    }
}

/// Everything the caller learns about one turn.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnOutcome {
    /// Session the turn ran in (created when none was given).
    pub session_id: String,
    /// Answer text.
    pub answer: String,
    /// Reasoning trace, also persisted on the assistant message.
    pub trace: ReasoningTrace,
    /// Termination kind.
    pub status: TurnStatus,
    /// Iteration limit reached.
    pub truncated: bool,
    /// Some retrieval ran below FULL.
    pub degraded: bool,
    /// Early-stop reason.
    pub aborted: Option<AbortReason>,
    /// Tier of every retrieval call, in order.
    pub tiers: Vec<RetrievalTier>,
    /// What compression did before the loop ran.
    pub compression: CompressionStatus,
}

/// One configured agent: store, loop and compressor sharing a [`CoreConfig`].
#[derive(Clone)]
pub struct Engine {
    store: Arc<dyn SessionStore>,
    reasoning: ReasoningLoop,
    compressor: ContextCompressor,
    config: CoreConfig,
}

impl Engine {
    /// Assemble an engine from its collaborators.
    #[must_use]
    pub fn new(
        store: Arc<dyn SessionStore>,
        thinker: Arc<dyn Thinker>,
        tools: Arc<ToolRegistry>,
        summarizer: Arc<dyn Summarizer>,
        config: CoreConfig,
    ) -> Self {
        let reasoning = ReasoningLoop::new(thinker, tools, config.reasoning);
        let compressor =
            ContextCompressor::new(summarizer).with_timeout(config.reasoning.thinker_timeout());
        Self {
            store,
            reasoning,
            compressor,
            config,
        }
    }

    /// Session store.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    /// Resolved configuration.
    #[must_use]
    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    /// Compressor configured for this engine.
    #[must_use]
    pub fn compressor(&self) -> &ContextCompressor {
        &self.compressor
    }

    /// Run one user turn.
    ///
    /// Creates the session when `session_id` is `None` or unknown, appends
    /// the user message, compresses the history, runs the reasoning loop and
    /// appends the assistant answer with its trace.
    ///
    /// # Errors
    ///
    /// Only session-store failures. Degraded retrieval, thinker failures,
    /// truncation and compression failures are reported on [`TurnOutcome`].
    pub async fn run_turn(
        &self,
        session_id: Option<&str>,
        user_text: &str,
    ) -> Result<TurnOutcome, SessionError> {
        let started = Instant::now();
        let deadline = self
            .config
            .request_deadline()
            .map_or_else(RequestDeadline::none, RequestDeadline::after);
        let session_id = self.ensure_session(session_id).await?;

        self.store.append(&session_id, Message::user(user_text)).await?;
        let compression = self.compress_session(&session_id).await?;

        // Everything from this turn's question on is either the question itself
        // or belongs to a concurrent turn on the same session.
        let mut history = compression.messages;
        if let Some(position) = history
            .iter()
            .rposition(|message| message.role == Role::User && message.content == user_text)
        {
            history.truncate(position);
        }

        let outcome = self.reasoning.run(user_text, &history, deadline).await;
        self.store
            .append(
                &session_id,
                Message::assistant(outcome.answer.clone(), Some(outcome.trace.clone())),
            )
            .await?;

        let status = if outcome.aborted().is_some() {
            TurnStatus::Aborted
        } else if outcome.truncated() {
            TurnStatus::Truncated
        } else {
            TurnStatus::Answered
        };
        tracing::info!(
            event = SessionEvent::SessionTurnCompleted.as_str(),
            session_id = %session_id,
            status = status.as_str(),
            steps = outcome.trace.len(),
            degraded = outcome.degraded(),
            elapsed_ms = started.elapsed().as_millis(),
            "turn completed"
        );

        Ok(TurnOutcome {
            session_id,
            status,
            truncated: outcome.truncated(),
            degraded: outcome.degraded(),
            aborted: outcome.aborted(),
            answer: outcome.answer,
            trace: outcome.trace,
            tiers: outcome.tiers,
            compression: compression.status,
        })
    }

    /// Compress a stored session and persist the summary when a prefix was folded.
    ///
    /// # Errors
    ///
    /// Session-store failures while reading or rewriting the session.
    pub async fn compress_stored(&self, session_id: &str) -> Result<Compression, SessionError> {
        self.compress_session(session_id).await
    }

    /// Snapshot, summarize, then replace the prefix only if no other compaction
    /// landed in between. A conflicting replacement restarts from a fresh snapshot.
    async fn compress_session(&self, session_id: &str) -> Result<Compression, SessionError> {
        let context = self.config.context;
        for attempt in 1..=MAX_COMPRESSION_ATTEMPTS {
            let session = self.store.get(session_id).await?;
            let compression = self
                .compressor
                .compress(&session.messages, context.token_budget, context.keep_recent)
                .await;
            let Some(summary) = compression.summary() else {
                return Ok(compression);
            };
            match self
                .store
                .replace_prefix(
                    session_id,
                    session.compactions,
                    compression.replaced_prefix,
                    summary.clone(),
                )
                .await
            {
                Ok(()) => return Ok(compression),
                Err(SessionError::PrefixConflict {
                    expected, actual, ..
                }) => {
                    tracing::warn!(
                        event = SessionEvent::CompressionPrefixConflict.as_str(),
                        session_id,
                        attempt,
                        expected_compactions = expected,
                        actual_compactions = actual,
                        "session prefix changed during compression; retrying from a fresh snapshot"
                    );
                }
                Err(error) => return Err(error),
            }
        }

        let session = self.store.get(session_id).await?;
        Ok(Compression::unchanged(
            &session.messages,
            CompressionStatus::Failed {
                reason: format!(
                    "session prefix changed concurrently {MAX_COMPRESSION_ATTEMPTS} times"
                ),
            },
        ))
    }

    async fn ensure_session(&self, session_id: Option<&str>) -> Result<String, SessionError> {
        let Some(session_id) = session_id else {
            return self.store.create(None).await;
        };
        match self.store.get(session_id).await {
            Ok(_) => Ok(session_id.to_string()),
            Err(SessionError::NotFound(_)) => {
                match self.store.create(Some(session_id.to_string())).await {
                    Ok(id) | Err(SessionError::AlreadyExists(id)) => Ok(id),
                    Err(error) => Err(error),
                }
            }
            Err(error) => Err(error),
        }
    }
}
