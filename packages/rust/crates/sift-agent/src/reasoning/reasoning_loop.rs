//! Bounded THINK -> ACT -> OBSERVE loop ending in exactly one ANSWER.

use std::sync::Arc;
use std::time::{Duration, Instant};

use sift_retrieval::{RequestDeadline, RetrievalTier};

use crate::observability::SessionEvent;
use crate::session::{AbortReason, Message, ReasoningTrace};
use crate::tools::{ToolDescriptor, ToolRegistry};

use super::decision::{ThinkerAction, ThinkerDecision};
use super::prompt::CORRECTIVE_HINT;
use super::thinker::{ThinkContext, Thinker, ThinkerError};

/// Default iteration bound.
pub const DEFAULT_MAX_ITERATIONS: usize = 5;
/// Default per-tool budget.
pub const DEFAULT_TOOL_TIMEOUT_MS: u64 = 5_000;
/// Default per-decision thinker budget.
pub const DEFAULT_THINKER_TIMEOUT_MS: u64 = 30_000;

const NO_OBSERVATION_ANSWER: &str =
    "I could not reach an answer with the information available.";

/// Loop bounds and budgets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReasoningConfig {
    /// THINK iterations before the answer is forced.
    pub max_iterations: usize,
    /// Budget for one tool call.
    pub tool_timeout_ms: u64,
    /// Budget for one thinker decision.
    pub thinker_timeout_ms: u64,
}

impl Default for ReasoningConfig {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            tool_timeout_ms: DEFAULT_TOOL_TIMEOUT_MS,
            thinker_timeout_ms: DEFAULT_THINKER_TIMEOUT_MS,
        }
    }
}

impl ReasoningConfig {
    /// Tool budget as a [`Duration`].
    #[must_use]
    pub fn tool_timeout(&self) -> Duration {
        Duration::from_millis(self.tool_timeout_ms)
    }

    /// Thinker budget as a [`Duration`].
    #[must_use]
    pub fn thinker_timeout(&self) -> Duration {
        Duration::from_millis(self.thinker_timeout_ms)
    }
}

/// Result of one loop run. The trace always ends with its single ANSWER.
#[derive(Debug, Clone, PartialEq)]
pub struct LoopOutcome {
    /// Final answer (thinker-given or synthesized).
    pub answer: String,
    /// Full trace.
    pub trace: ReasoningTrace,
    /// Retrieval tier of every retrieval-backed observation, in order.
    pub tiers: Vec<RetrievalTier>,
    /// Iterations started.
    pub iterations: usize,
}

impl LoopOutcome {
    /// Iteration limit reached.
    #[must_use]
    pub fn truncated(&self) -> bool {
        self.trace.truncated
    }

    /// Why the loop stopped early, if it did.
    #[must_use]
    pub fn aborted(&self) -> Option<AbortReason> {
        self.trace.aborted
    }

    /// Some observation came from a degraded retrieval.
    #[must_use]
    pub fn degraded(&self) -> bool {
        self.trace.degraded
    }
}

/// Drives a [`Thinker`] against a [`ToolRegistry`].
#[derive(Clone)]
pub struct ReasoningLoop {
    thinker: Arc<dyn Thinker>,
    tools: Arc<ToolRegistry>,
    config: ReasoningConfig,
}

enum Step {
    Continue,
    Answered,
    Abort(AbortReason),
}

impl ReasoningLoop {
    /// Build a loop.
    #[must_use]
    pub fn new(thinker: Arc<dyn Thinker>, tools: Arc<ToolRegistry>, config: ReasoningConfig) -> Self {
        Self {
            thinker,
            tools,
            config,
        }
    }

    /// Loop configuration.
    #[must_use]
    pub fn config(&self) -> &ReasoningConfig {
        &self.config
    }

    /// Run to completion. Never fails: thinker, tool and deadline failures end
    /// the loop with a flagged trace and a synthesized answer.
    pub async fn run(
        &self,
        question: &str,
        history: &[Message],
        deadline: RequestDeadline,
    ) -> LoopOutcome {
        let started = Instant::now();
        let max_iterations = self.config.max_iterations.max(1);
        let catalog = self.tools.catalog();
        let mut trace = ReasoningTrace::new();
        let mut tiers = Vec::new();
        let mut iterations = 0;
        let mut answered = false;

        tracing::info!(
            event = SessionEvent::ReasoningLoopStarted.as_str(),
            max_iterations,
            tools = catalog.len(),
            history = history.len(),
            "reasoning loop started"
        );

        for iteration in 0..max_iterations {
            if deadline.is_expired() {
                tracing::warn!(
                    event = SessionEvent::ReasoningDeadlineExceeded.as_str(),
                    iteration,
                    "request deadline expired; stopping at step boundary"
                );
                trace.aborted = Some(AbortReason::DeadlineExceeded);
                break;
            }
            iterations += 1;
            let context = LoopContext {
                question,
                history,
                catalog: &catalog,
                iteration,
                max_iterations,
                deadline,
            };
            match self.iterate(&context, &mut trace, &mut tiers).await {
                Step::Continue => {}
                Step::Answered => {
                    answered = true;
                    break;
                }
                Step::Abort(reason) => {
                    trace.aborted = Some(reason);
                    break;
                }
            }
        }

        let answer = if answered {
            trace.answer().unwrap_or_default().to_string()
        } else {
            if trace.aborted.is_none() {
                trace.truncated = true;
            }
            let answer = synthesize_answer(&trace);
            trace.push_answer(answer.clone());
            answer
        };

        let elapsed_ms = started.elapsed().as_millis();
        if let Some(reason) = trace.aborted {
            tracing::warn!(
                event = SessionEvent::ReasoningAborted.as_str(),
                reason = reason.as_str(),
                steps = trace.len(),
                elapsed_ms,
                "reasoning loop aborted; answer synthesized"
            );
        } else if trace.truncated {
            tracing::warn!(
                event = SessionEvent::ReasoningTruncated.as_str(),
                iterations,
                steps = trace.len(),
                elapsed_ms,
                "iteration limit reached; answer synthesized"
            );
        } else {
            tracing::info!(
                event = SessionEvent::ReasoningAnswered.as_str(),
                iterations,
                steps = trace.len(),
                degraded = trace.degraded,
                elapsed_ms,
                "reasoning loop answered"
            );
        }

        LoopOutcome {
            answer,
            trace,
            tiers,
            iterations,
        }
    }

    async fn iterate(
        &self,
        context: &LoopContext<'_>,
        trace: &mut ReasoningTrace,
        tiers: &mut Vec<RetrievalTier>,
    ) -> Step {
        let decision = match self.decide(context, trace, None).await {
            Ok(decision) => decision,
            Err(ThinkerError::Protocol(reason)) => {
                trace.push_think(format!("thinker output rejected: {reason}"));
                tracing::warn!(
                    event = SessionEvent::ReasoningProtocolRetry.as_str(),
                    iteration = context.iteration,
                    reason = %reason,
                    "malformed thinker output; retrying with corrective hint"
                );
                match self.decide(context, trace, Some(CORRECTIVE_HINT)).await {
                    Ok(decision) => decision,
                    Err(error) => return fail_think(context, trace, &error),
                }
            }
            Err(error) => return fail_think(context, trace, &error),
        };

        let ThinkerDecision { reasoning, action } = decision;
        tracing::debug!(
            event = SessionEvent::ReasoningThinkCompleted.as_str(),
            iteration = context.iteration,
            action = match &action {
                ThinkerAction::Tool { .. } => "tool",
                ThinkerAction::Answer { .. } => "answer",
            },
            "thinker decided"
        );
        trace.push_think(if reasoning.is_empty() {
            "(no reasoning given)".to_string()
        } else {
            reasoning
        });

        match action {
            ThinkerAction::Answer { response } => {
                trace.push_answer(response);
                Step::Answered
            }
            ThinkerAction::Tool { name, args } => {
                trace.push_act(&name, args.clone());
                match self.tools.call(&name, args, context.deadline).await {
                    Ok(output) => {
                        if output.degraded {
                            trace.degraded = true;
                        }
                        if let Some(tier) = output.tier {
                            tiers.push(tier);
                        }
                        let rendered = output.render();
                        trace.push_observe(&name, rendered, Some(output.content));
                        Step::Continue
                    }
                    Err(error) => {
                        trace.push_observe(&name, format!("error: {error}"), None);
                        if error.is_fatal() {
                            Step::Abort(AbortReason::FatalToolError)
                        } else {
                            Step::Continue
                        }
                    }
                }
            }
        }
    }

    async fn decide(
        &self,
        context: &LoopContext<'_>,
        trace: &ReasoningTrace,
        corrective_hint: Option<&str>,
    ) -> Result<ThinkerDecision, ThinkerError> {
        let think = ThinkContext {
            question: context.question,
            history: context.history,
            catalog: context.catalog,
            trace,
            iteration: context.iteration,
            max_iterations: context.max_iterations,
            corrective_hint,
        };
        let budget = context.deadline.clamp(self.config.thinker_timeout());
        match tokio::time::timeout(budget, self.thinker.decide(&think)).await {
            Ok(result) => result,
            Err(_) => Err(ThinkerError::Timeout(budget)),
        }
    }
}

struct LoopContext<'a> {
    question: &'a str,
    history: &'a [Message],
    catalog: &'a [ToolDescriptor],
    iteration: usize,
    max_iterations: usize,
    deadline: RequestDeadline,
}

fn fail_think(context: &LoopContext<'_>, trace: &mut ReasoningTrace, error: &ThinkerError) -> Step {
    trace.push_think(format!("thinker failed: {error}"));
    let reason = match error {
        ThinkerError::Protocol(_) => AbortReason::ThinkerProtocol,
        ThinkerError::Unavailable(_) => AbortReason::ThinkerUnavailable,
        ThinkerError::Timeout(_) if context.deadline.is_expired() => AbortReason::DeadlineExceeded,
        ThinkerError::Timeout(_) => AbortReason::ThinkerTimeout,
    };
    tracing::warn!(
        event = SessionEvent::ReasoningThinkerFailed.as_str(),
        iteration = context.iteration,
        reason = reason.as_str(),
        error = %error,
        "thinker failed"
    );
    Step::Abort(reason)
}

/// Best-effort answer from the last successful observation.
fn synthesize_answer(trace: &ReasoningTrace) -> String {
    match trace.last_successful_observation() {
        Some(step) => format!(
            "I could not finish reasoning about this. The most relevant information found was:\n{}",
            step.content
        ),
        None => NO_OBSERVATION_ANSWER.to_string(),
    }
}
