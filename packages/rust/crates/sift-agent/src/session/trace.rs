//! Reasoning trace: the append-only THINK / ACT / OBSERVE / ANSWER log of one loop run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Step kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StepType {
    /// Thinker decision.
    Think,
    /// Tool dispatch.
    Act,
    /// Tool result or tool error.
    Observe,
    /// Final answer.
    Answer,
}

/// One trace entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReasoningStep {
    /// Step kind.
    #[serde(rename = "type")]
    pub step_type: StepType,
    /// Human-readable content.
    pub content: String,
    /// Tool name on ACT / OBSERVE.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,
    /// Tool arguments on ACT.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_args: Option<Value>,
    /// Structured tool result on a successful OBSERVE.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_result: Option<Value>,
    /// Creation time.
    pub timestamp: DateTime<Utc>,
}

impl ReasoningStep {
    fn new(step_type: StepType, content: impl Into<String>) -> Self {
        Self {
            step_type,
            content: content.into(),
            tool_name: None,
            tool_args: None,
            tool_result: None,
            timestamp: Utc::now(),
        }
    }
}

/// Why a loop stopped before the thinker answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbortReason {
    /// Thinker produced malformed output twice in a row.
    ThinkerProtocol,
    /// Thinker could not be reached.
    ThinkerUnavailable,
    /// Thinker exceeded its budget.
    ThinkerTimeout,
    /// A tool reported an unrecoverable failure.
    FatalToolError,
    /// The request deadline expired mid-loop.
    DeadlineExceeded,
}

impl AbortReason {
    /// Stable label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ThinkerProtocol => "thinker_protocol",
            Self::ThinkerUnavailable => "thinker_unavailable",
            Self::ThinkerTimeout => "thinker_timeout",
            Self::FatalToolError => "fatal_tool_error",
            Self::DeadlineExceeded => "deadline_exceeded",
        }
    }
}

/// Ordered steps of one loop run plus its termination flags.
///
/// Steps can only be appended. A finished trace holds exactly one ANSWER,
/// which is always the last step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReasoningTrace {
    steps: Vec<ReasoningStep>,
    /// Iteration limit reached; the answer was synthesized.
    #[serde(default)]
    pub truncated: bool,
    /// Loop stopped early; the answer was synthesized.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aborted: Option<AbortReason>,
    /// Some observation came from a degraded retrieval.
    #[serde(default)]
    pub degraded: bool,
}

impl ReasoningTrace {
    /// Empty trace.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Steps in creation order.
    #[must_use]
    pub fn steps(&self) -> &[ReasoningStep] {
        &self.steps
    }

    /// Step count.
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// True before the first step.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Step kinds in order.
    #[must_use]
    pub fn step_types(&self) -> Vec<StepType> {
        self.steps.iter().map(|step| step.step_type).collect()
    }

    /// Number of steps of `kind`.
    #[must_use]
    pub fn count(&self, kind: StepType) -> usize {
        self.steps.iter().filter(|step| step.step_type == kind).count()
    }

    /// Final answer text, once recorded.
    #[must_use]
    pub fn answer(&self) -> Option<&str> {
        self.steps
            .iter()
            .rev()
            .find(|step| step.step_type == StepType::Answer)
            .map(|step| step.content.as_str())
    }

    /// Most recent OBSERVE that carries a tool result (not an error).
    #[must_use]
    pub fn last_successful_observation(&self) -> Option<&ReasoningStep> {
        self.steps
            .iter()
            .rev()
            .find(|step| step.step_type == StepType::Observe && step.tool_result.is_some())
    }

    /// True when the loop ended without the thinker answering.
    #[must_use]
    pub fn is_partial(&self) -> bool {
        self.truncated || self.aborted.is_some()
    }

    pub(crate) fn push_think(&mut self, content: impl Into<String>) {
        self.steps.push(ReasoningStep::new(StepType::Think, content));
    }

    pub(crate) fn push_act(&mut self, tool_name: &str, tool_args: Value) {
        let mut step = ReasoningStep::new(StepType::Act, format!("call {tool_name}"));
        step.tool_name = Some(tool_name.to_string());
        step.tool_args = Some(tool_args);
        self.steps.push(step);
    }

    pub(crate) fn push_observe(
        &mut self,
        tool_name: &str,
        content: impl Into<String>,
        tool_result: Option<Value>,
    ) {
        let mut step = ReasoningStep::new(StepType::Observe, content);
        step.tool_name = Some(tool_name.to_string());
        step.tool_result = tool_result;
        self.steps.push(step);
    }

    /// Record the answer. A second answer is ignored so the trace keeps exactly one.
    pub(crate) fn push_answer(&mut self, content: impl Into<String>) -> bool {
        if self.count(StepType::Answer) > 0 {
            return false;
        }
        self.steps.push(ReasoningStep::new(StepType::Answer, content));
        true
    }
}
