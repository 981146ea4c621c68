//! Reasoning namespace: thinker contract, the bounded THINK/ACT/OBSERVE loop,
//! and the LLM-backed thinker.

mod decision;
mod llm_thinker;
mod prompt;
mod reasoning_loop;
mod thinker;

pub use decision::{ThinkerAction, ThinkerDecision};
pub use llm_thinker::LlmThinker;
pub use prompt::{CORRECTIVE_HINT, build_thinker_messages};
pub use reasoning_loop::{
    DEFAULT_MAX_ITERATIONS, DEFAULT_THINKER_TIMEOUT_MS, DEFAULT_TOOL_TIMEOUT_MS, LoopOutcome,
    ReasoningConfig, ReasoningLoop,
};
pub use thinker::{ThinkContext, Thinker, ThinkerError};
