//! Sift agent core: a bounded THINK / ACT / OBSERVE reasoning loop over a
//! schema-validated tool registry, with token-budgeted context compression and
//! an append-ordered session store.
//!
//! - [`Engine::run_turn`] drives one user turn: session bookkeeping, compression,
//!   the reasoning loop and persistence of the answer with its trace.
//! - The hybrid retriever from `sift-retrieval` is exposed to the thinker as the
//!   `search_knowledge_base` tool.
//!
//! Logging: every `tracing` event carries an `event` field from [`SessionEvent`].

mod bootstrap;
mod compression;
mod config;
mod engine;
mod llm;
mod observability;
mod reasoning;
mod session;
mod tools;

pub use bootstrap::open_session_store;
pub use compression::{
    Compression, CompressionConfig, CompressionStatus, ContextCompressor, DEFAULT_KEEP_RECENT,
    DEFAULT_SUMMARIZER_TIMEOUT_MS, DEFAULT_TOKEN_BUDGET, LlmSummarizer, Summarizer,
    SummarizerError,
};
pub use config::{
    ContextSettings, CoreConfig, LlmSettings, ReasoningSettings, RetrievalSettings,
    RuntimeSettings, ServiceEndpoints, ServiceSettings, SessionBackend, SessionBackendConfig,
    SessionSettings, load_runtime_settings, load_runtime_settings_from_paths,
    runtime_settings_paths, set_config_home_override,
};
pub use engine::{Engine, TurnOutcome, TurnStatus};
pub use llm::{ChatMessage, DEFAULT_INFERENCE_URL, DEFAULT_MODEL, LlmClient, LlmConfig, LlmError};
pub use observability::SessionEvent;
pub use reasoning::{
    CORRECTIVE_HINT, DEFAULT_MAX_ITERATIONS, DEFAULT_THINKER_TIMEOUT_MS, DEFAULT_TOOL_TIMEOUT_MS,
    LlmThinker, LoopOutcome, ReasoningConfig, ReasoningLoop, ThinkContext, Thinker, ThinkerAction,
    ThinkerDecision, ThinkerError, build_thinker_messages,
};
pub use session::{
    AbortReason, FileSessionStore, MESSAGE_OVERHEAD_TOKENS, MemorySessionStore, Message,
    ReasoningStep, ReasoningTrace, Role, SUMMARY_MESSAGE_NAME, Session, SessionError,
    SessionStatus, SessionStore, StepType, new_session_id, total_tokens,
};
pub use tools::{
    KNOWLEDGE_BASE_TOOL, KnowledgeBaseTool, SearchKnowledgeBaseArgs, Tool, ToolDescriptor,
    ToolError, ToolHandler, ToolOutput, ToolRegistry,
};
