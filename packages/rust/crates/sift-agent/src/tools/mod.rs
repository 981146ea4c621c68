//! Tool namespace: registry, error taxonomy and the built-in knowledge-base tool.

mod error;
mod knowledge_base;
mod registry;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use sift_retrieval::{RequestDeadline, RetrievalTier};

pub use error::ToolError;
pub use knowledge_base::{KNOWLEDGE_BASE_TOOL, KnowledgeBaseTool, SearchKnowledgeBaseArgs};
pub use registry::{ToolDescriptor, ToolHandler, ToolRegistry};

/// Result of one tool invocation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolOutput {
    /// Structured result shown to the thinker.
    pub content: Value,
    /// The tool answered at reduced quality.
    pub degraded: bool,
    /// Retrieval tier, for retrieval-backed tools.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tier: Option<RetrievalTier>,
}

impl ToolOutput {
    /// Full-quality output.
    #[must_use]
    pub fn new(content: Value) -> Self {
        Self {
            content,
            degraded: false,
            tier: None,
        }
    }

    /// Text rendering used for OBSERVE steps.
    #[must_use]
    pub fn render(&self) -> String {
        match &self.content {
            Value::String(text) => text.clone(),
            other => other.to_string(),
        }
    }
}

/// Pluggable tool. Arguments arrive already validated against the schema the
/// tool was registered with.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Run the tool.
    async fn invoke(&self, args: Value, deadline: RequestDeadline) -> Result<ToolOutput, ToolError>;
}
