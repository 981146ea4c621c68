//! Tool registry: name -> schema-validated handler.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use jsonschema::JSONSchema;
use serde::Serialize;
use serde_json::Value;
use sift_retrieval::RequestDeadline;

use crate::observability::SessionEvent;

use super::error::ToolError;
use super::knowledge_base::KnowledgeBaseTool;
use super::{Tool, ToolOutput};

/// Closed set of handler kinds. Dispatch is a match, never a reflective lookup.
#[derive(Clone)]
pub enum ToolHandler {
    /// Built-in hybrid-retrieval tool.
    KnowledgeBase(KnowledgeBaseTool),
    /// Host-provided tool.
    Custom(Arc<dyn Tool>),
}

impl ToolHandler {
    async fn invoke(&self, args: Value, deadline: RequestDeadline) -> Result<ToolOutput, ToolError> {
        match self {
            Self::KnowledgeBase(tool) => tool.invoke(args, deadline).await,
            Self::Custom(tool) => tool.invoke(args, deadline).await,
        }
    }

    const fn kind(&self) -> &'static str {
        match self {
            Self::KnowledgeBase(_) => "knowledge_base",
            Self::Custom(_) => "custom",
        }
    }
}

/// Catalog entry handed to the thinker.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolDescriptor {
    /// Tool name.
    pub name: String,
    /// What the tool does, for the thinker.
    pub description: String,
    /// JSON Schema of the arguments.
    pub schema: Value,
}

struct RegisteredTool {
    descriptor: ToolDescriptor,
    validator: JSONSchema,
    handler: ToolHandler,
}

/// Name-keyed tool table. Immutable once built; shared across turns behind an `Arc`.
pub struct ToolRegistry {
    tools: BTreeMap<String, RegisteredTool>,
    tool_timeout: Duration,
}

impl ToolRegistry {
    /// Empty registry; every call is bounded by `tool_timeout`.
    #[must_use]
    pub fn new(tool_timeout: Duration) -> Self {
        Self {
            tools: BTreeMap::new(),
            tool_timeout,
        }
    }

    /// Register `handler` under `name` with an argument schema.
    ///
    /// # Errors
    ///
    /// [`ToolError::Registration`] for a blank or duplicate name or a schema
    /// that does not compile.
    pub fn register(
        &mut self,
        name: &str,
        description: &str,
        schema: Value,
        handler: ToolHandler,
    ) -> Result<(), ToolError> {
        let name = name.trim();
        let registration = |reason: String| ToolError::Registration {
            tool: name.to_string(),
            reason,
        };
        if name.is_empty() {
            return Err(registration("tool name must not be empty".to_string()));
        }
        if self.tools.contains_key(name) {
            return Err(registration("a tool with this name is already registered".to_string()));
        }
        let validator = JSONSchema::compile(&schema)
            .map_err(|error| registration(format!("invalid argument schema: {error}")))?;
        tracing::debug!(
            event = SessionEvent::ToolRegistered.as_str(),
            tool = name,
            kind = handler.kind(),
            "tool registered"
        );
        self.tools.insert(
            name.to_string(),
            RegisteredTool {
                descriptor: ToolDescriptor {
                    name: name.to_string(),
                    description: description.to_string(),
                    schema,
                },
                validator,
                handler,
            },
        );
        Ok(())
    }

    /// Register the built-in `search_knowledge_base` tool.
    ///
    /// # Errors
    ///
    /// Same as [`Self::register`].
    pub fn register_knowledge_base(&mut self, tool: KnowledgeBaseTool) -> Result<(), ToolError> {
        self.register(
            super::KNOWLEDGE_BASE_TOOL,
            KnowledgeBaseTool::DESCRIPTION,
            KnowledgeBaseTool::schema(),
            ToolHandler::KnowledgeBase(tool),
        )
    }

    /// Descriptors sorted by name.
    #[must_use]
    pub fn catalog(&self) -> Vec<ToolDescriptor> {
        self.tools
            .values()
            .map(|tool| tool.descriptor.clone())
            .collect()
    }

    /// True when `name` is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Number of tools.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// True when nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Validate `args` and dispatch, bounded by the tool budget and the deadline.
    ///
    /// # Errors
    ///
    /// [`ToolError::NotFound`], [`ToolError::InvalidArgs`], [`ToolError::Timeout`],
    /// or whatever the tool itself returns.
    pub async fn call(
        &self,
        name: &str,
        args: Value,
        deadline: RequestDeadline,
    ) -> Result<ToolOutput, ToolError> {
        let Some(tool) = self.tools.get(name) else {
            tracing::warn!(
                event = SessionEvent::ToolNotFound.as_str(),
                tool = name,
                "thinker requested an unknown tool"
            );
            return Err(ToolError::NotFound(name.to_string()));
        };

        if let Err(errors) = tool.validator.validate(&args) {
            let reason = errors
                .map(|error| {
                    let path = error.instance_path.to_string();
                    if path.is_empty() {
                        error.to_string()
                    } else {
                        format!("{path}: {error}")
                    }
                })
                .collect::<Vec<_>>()
                .join("; ");
            tracing::warn!(
                event = SessionEvent::ToolArgsRejected.as_str(),
                tool = name,
                reason = %reason,
                "tool arguments failed schema validation"
            );
            return Err(ToolError::InvalidArgs {
                tool: name.to_string(),
                reason,
            });
        }

        let budget = deadline.clamp(self.tool_timeout);
        let started = Instant::now();
        tracing::debug!(
            event = SessionEvent::ToolDispatched.as_str(),
            tool = name,
            budget_ms = budget.as_millis(),
            "dispatching tool"
        );
        match tokio::time::timeout(budget, tool.handler.invoke(args, deadline)).await {
            Ok(Ok(output)) => Ok(output),
            Ok(Err(error)) => {
                tracing::warn!(
                    event = SessionEvent::ToolFailed.as_str(),
                    tool = name,
                    fatal = error.is_fatal(),
                    elapsed_ms = started.elapsed().as_millis(),
                    error = %error,
                    "tool returned an error"
                );
                Err(error)
            }
            Err(_) => {
                tracing::warn!(
                    event = SessionEvent::ToolTimedOut.as_str(),
                    tool = name,
                    budget_ms = budget.as_millis(),
                    "tool timed out"
                );
                Err(ToolError::Timeout {
                    tool: name.to_string(),
                    budget,
                })
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/tools/registry.rs"]
mod tests;
