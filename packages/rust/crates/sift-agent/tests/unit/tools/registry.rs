use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};
use sift_retrieval::RequestDeadline;

use super::{ToolHandler, ToolRegistry};
use crate::tools::{KnowledgeBaseTool, Tool, ToolError, ToolOutput};

struct Echo;

#[async_trait]
impl Tool for Echo {
    async fn invoke(&self, args: Value, _deadline: RequestDeadline) -> Result<ToolOutput, ToolError> {
        Ok(ToolOutput::new(args))
    }
}

struct Sleepy;

#[async_trait]
impl Tool for Sleepy {
    async fn invoke(&self, _args: Value, _deadline: RequestDeadline) -> Result<ToolOutput, ToolError> {
        tokio::time::sleep(Duration::from_secs(5)).await;
        Ok(ToolOutput::new(json!("late")))
    }
}

fn echo_schema() -> Value {
    json!({
        "type": "object",
        "properties": { "text": { "type": "string" } },
        "required": ["text"],
        "additionalProperties": false
    })
}

fn registry() -> ToolRegistry {
    let mut registry = ToolRegistry::new(Duration::from_millis(50));
    registry
        .register("echo", "echo back", echo_schema(), ToolHandler::Custom(Arc::new(Echo)))
        .expect("register echo");
    registry
        .register(
            "sleepy",
            "never finishes in time",
            json!({ "type": "object" }),
            ToolHandler::Custom(Arc::new(Sleepy)),
        )
        .expect("register sleepy");
    registry
}

#[tokio::test]
async fn call_dispatches_valid_arguments() {
    let output = registry()
        .call("echo", json!({ "text": "hi" }), RequestDeadline::none())
        .await
        .expect("echo call");
    assert_eq!(output.content, json!({ "text": "hi" }));
    assert!(!output.degraded);
}

#[tokio::test]
async fn call_rejects_unknown_tool() {
    let error = registry()
        .call("missing", json!({}), RequestDeadline::none())
        .await
        .err();
    assert_eq!(error, Some(ToolError::NotFound("missing".to_string())));
}

#[tokio::test]
async fn call_rejects_arguments_before_dispatch() {
    let registry = registry();
    for bad in [json!({}), json!({ "text": 3 }), json!({ "text": "x", "extra": true })] {
        let error = registry.call("echo", bad, RequestDeadline::none()).await.err();
        assert!(
            matches!(error, Some(ToolError::InvalidArgs { ref tool, .. }) if tool == "echo"),
            "unexpected: {error:?}"
        );
    }
}

#[tokio::test]
async fn call_enforces_tool_timeout() {
    let error = registry()
        .call("sleepy", json!({}), RequestDeadline::none())
        .await
        .err();
    assert!(matches!(error, Some(ToolError::Timeout { .. })));
}

#[test]
fn register_rejects_duplicates_and_blank_names() {
    let mut registry = registry();
    let duplicate = registry.register(
        "echo",
        "again",
        echo_schema(),
        ToolHandler::Custom(Arc::new(Echo)),
    );
    assert!(matches!(duplicate, Err(ToolError::Registration { .. })));
    let blank = registry.register("  ", "", echo_schema(), ToolHandler::Custom(Arc::new(Echo)));
    assert!(matches!(blank, Err(ToolError::Registration { .. })));
    assert_eq!(registry.len(), 2);
}

#[test]
fn register_rejects_uncompilable_schema() {
    let mut registry = ToolRegistry::new(Duration::from_secs(1));
    let result = registry.register(
        "broken",
        "",
        json!({ "type": 12 }),
        ToolHandler::Custom(Arc::new(Echo)),
    );
    assert!(matches!(result, Err(ToolError::Registration { .. })));
}

#[test]
fn catalog_is_sorted_by_name() {
    let names: Vec<String> = registry().catalog().into_iter().map(|d| d.name).collect();
    assert_eq!(names, vec!["echo".to_string(), "sleepy".to_string()]);
}

#[test]
fn knowledge_base_schema_matches_argument_struct() {
    let schema = KnowledgeBaseTool::schema();
    assert_eq!(schema["required"], json!(["query"]));
    assert_eq!(schema["additionalProperties"], json!(false));
    for field in ["query", "domain", "top_k"] {
        assert!(schema["properties"].get(field).is_some(), "missing {field}");
    }
}
