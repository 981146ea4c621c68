use serde_json::json;

use super::{ThinkerAction, ThinkerDecision};
use crate::reasoning::ThinkerError;

#[test]
fn parses_tool_decision() {
    let raw = r#"{"reasoning":"need docs","action":"tool","tool_name":"search_knowledge_base","tool_args":{"query":"leave policy"}}"#;
    let decision = ThinkerDecision::parse(raw).expect("valid decision");
    assert_eq!(decision.reasoning, "need docs");
    assert_eq!(
        decision.action,
        ThinkerAction::Tool {
            name: "search_knowledge_base".to_string(),
            args: json!({"query": "leave policy"}),
        }
    );
}

#[test]
fn parses_fenced_answer() {
    let raw = "```json\n{\"reasoning\":\"known\",\"action\":\"answer\",\"response\":\"42\"}\n```";
    let decision = ThinkerDecision::parse(raw).expect("valid decision");
    assert_eq!(
        decision.action,
        ThinkerAction::Answer {
            response: "42".to_string()
        }
    );
}

#[test]
fn missing_tool_args_default_to_empty_object() {
    let decision = ThinkerDecision::parse(r#"{"action":"tool","tool_name":"clock"}"#)
        .expect("valid decision");
    assert_eq!(
        decision.action,
        ThinkerAction::Tool {
            name: "clock".to_string(),
            args: json!({}),
        }
    );
    assert!(decision.reasoning.is_empty());
}

#[test]
fn string_encoded_tool_args_are_decoded() {
    let raw = r#"{"action":"tool","tool_name":"echo","tool_args":"{\"text\":\"hi\"}"}"#;
    let decision = ThinkerDecision::parse(raw).expect("valid decision");
    assert_eq!(
        decision.action,
        ThinkerAction::Tool {
            name: "echo".to_string(),
            args: json!({"text": "hi"}),
        }
    );
}

#[test]
fn protocol_errors() {
    for raw in [
        "not json at all",
        r#"{"action":"dance"}"#,
        r#"{"action":"tool"}"#,
        r#"{"action":"tool","tool_name":"  "}"#,
        r#"{"action":"tool","tool_name":"echo","tool_args":[1,2]}"#,
        r#"{"action":"answer"}"#,
        r#"{"action":"answer","response":"   "}"#,
        r#"{"reasoning":"no action"}"#,
    ] {
        let error = ThinkerDecision::parse(raw).expect_err(raw);
        assert!(matches!(error, ThinkerError::Protocol(_)), "{raw}: {error}");
    }
}
