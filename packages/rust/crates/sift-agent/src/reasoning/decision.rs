//! Structured thinker decisions and their wire format.

use serde::Deserialize;
use serde_json::{Map, Value};

use super::thinker::ThinkerError;

/// What the thinker wants to do next.
#[derive(Debug, Clone, PartialEq)]
pub enum ThinkerAction {
    /// Call a tool.
    Tool {
        /// Tool name.
        name: String,
        /// Tool arguments (a JSON object).
        args: Value,
    },
    /// Finish with an answer.
    Answer {
        /// Answer text.
        response: String,
    },
}

/// One thinker decision.
#[derive(Debug, Clone, PartialEq)]
pub struct ThinkerDecision {
    /// Free-text reasoning, recorded as the THINK step.
    pub reasoning: String,
    /// Next action.
    pub action: ThinkerAction,
}

#[derive(Debug, Deserialize)]
struct WireDecision {
    #[serde(default)]
    reasoning: Option<String>,
    action: String,
    #[serde(default)]
    tool_name: Option<String>,
    #[serde(default)]
    tool_args: Option<Value>,
    #[serde(default)]
    response: Option<String>,
}

impl ThinkerDecision {
    /// Call `name` with `args`.
    #[must_use]
    pub fn tool(reasoning: impl Into<String>, name: impl Into<String>, args: Value) -> Self {
        Self {
            reasoning: reasoning.into(),
            action: ThinkerAction::Tool {
                name: name.into(),
                args,
            },
        }
    }

    /// Answer with `response`.
    #[must_use]
    pub fn answer(reasoning: impl Into<String>, response: impl Into<String>) -> Self {
        Self {
            reasoning: reasoning.into(),
            action: ThinkerAction::Answer {
                response: response.into(),
            },
        }
    }

    /// Parse the JSON decision object:
    /// `{"reasoning", "action": "tool"|"answer", "tool_name"?, "tool_args"?, "response"?}`.
    ///
    /// Markdown code fences around the object are tolerated.
    ///
    /// # Errors
    ///
    /// [`ThinkerError::Protocol`] when the text is not a valid decision.
    pub fn parse(raw: &str) -> Result<Self, ThinkerError> {
        let body = strip_code_fence(raw);
        let wire: WireDecision = serde_json::from_str(body)
            .map_err(|error| ThinkerError::Protocol(format!("decision is not valid JSON: {error}")))?;
        let reasoning = wire.reasoning.unwrap_or_default().trim().to_string();
        match wire.action.trim().to_ascii_lowercase().as_str() {
            "tool" => {
                let name = wire
                    .tool_name
                    .map(|name| name.trim().to_string())
                    .filter(|name| !name.is_empty())
                    .ok_or_else(|| {
                        ThinkerError::Protocol("action \"tool\" requires tool_name".to_string())
                    })?;
                let args = match wire.tool_args {
                    None | Some(Value::Null) => Value::Object(Map::new()),
                    Some(Value::String(encoded)) => serde_json::from_str(&encoded).map_err(|error| {
                        ThinkerError::Protocol(format!("tool_args string is not JSON: {error}"))
                    })?,
                    Some(other) => other,
                };
                if !args.is_object() {
                    return Err(ThinkerError::Protocol(
                        "tool_args must be a JSON object".to_string(),
                    ));
                }
                Ok(Self::tool(reasoning, name, args))
            }
            "answer" => {
                let response = wire
                    .response
                    .filter(|response| !response.trim().is_empty())
                    .ok_or_else(|| {
                        ThinkerError::Protocol("action \"answer\" requires response".to_string())
                    })?;
                Ok(Self::answer(reasoning, response))
            }
            other => Err(ThinkerError::Protocol(format!(
                "unknown action {other:?} (expected \"tool\" or \"answer\")"
            ))),
        }
    }
}

fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

#[cfg(test)]
#[path = "../../tests/unit/reasoning/decision.rs"]
mod tests;
