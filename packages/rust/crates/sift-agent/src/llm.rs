//! LLM client: OpenAI-compatible chat completions, shared by the thinker and the summarizer.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default inference endpoint (local LiteLLM-style proxy).
pub const DEFAULT_INFERENCE_URL: &str = "http://127.0.0.1:4000/v1/chat/completions";
/// Default model name.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Chat-completions endpoint settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LlmConfig {
    /// Full chat-completions URL.
    pub inference_url: String,
    /// Model name sent with every request.
    pub model: String,
    /// Bearer token, if the endpoint needs one.
    pub api_key: Option<String>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            inference_url: DEFAULT_INFERENCE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key: None,
        }
    }
}

/// One request message in chat-completions format.
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    /// "system", "user", "assistant".
    pub role: String,
    /// Text content.
    pub content: String,
}

impl ChatMessage {
    /// Message with an explicit role.
    #[must_use]
    pub fn new(role: &str, content: impl Into<String>) -> Self {
        Self {
            role: role.to_string(),
            content: content.into(),
        }
    }

    /// System message.
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self::new("system", content)
    }

    /// User message.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self::new("user", content)
    }
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    typ: &'static str,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Chat-completions failure.
#[derive(Error, Debug)]
pub enum LlmError {
    /// Connection or transport failure.
    #[error("LLM request failed: {0}")]
    Transport(String),
    /// Non-success HTTP status.
    #[error("LLM API error {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body.
        body: String,
    },
    /// Response did not follow the chat-completions shape.
    #[error("LLM response malformed: {0}")]
    Malformed(String),
}

/// HTTP client for chat completions.
#[derive(Debug, Clone)]
pub struct LlmClient {
    client: reqwest::Client,
    config: LlmConfig,
}

impl LlmClient {
    /// Client for `config`. Per-call timeouts are applied by the callers.
    #[must_use]
    pub fn new(config: LlmConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    /// Endpoint settings.
    #[must_use]
    pub fn config(&self) -> &LlmConfig {
        &self.config
    }

    /// Send `messages` and return the first choice's text. `json_mode` asks
    /// the endpoint for a JSON object response.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError`] on transport failure, non-success status or a
    /// response without content.
    pub async fn chat(&self, messages: &[ChatMessage], json_mode: bool) -> Result<String, LlmError> {
        let body = ChatCompletionRequest {
            model: &self.config.model,
            messages,
            response_format: json_mode.then_some(ResponseFormat {
                typ: "json_object",
            }),
        };
        let mut req = self.client.post(&self.config.inference_url).json(&body);
        if let Some(ref key) = self.config.api_key {
            req = req.header("Authorization", format!("Bearer {key}"));
        }
        let res = req
            .send()
            .await
            .map_err(|error| LlmError::Transport(error.to_string()))?;
        let status = res.status();
        let text = res
            .text()
            .await
            .map_err(|error| LlmError::Transport(error.to_string()))?;
        if !status.is_success() {
            return Err(LlmError::Status {
                status: status.as_u16(),
                body: text,
            });
        }
        let parsed: ChatCompletionResponse = serde_json::from_str(&text)
            .map_err(|error| LlmError::Malformed(format!("{error}; body: {text}")))?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| LlmError::Malformed("response has no message content".to_string()))
    }
}
