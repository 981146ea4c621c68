//! Resolved core configuration. Built once from [`RuntimeSettings`] and passed
//! by value into every component; nothing reads settings during a turn.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use sift_retrieval::RetrievalConfig;

use crate::compression::CompressionConfig;
use crate::llm::{DEFAULT_INFERENCE_URL, DEFAULT_MODEL, LlmConfig};
use crate::reasoning::ReasoningConfig;

use super::settings::RuntimeSettings;

/// Default transport retries for the reranker.
pub const DEFAULT_RERANK_MAX_RETRIES: u32 = 1;
const DEFAULT_SESSION_DIR: &str = ".cache/sift/sessions";
const DEFAULT_API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Base URLs of the retrieval collaborators. `None` leaves a collaborator unwired.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceEndpoints {
    /// Embedding service (`/embed/batch`).
    pub embedding_url: Option<String>,
    /// Embedding model requested from the service.
    pub embedding_model: Option<String>,
    /// Reranker service (`/rerank`).
    pub rerank_url: Option<String>,
    /// Search service (`/search`), used for both dense and sparse legs.
    pub search_url: Option<String>,
}

/// Session persistence engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SessionBackend {
    /// Process-local.
    Memory,
    /// JSON-lines files.
    #[default]
    Jsonl,
}

/// Session store selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionBackendConfig {
    /// Engine.
    pub backend: SessionBackend,
    /// Directory for the JSONL engine.
    pub dir: PathBuf,
}

impl Default for SessionBackendConfig {
    fn default() -> Self {
        Self {
            backend: SessionBackend::default(),
            dir: PathBuf::from(DEFAULT_SESSION_DIR),
        }
    }
}

/// Immutable configuration for one engine instance.
#[derive(Debug, Clone, PartialEq)]
pub struct CoreConfig {
    /// Retrieval weights, sizes and leg budgets.
    pub retrieval: RetrievalConfig,
    /// Reasoning-loop bounds and budgets.
    pub reasoning: ReasoningConfig,
    /// Context-window budget.
    pub context: CompressionConfig,
    /// Reranker transport retries.
    pub rerank_max_retries: u32,
    /// Whole-turn deadline; `None` leaves only per-step budgets.
    pub request_deadline_ms: Option<u64>,
    /// Chat-completions endpoint.
    pub llm: LlmConfig,
    /// Collaborator endpoints.
    pub services: ServiceEndpoints,
    /// Session store selection.
    pub session: SessionBackendConfig,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            retrieval: RetrievalConfig::default(),
            reasoning: ReasoningConfig::default(),
            context: CompressionConfig::default(),
            rerank_max_retries: DEFAULT_RERANK_MAX_RETRIES,
            request_deadline_ms: None,
            llm: LlmConfig::default(),
            services: ServiceEndpoints::default(),
            session: SessionBackendConfig::default(),
        }
    }
}

impl CoreConfig {
    /// Resolve settings over defaults and validate the result.
    ///
    /// # Errors
    ///
    /// Fails when a value is out of range (weights, `top_k`,
    /// `oversample_factor`, `max_iterations`, `keep_recent`) or the session
    /// backend name is unknown.
    pub fn from_settings(settings: &RuntimeSettings) -> Result<Self> {
        let defaults = Self::default();
        let r = &settings.retrieval;
        let retrieval = RetrievalConfig {
            dense_weight: r.dense_weight.unwrap_or(defaults.retrieval.dense_weight),
            sparse_weight: r.sparse_weight.unwrap_or(defaults.retrieval.sparse_weight),
            rrf_k: r.rrf_k.unwrap_or(defaults.retrieval.rrf_k),
            top_k: r.top_k.unwrap_or(defaults.retrieval.top_k),
            oversample_factor: r
                .oversample_factor
                .unwrap_or(defaults.retrieval.oversample_factor),
            rerank_timeout_ms: r
                .rerank_timeout_ms
                .unwrap_or(defaults.retrieval.rerank_timeout_ms),
            dense_timeout_ms: r
                .dense_timeout_ms
                .unwrap_or(defaults.retrieval.dense_timeout_ms),
            sparse_timeout_ms: r
                .sparse_timeout_ms
                .unwrap_or(defaults.retrieval.sparse_timeout_ms),
        };
        let reasoning = ReasoningConfig {
            max_iterations: settings
                .reasoning
                .max_iterations
                .unwrap_or(defaults.reasoning.max_iterations),
            tool_timeout_ms: settings
                .reasoning
                .tool_timeout_ms
                .unwrap_or(defaults.reasoning.tool_timeout_ms),
            thinker_timeout_ms: settings
                .reasoning
                .thinker_timeout_ms
                .unwrap_or(defaults.reasoning.thinker_timeout_ms),
        };
        let context = CompressionConfig {
            token_budget: settings
                .context
                .token_budget
                .unwrap_or(defaults.context.token_budget),
            keep_recent: settings
                .context
                .keep_recent
                .unwrap_or(defaults.context.keep_recent),
        };
        let api_key_env = settings
            .llm
            .api_key_env
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(DEFAULT_API_KEY_ENV);
        let llm = LlmConfig {
            inference_url: non_empty(settings.llm.inference_url.as_deref())
                .unwrap_or_else(|| DEFAULT_INFERENCE_URL.to_string()),
            model: non_empty(settings.llm.model.as_deref())
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            api_key: std::env::var(api_key_env)
                .ok()
                .filter(|key| !key.trim().is_empty()),
        };
        let services = ServiceEndpoints {
            embedding_url: non_empty(settings.services.embedding_url.as_deref()),
            embedding_model: non_empty(settings.services.embedding_model.as_deref()),
            rerank_url: non_empty(settings.services.rerank_url.as_deref()),
            search_url: non_empty(settings.services.search_url.as_deref()),
        };
        let session = SessionBackendConfig {
            backend: parse_backend(settings.session.backend.as_deref())?,
            dir: non_empty(settings.session.dir.as_deref())
                .map_or(defaults.session.dir, PathBuf::from),
        };

        let config = Self {
            retrieval,
            reasoning,
            context,
            rerank_max_retries: settings
                .retrieval
                .rerank_max_retries
                .unwrap_or(DEFAULT_RERANK_MAX_RETRIES),
            request_deadline_ms: settings
                .reasoning
                .request_deadline_ms
                .filter(|ms| *ms > 0),
            llm,
            services,
            session,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check ranges.
    ///
    /// # Errors
    ///
    /// Describes the first invalid value.
    pub fn validate(&self) -> Result<()> {
        self.retrieval
            .validate()
            .context("invalid retrieval settings")?;
        if self.reasoning.max_iterations == 0 {
            bail!("reasoning.max_iterations must be >= 1");
        }
        if self.context.keep_recent == 0 {
            bail!("context.keep_recent must be >= 1");
        }
        Ok(())
    }

    /// Whole-turn deadline budget.
    #[must_use]
    pub fn request_deadline(&self) -> Option<Duration> {
        self.request_deadline_ms.map(Duration::from_millis)
    }
}

fn parse_backend(raw: Option<&str>) -> Result<SessionBackend> {
    match raw.map(str::trim).map(str::to_ascii_lowercase).as_deref() {
        None | Some("") | Some("jsonl" | "file") => Ok(SessionBackend::Jsonl),
        Some("memory") => Ok(SessionBackend::Memory),
        Some(other) => bail!("unknown session.backend {other:?} (expected memory | jsonl)"),
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(ToString::to_string)
}
