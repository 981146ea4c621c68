//! Runtime settings loader.
//!
//! Loads and merges:
//! - System defaults: `<SIFT_ROOT>/packages/conf/settings.yaml`
//! - User overrides:  `<SIFT_CONFIG_HOME>/sift/settings.yaml`
//!
//! Merge precedence is user over system, field by field.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use serde::Deserialize;

const DEFAULT_SYSTEM_SETTINGS_RELATIVE_PATH: &str = "packages/conf/settings.yaml";
const DEFAULT_USER_SETTINGS_RELATIVE_PATH: &str = "sift/settings.yaml";
const DEFAULT_CONFIG_HOME_RELATIVE_PATH: &str = ".config";
static CONFIG_HOME_OVERRIDE: OnceLock<PathBuf> = OnceLock::new();

/// Raw settings document. Every field is optional; defaults are applied in
/// [`crate::CoreConfig::from_settings`].
#[derive(Debug, Clone, Default, Deserialize)]
#[allow(missing_docs)]
pub struct RuntimeSettings {
    #[serde(default)]
    pub retrieval: RetrievalSettings,
    #[serde(default)]
    pub reasoning: ReasoningSettings,
    #[serde(default)]
    pub context: ContextSettings,
    #[serde(default)]
    pub llm: LlmSettings,
    #[serde(default)]
    pub services: ServiceSettings,
    #[serde(default)]
    pub session: SessionSettings,
}

/// `retrieval:` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[allow(missing_docs)]
pub struct RetrievalSettings {
    pub dense_weight: Option<f32>,
    pub sparse_weight: Option<f32>,
    pub rrf_k: Option<f32>,
    pub top_k: Option<usize>,
    pub oversample_factor: Option<usize>,
    pub rerank_timeout_ms: Option<u64>,
    pub dense_timeout_ms: Option<u64>,
    pub sparse_timeout_ms: Option<u64>,
    pub rerank_max_retries: Option<u32>,
}

/// `reasoning:` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[allow(missing_docs)]
pub struct ReasoningSettings {
    pub max_iterations: Option<usize>,
    pub tool_timeout_ms: Option<u64>,
    pub thinker_timeout_ms: Option<u64>,
    pub request_deadline_ms: Option<u64>,
}

/// `context:` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[allow(missing_docs)]
pub struct ContextSettings {
    pub token_budget: Option<usize>,
    pub keep_recent: Option<usize>,
}

/// `llm:` section (OpenAI-compatible chat completions).
#[derive(Debug, Clone, Default, Deserialize)]
#[allow(missing_docs)]
pub struct LlmSettings {
    pub inference_url: Option<String>,
    pub model: Option<String>,
    pub api_key_env: Option<String>,
}

/// `services:` section: base URLs of the retrieval collaborators.
#[derive(Debug, Clone, Default, Deserialize)]
#[allow(missing_docs)]
pub struct ServiceSettings {
    pub embedding_url: Option<String>,
    pub embedding_model: Option<String>,
    pub rerank_url: Option<String>,
    pub search_url: Option<String>,
}

/// `session:` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[allow(missing_docs)]
pub struct SessionSettings {
    pub backend: Option<String>,
    pub dir: Option<String>,
}

impl RuntimeSettings {
    fn merge(self, overlay: Self) -> Self {
        Self {
            retrieval: self.retrieval.merge(overlay.retrieval),
            reasoning: self.reasoning.merge(overlay.reasoning),
            context: self.context.merge(overlay.context),
            llm: self.llm.merge(overlay.llm),
            services: self.services.merge(overlay.services),
            session: self.session.merge(overlay.session),
        }
    }
}

impl RetrievalSettings {
    fn merge(self, overlay: Self) -> Self {
        Self {
            dense_weight: overlay.dense_weight.or(self.dense_weight),
            sparse_weight: overlay.sparse_weight.or(self.sparse_weight),
            rrf_k: overlay.rrf_k.or(self.rrf_k),
            top_k: overlay.top_k.or(self.top_k),
            oversample_factor: overlay.oversample_factor.or(self.oversample_factor),
            rerank_timeout_ms: overlay.rerank_timeout_ms.or(self.rerank_timeout_ms),
            dense_timeout_ms: overlay.dense_timeout_ms.or(self.dense_timeout_ms),
            sparse_timeout_ms: overlay.sparse_timeout_ms.or(self.sparse_timeout_ms),
            rerank_max_retries: overlay.rerank_max_retries.or(self.rerank_max_retries),
        }
    }
}

impl ReasoningSettings {
    fn merge(self, overlay: Self) -> Self {
        Self {
            max_iterations: overlay.max_iterations.or(self.max_iterations),
            tool_timeout_ms: overlay.tool_timeout_ms.or(self.tool_timeout_ms),
            thinker_timeout_ms: overlay.thinker_timeout_ms.or(self.thinker_timeout_ms),
            request_deadline_ms: overlay.request_deadline_ms.or(self.request_deadline_ms),
        }
    }
}

impl ContextSettings {
    fn merge(self, overlay: Self) -> Self {
        Self {
            token_budget: overlay.token_budget.or(self.token_budget),
            keep_recent: overlay.keep_recent.or(self.keep_recent),
        }
    }
}

impl LlmSettings {
    fn merge(self, overlay: Self) -> Self {
        Self {
            inference_url: overlay.inference_url.or(self.inference_url),
            model: overlay.model.or(self.model),
            api_key_env: overlay.api_key_env.or(self.api_key_env),
        }
    }
}

impl ServiceSettings {
    fn merge(self, overlay: Self) -> Self {
        Self {
            embedding_url: overlay.embedding_url.or(self.embedding_url),
            embedding_model: overlay.embedding_model.or(self.embedding_model),
            rerank_url: overlay.rerank_url.or(self.rerank_url),
            search_url: overlay.search_url.or(self.search_url),
        }
    }
}

impl SessionSettings {
    fn merge(self, overlay: Self) -> Self {
        Self {
            backend: overlay.backend.or(self.backend),
            dir: overlay.dir.or(self.dir),
        }
    }
}

/// Load merged runtime settings (user overrides system).
#[must_use]
pub fn load_runtime_settings() -> RuntimeSettings {
    let (system_path, user_path) = runtime_settings_paths();
    load_runtime_settings_from_paths(&system_path, &user_path)
}

/// System and user settings paths for the current environment.
#[doc(hidden)]
#[must_use]
pub fn runtime_settings_paths() -> (PathBuf, PathBuf) {
    let root = project_root();
    let system_path = root.join(DEFAULT_SYSTEM_SETTINGS_RELATIVE_PATH);
    let user_path = resolve_config_home(&root).join(DEFAULT_USER_SETTINGS_RELATIVE_PATH);
    (system_path, user_path)
}

/// Load and merge two explicit settings files.
#[doc(hidden)]
#[must_use]
pub fn load_runtime_settings_from_paths(system: &Path, user: &Path) -> RuntimeSettings {
    load_one(system).merge(load_one(user))
}

fn load_one(path: &Path) -> RuntimeSettings {
    if !path.exists() {
        return RuntimeSettings::default();
    }
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(error) => {
            tracing::warn!(
                path = %path.display(),
                error = %error,
                "failed to read settings file; ignoring"
            );
            return RuntimeSettings::default();
        }
    };
    if raw.trim().is_empty() {
        return RuntimeSettings::default();
    }
    match serde_yaml::from_str::<RuntimeSettings>(&raw) {
        Ok(value) => value,
        Err(error) => {
            tracing::warn!(
                path = %path.display(),
                error = %error,
                "failed to parse settings yaml; ignoring file"
            );
            RuntimeSettings::default()
        }
    }
}

fn project_root() -> PathBuf {
    non_empty_env("SIFT_ROOT").map_or_else(
        || std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
        PathBuf::from,
    )
}

/// Set config-home override (used by CLI `--conf`).
///
/// The path can be absolute, or relative to `SIFT_ROOT`/cwd.
pub fn set_config_home_override(path: impl Into<PathBuf>) {
    let path = path.into();
    if path.as_os_str().is_empty() {
        return;
    }
    if CONFIG_HOME_OVERRIDE.set(path.clone()).is_err()
        && let Some(current) = CONFIG_HOME_OVERRIDE.get()
        && current != &path
    {
        tracing::warn!(
            current = %current.display(),
            ignored = %path.display(),
            "config home override already set; ignoring subsequent value"
        );
    }
}

fn resolve_config_home(project_root: &Path) -> PathBuf {
    if let Some(path) = CONFIG_HOME_OVERRIDE.get() {
        return absolutize(project_root, path.clone());
    }
    let configured = non_empty_env("SIFT_CONFIG_HOME")
        .unwrap_or_else(|| DEFAULT_CONFIG_HOME_RELATIVE_PATH.to_string());
    absolutize(project_root, PathBuf::from(configured))
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn absolutize(project_root: &Path, path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        path
    } else {
        project_root.join(path)
    }
}
