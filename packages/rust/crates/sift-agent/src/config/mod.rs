//! Config namespace: YAML runtime settings and the resolved core configuration.

mod core;
mod settings;

pub use core::{CoreConfig, ServiceEndpoints, SessionBackend, SessionBackendConfig};
pub use settings::{
    ContextSettings, LlmSettings, ReasoningSettings, RetrievalSettings, RuntimeSettings,
    ServiceSettings, SessionSettings, load_runtime_settings, load_runtime_settings_from_paths,
    runtime_settings_paths, set_config_home_override,
};
