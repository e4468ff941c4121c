use std::env;

use crate::errors::{AgentError, AgentResult};

/// Unified enum to wrap different provider configurations.
pub enum ProviderConfig {
    OpenAiCompatible(OpenAiCompatibleConfig),
}

/// Connection settings for any OpenAI-compatible chat-completions endpoint
/// (OpenAI itself, or a self-hosted / academic gateway reachable under a
/// custom base URL). Explicit and per-instance; nothing here is process-global.
#[derive(Debug, Clone)]
pub struct OpenAiCompatibleConfig {
    pub host: String,
    pub api_key: String,
    pub temperature: Option<f32>,
    pub max_tokens: Option<i32>,
}

impl OpenAiCompatibleConfig {
    pub fn new(host: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            api_key: api_key.into(),
            temperature: None,
            max_tokens: None,
        }
    }

    /// Read connection settings from the environment (a local `.env` file is
    /// honored). Missing credentials fail before any model call is attempted.
    pub fn from_env() -> AgentResult<Self> {
        dotenv::dotenv().ok();
        let host = env::var("WEBPILOT_BASE_URL").map_err(|_| {
            AgentError::Configuration("WEBPILOT_BASE_URL must be set in the environment".into())
        })?;
        let api_key = env::var("WEBPILOT_API_KEY").map_err(|_| {
            AgentError::Configuration("WEBPILOT_API_KEY must be set in the environment".into())
        })?;
        Ok(Self::new(host, api_key))
    }
}

/// Model used for text decision making unless an agent overrides it.
pub fn default_model() -> String {
    env::var("WEBPILOT_MODEL").unwrap_or_else(|_| "qwen3-32b".to_string())
}

/// Model used by the vision sub-agents.
pub fn default_vision_model() -> String {
    env::var("WEBPILOT_VISION_MODEL").unwrap_or_else(|_| "internvl2.5-8b".to_string())
}
