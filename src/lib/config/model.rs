use super::defaults::{
    DEFAULT_API_KEY_ENV, DEFAULT_MAX_TOKENS, DEFAULT_MODEL, DEFAULT_MODEL_ENDPOINT,
    DEFAULT_MODEL_TIMEOUT_SECS, DEFAULT_TEMPERATURE, ENDPOINT_ENV,
};
use serde::Deserialize;
use std::env;
use std::time::Duration;

/// Settings for the OpenAI-compatible chat completion endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelConfig {
    pub endpoint: String,
    /// Name of the environment variable that holds the API key.
    pub api_key_env: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout: Duration,
}

impl Default for ModelConfig {
    fn default() -> Self {
        ModelConfig::from(RawModel::default())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct RawModel {
    endpoint: Option<String>,
    api_key: Option<String>,
    model: Option<String>,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
    timeout_secs: Option<u64>,
}

impl From<RawModel> for ModelConfig {
    fn from(raw: RawModel) -> Self {
        let endpoint = raw
            .endpoint
            .or_else(|| env::var(ENDPOINT_ENV).ok())
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_MODEL_ENDPOINT.to_string());

        Self {
            endpoint,
            api_key_env: raw
                .api_key
                .unwrap_or_else(|| DEFAULT_API_KEY_ENV.to_string()),
            model: raw.model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            temperature: raw.temperature.unwrap_or(DEFAULT_TEMPERATURE),
            max_tokens: raw.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            timeout: Duration::from_secs(raw.timeout_secs.unwrap_or(DEFAULT_MODEL_TIMEOUT_SECS)),
        }
    }
}
