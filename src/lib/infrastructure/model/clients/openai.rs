//! OpenAI-compatible client implementation

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::env;
use tracing::{debug, info, warn};

use super::base::HttpClientBase;
use crate::config::ModelConfig;
use crate::infrastructure::model::traits::ModelProvider;
use crate::infrastructure::model::types::ModelError;
use crate::types::ChatMessage;

const CHAT_COMPLETIONS_PATH: &str = "chat/completions";

/// OpenAI-compatible chat completion client
#[derive(Clone)]
pub struct OpenAIClient {
    base: HttpClientBase,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl OpenAIClient {
    pub fn from_config(config: &ModelConfig) -> Result<Self, ModelError> {
        let api_key = resolve_api_key(&config.api_key_env);
        Ok(Self {
            base: HttpClientBase::new(
                config.endpoint.clone(),
                config.api_key_env.clone(),
                api_key,
                config.timeout,
            )?,
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        })
    }
}

/// Resolve API key from environment variable
fn resolve_api_key(env_var: &str) -> Option<String> {
    let name = env_var.trim();
    if name.is_empty() {
        return None;
    }
    match env::var(name) {
        Ok(value) => Some(value),
        Err(err) => {
            warn!(env_var = name, %err, "API key environment variable is not set");
            None
        }
    }
}

#[async_trait]
impl ModelProvider for OpenAIClient {
    async fn invoke(&self, messages: &[ChatMessage]) -> Result<String, ModelError> {
        let url = self.base.build_url(CHAT_COMPLETIONS_PATH);

        let payload = OpenAIRequest {
            model: &self.model,
            messages: messages
                .iter()
                .map(|msg| OpenAIMessageRef {
                    role: msg.role.as_str(),
                    content: &msg.content,
                })
                .collect(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        info!(
            model = self.model.as_str(),
            messages = messages.len(),
            "Sending request to OpenAI-compatible endpoint"
        );

        let response: OpenAIResponse = self.base.post_with_bearer(&url, &payload).await?;
        debug!("Received response from OpenAI-compatible endpoint");

        response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .and_then(|m| m.content)
            .ok_or_else(|| ModelError::invalid_response(&self.base.endpoint, "missing content"))
    }
}

#[derive(Serialize)]
struct OpenAIRequest<'a> {
    model: &'a str,
    messages: Vec<OpenAIMessageRef<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct OpenAIMessageRef<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
}

#[derive(Deserialize)]
struct OpenAIChoice {
    message: Option<OpenAIMessage>,
}

#[derive(Deserialize)]
struct OpenAIMessage {
    content: Option<String>,
}
