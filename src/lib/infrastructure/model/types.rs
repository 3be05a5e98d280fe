//! Model error type

use reqwest::StatusCode;
use thiserror::Error;

/// Model errors
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("model endpoint '{endpoint}' requires an API key in ${env_var}")]
    MissingApiKey { endpoint: String, env_var: String },
    #[error("network error calling model endpoint '{endpoint}': {source}")]
    Network {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("model endpoint '{endpoint}' returned invalid response: {reason}")]
    InvalidResponse { endpoint: String, reason: String },
}

impl ModelError {
    pub fn missing_api_key(endpoint: impl Into<String>, env_var: impl Into<String>) -> Self {
        Self::MissingApiKey {
            endpoint: endpoint.into(),
            env_var: env_var.into(),
        }
    }

    pub fn network(endpoint: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            endpoint: endpoint.into(),
            source,
        }
    }

    pub fn invalid_response(endpoint: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidResponse {
            endpoint: endpoint.into(),
            reason: reason.into(),
        }
    }

    /// Short description suitable for logs shown next to the fallback answer.
    pub fn user_message(&self) -> String {
        match self {
            ModelError::MissingApiKey { env_var, .. } => {
                format!("The language model is not configured: set {env_var}.")
            }
            ModelError::Network { source, .. } => {
                if source.is_connect() {
                    "Could not connect to the language model.".to_string()
                } else if source.is_timeout() {
                    "The language model did not answer in time.".to_string()
                } else if let Some(status) = source.status() {
                    match status {
                        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                            "The language model rejected the API key.".to_string()
                        }
                        StatusCode::TOO_MANY_REQUESTS => {
                            "The language model is rate limiting requests.".to_string()
                        }
                        StatusCode::SERVICE_UNAVAILABLE | StatusCode::BAD_GATEWAY => {
                            "The language model is temporarily unavailable.".to_string()
                        }
                        _ => format!("The language model request failed ({}).", status.as_u16()),
                    }
                } else {
                    "Network error while calling the language model.".to_string()
                }
            }
            ModelError::InvalidResponse { .. } => {
                "The language model returned an unreadable response.".to_string()
            }
        }
    }
}
