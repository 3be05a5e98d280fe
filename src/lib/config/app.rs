use super::agent::AgentConfig;
use super::error::ConfigError;
use super::model::ModelConfig;
use super::server::ServerConfig;
use std::path::Path;

/// Application configuration loaded from agent.toml
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub model: ModelConfig,
    pub agent: AgentConfig,
    pub servers: Vec<ServerConfig>,
}

impl AppConfig {
    /// Load configuration from a file path (or default path if None)
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        super::loader::load_config(path)
    }
}
