//! # Configuration
//!
//! The runtime is configured by a single TOML file read once at startup.
//! A missing or malformed file is a fatal startup error.
//!
//! ```toml
//! [model]
//! model = "gpt-4o-mini"
//!
//! [agent]
//! max_tool_uses = 1
//!
//! [[servers]]
//! name = "search"
//! command = "python"
//! args = ["mcpservers/bravesearch.py"]
//! ```

pub mod agent;
pub mod app;
pub mod defaults;
pub mod error;
pub mod loader;
pub mod model;
pub mod server;

pub use crate::constants::CONFIG_PATH;

pub use agent::AgentConfig;
pub use app::AppConfig;
pub use error::ConfigError;
pub use model::ModelConfig;
pub use server::ServerConfig;
