//! Application constants
//!
//! Single source of truth for paths and other constants.

/// Default configuration file path
pub const CONFIG_PATH: &str = "config/agent.toml";

/// Default environment file path
pub const ENV_PATH: &str = ".env";

/// Answer shown to the user when a turn cannot produce one.
pub const FALLBACK_ANSWER: &str =
    "I apologize, but I wasn't able to generate a response. Please try again.";
