use super::defaults::{
    DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_HISTORY_WINDOW, DEFAULT_MAX_DECISIONS,
    DEFAULT_MAX_TOOL_USES, DEFAULT_PROMPT_TEMPLATE_PATH, DEFAULT_TOOL_TIMEOUT_SECS,
};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Knobs for the agent loop and the tool sessions it drives.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentConfig {
    /// Ceiling per (server, tool) pair for one conversation.
    pub max_tool_uses: u32,
    /// History length above which only the newest entries are sent.
    pub history_window: usize,
    /// Keep sending the system prompt even once the history is windowed.
    pub keep_system_prompt: bool,
    /// Decide steps allowed in one turn before it is cut short.
    pub max_decisions: usize,
    pub prompt_template: PathBuf,
    pub tool_timeout: Duration,
    pub connect_timeout: Duration,
    /// Carry history and usage counters from one turn to the next.
    pub persist_history: bool,
}

impl Default for AgentConfig {
    fn default() -> Self {
        AgentConfig::from(RawAgent::default())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct RawAgent {
    max_tool_uses: Option<u32>,
    history_window: Option<usize>,
    keep_system_prompt: Option<bool>,
    max_decisions: Option<usize>,
    prompt_template: Option<String>,
    tool_timeout_secs: Option<u64>,
    connect_timeout_secs: Option<u64>,
    persist_history: Option<bool>,
}

impl From<RawAgent> for AgentConfig {
    fn from(raw: RawAgent) -> Self {
        let prompt_template = raw
            .prompt_template
            .map(|path| {
                shellexpand::full(&path)
                    .map(|cow| cow.into_owned())
                    .unwrap_or(path)
            })
            .unwrap_or_else(|| DEFAULT_PROMPT_TEMPLATE_PATH.to_string());

        Self {
            max_tool_uses: raw.max_tool_uses.unwrap_or(DEFAULT_MAX_TOOL_USES),
            history_window: raw.history_window.unwrap_or(DEFAULT_HISTORY_WINDOW),
            keep_system_prompt: raw.keep_system_prompt.unwrap_or(false),
            max_decisions: raw.max_decisions.unwrap_or(DEFAULT_MAX_DECISIONS).max(1),
            prompt_template: PathBuf::from(prompt_template),
            tool_timeout: Duration::from_secs(
                raw.tool_timeout_secs.unwrap_or(DEFAULT_TOOL_TIMEOUT_SECS),
            ),
            connect_timeout: Duration::from_secs(
                raw.connect_timeout_secs.unwrap_or(DEFAULT_CONNECT_TIMEOUT_SECS),
            ),
            persist_history: raw.persist_history.unwrap_or(true),
        }
    }
}
