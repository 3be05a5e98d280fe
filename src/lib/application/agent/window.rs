use crate::config::AgentConfig;
use crate::config::defaults::DEFAULT_HISTORY_WINDOW;
use crate::types::ChatMessage;

/// How much conversation history is sent to the model on each Decide step.
///
/// Up to `threshold` entries the full history goes out behind the system
/// prompt. Past it only the newest `threshold` entries are sent, and the
/// system prompt is dropped unless `keep_system_prompt` is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowPolicy {
    pub threshold: usize,
    pub keep_system_prompt: bool,
}

impl Default for WindowPolicy {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_HISTORY_WINDOW,
            keep_system_prompt: false,
        }
    }
}

impl From<&AgentConfig> for WindowPolicy {
    fn from(config: &AgentConfig) -> Self {
        Self {
            threshold: config.history_window,
            keep_system_prompt: config.keep_system_prompt,
        }
    }
}

impl WindowPolicy {
    pub fn is_windowed(&self, history_len: usize) -> bool {
        history_len > self.threshold
    }

    pub fn sends_system_prompt(&self, history_len: usize) -> bool {
        self.keep_system_prompt || !self.is_windowed(history_len)
    }

    /// Build the message list: optional system prompt, windowed history, then
    /// the current user input.
    pub fn assemble(
        &self,
        system_prompt: Option<&str>,
        history: &[ChatMessage],
        user_input: &str,
    ) -> Vec<ChatMessage> {
        let start = history.len().saturating_sub(self.threshold);
        let recent = &history[start..];

        let mut messages = Vec::with_capacity(recent.len() + 2);
        if let Some(prompt) = system_prompt {
            messages.push(ChatMessage::system(prompt));
        }
        messages.extend(recent.iter().cloned());
        messages.push(ChatMessage::user(user_input));
        messages
    }
}
