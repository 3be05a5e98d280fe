use super::usage::{ToolUsage, UsageGrant};
use crate::config::defaults::DEFAULT_MAX_TOOL_USES;
use crate::types::ChatMessage;
use serde_json::{Map as JsonMap, Value};
use std::collections::HashMap;

/// Mutable record of one conversation, owned by whichever turn is running.
///
/// `final_answer` is only ever set by the loop reaching its terminal state and
/// is cleared when the next turn begins.
#[derive(Debug, Clone)]
pub struct ConversationState {
    user_input: String,
    chat_history: Vec<ChatMessage>,
    tool_usage: ToolUsage,
    max_tool_uses: u32,
    final_answer: Option<String>,
}

impl Default for ConversationState {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_TOOL_USES)
    }
}

impl ConversationState {
    pub fn new(max_tool_uses: u32) -> Self {
        Self {
            user_input: String::new(),
            chat_history: Vec::new(),
            tool_usage: ToolUsage::default(),
            max_tool_uses,
            final_answer: None,
        }
    }

    /// Seed the state with earlier conversation entries.
    pub fn with_history(mut self, history: Vec<ChatMessage>) -> Self {
        self.chat_history = history;
        self
    }

    pub fn user_input(&self) -> &str {
        &self.user_input
    }

    pub fn history(&self) -> &[ChatMessage] {
        &self.chat_history
    }

    pub fn final_answer(&self) -> Option<&str> {
        self.final_answer.as_deref()
    }

    pub fn tool_usage_counts(&self) -> &HashMap<String, HashMap<String, u32>> {
        self.tool_usage.counts()
    }

    pub fn usage_count(&self, server: &str, tool: &str) -> u32 {
        self.tool_usage.count(server, tool)
    }

    pub fn tool_results(&self) -> impl Iterator<Item = &ChatMessage> {
        self.chat_history.iter().filter(|msg| msg.is_tool_result())
    }

    /// Drop history and counters, keeping the configured limit.
    pub fn reset(&mut self) {
        *self = Self::new(self.max_tool_uses);
    }

    pub(crate) fn begin_turn(&mut self, user_input: String) {
        self.user_input = user_input;
        self.final_answer = None;
    }

    pub(crate) fn acquire_tool_use(&mut self, server: &str, tool: &str) -> UsageGrant {
        self.tool_usage.try_acquire(server, tool, self.max_tool_uses)
    }

    pub(crate) fn push_assistant(&mut self, content: impl Into<String>) {
        self.chat_history.push(ChatMessage::assistant(content));
    }

    pub(crate) fn push_tool_result(
        &mut self,
        server: &str,
        tool: &str,
        arguments: &JsonMap<String, Value>,
        result: &str,
    ) {
        let arguments = Value::Object(arguments.clone());
        let content =
            format!("Tool result from {server} {tool} using {arguments} below:\n{result}");
        self.chat_history.push(ChatMessage::tool_result(server, tool, content));
    }

    pub(crate) fn finalize(&mut self, answer: String) {
        self.final_answer = Some(answer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn begin_turn_clears_previous_answer_but_keeps_history() {
        let mut state = ConversationState::default();
        state.begin_turn("first".into());
        state.push_assistant("hello");
        state.finalize("hello".into());
        assert_eq!(state.final_answer(), Some("hello"));

        state.begin_turn("second".into());
        assert_eq!(state.user_input(), "second");
        assert!(state.final_answer().is_none());
        assert_eq!(state.history().len(), 1);
    }

    #[test]
    fn tool_result_entry_is_tagged_and_describes_the_call() {
        let mut state = ConversationState::default();
        let mut args = JsonMap::new();
        args.insert("q".into(), json!("x"));

        state.push_tool_result("search", "web_search", &args, "result A");

        let entry = state.tool_results().next().expect("one tool result");
        let origin = entry.tool_origin.as_ref().expect("tagged");
        assert_eq!(origin.server, "search");
        assert_eq!(origin.tool, "web_search");
        assert_eq!(
            entry.content,
            "Tool result from search web_search using {\"q\":\"x\"} below:\nresult A"
        );
    }

    #[test]
    fn reset_keeps_configured_limit() {
        let mut state = ConversationState::new(3);
        state.acquire_tool_use("search", "web_search");
        state.push_assistant("x");
        state.reset();
        assert!(state.history().is_empty());
        assert_eq!(state.usage_count("search", "web_search"), 0);
        for count in 1..=3 {
            assert_eq!(
                state.acquire_tool_use("search", "web_search"),
                UsageGrant::Granted { count, limit: 3 }
            );
        }
    }
}
