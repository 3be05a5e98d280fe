use super::agent::{AgentLoop, ConversationState};
use crate::model::ModelProvider;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// One user's conversation with the agent.
///
/// Turns never fail from the caller's point of view: a model outage becomes
/// the generic fallback answer and the state is kept for the next attempt.
pub struct ChatSession<P: ModelProvider> {
    id: String,
    agent: Arc<AgentLoop<P>>,
    state: ConversationState,
    persist_history: bool,
}

impl<P: ModelProvider> ChatSession<P> {
    pub fn new(agent: Arc<AgentLoop<P>>, max_tool_uses: u32) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            agent,
            state: ConversationState::new(max_tool_uses),
            persist_history: true,
        }
    }

    /// Start every turn from a fresh state instead of carrying history and
    /// usage counters forward.
    pub fn with_persistence(mut self, persist_history: bool) -> Self {
        self.persist_history = persist_history;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn state(&self) -> &ConversationState {
        &self.state
    }

    pub fn agent(&self) -> &Arc<AgentLoop<P>> {
        &self.agent
    }

    pub async fn respond(&mut self, user_input: &str) -> String {
        if !self.persist_history {
            self.state.reset();
        }

        match self.agent.run_turn(user_input, &mut self.state).await {
            Ok(answer) => answer,
            Err(err) => {
                warn!(session = %self.id, error = %err, detail = %err.detail(), "Turn failed");
                err.user_message()
            }
        }
    }

    /// Forget the conversation and take a new session id.
    pub fn reset(&mut self) {
        self.state.reset();
        self.id = Uuid::new_v4().to_string();
        info!(session = %self.id, "Chat session reset");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::agent::PromptAssembler;
    use crate::application::tooling::ToolSessionManager;
    use crate::application::tooling::{ToolInvokeError, ToolTransport, TransportConnector};
    use crate::config::ServerConfig;
    use crate::constants::FALLBACK_ANSWER;
    use crate::model::ModelError;
    use crate::types::ChatMessage;
    use async_trait::async_trait;
    use tokio::sync::Mutex;

    struct Replies(Mutex<Vec<Result<&'static str, &'static str>>>);

    #[async_trait]
    impl ModelProvider for Replies {
        async fn invoke(&self, _messages: &[ChatMessage]) -> Result<String, ModelError> {
            let mut replies = self.0.lock().await;
            match replies.remove(0) {
                Ok(reply) => Ok(reply.to_string()),
                Err(reason) => Err(ModelError::invalid_response("test", reason)),
            }
        }
    }

    struct NoServers;

    #[async_trait]
    impl TransportConnector for NoServers {
        async fn connect(
            &self,
            config: &ServerConfig,
        ) -> Result<Box<dyn ToolTransport>, ToolInvokeError> {
            Err(ToolInvokeError::Terminated {
                server: config.name.clone(),
            })
        }
    }

    fn session(replies: Vec<Result<&'static str, &'static str>>) -> ChatSession<Replies> {
        let agent = AgentLoop::new(
            Replies(Mutex::new(replies)),
            Arc::new(ToolSessionManager::new(Arc::new(NoServers))),
            Arc::new(PromptAssembler::embedded()),
        );
        ChatSession::new(Arc::new(agent), 1)
    }

    #[tokio::test]
    async fn model_failure_yields_fallback_text() {
        let mut chat = session(vec![Err("down")]);
        assert_eq!(chat.respond("hello").await, FALLBACK_ANSWER);
        assert!(chat.state().final_answer().is_none());
    }

    #[tokio::test]
    async fn history_persists_across_turns_by_default() {
        let mut chat = session(vec![Ok("first"), Ok("second")]);
        assert_eq!(chat.respond("one").await, "first");
        assert_eq!(chat.respond("two").await, "second");
        assert_eq!(chat.state().history().len(), 2);
    }

    #[tokio::test]
    async fn fresh_state_per_turn_when_not_persisting() {
        let mut chat = session(vec![Ok("first"), Ok("second")]).with_persistence(false);
        chat.respond("one").await;
        chat.respond("two").await;
        assert_eq!(chat.state().history().len(), 1);
    }

    #[tokio::test]
    async fn reset_takes_a_new_id() {
        let mut chat = session(vec![Ok("first")]);
        chat.respond("one").await;
        let before = chat.id().to_string();
        chat.reset();
        assert_ne!(chat.id(), before);
        assert!(chat.state().history().is_empty());
    }
}
