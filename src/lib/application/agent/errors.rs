use crate::constants::FALLBACK_ANSWER;
use crate::model::ModelError;
use thiserror::Error;

/// Failures that end a turn. Everything else is folded into the conversation.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("language model unreachable: {0}")]
    ModelUnreachable(#[from] ModelError),
}

impl AgentError {
    /// What the person at the other end sees instead of an answer.
    pub fn user_message(&self) -> String {
        FALLBACK_ANSWER.to_string()
    }

    /// Operator-facing cause, for logs.
    pub fn detail(&self) -> String {
        match self {
            AgentError::ModelUnreachable(err) => err.user_message(),
        }
    }
}
