use super::decision::{Decision, NeedTool, parse_decision};
use super::errors::AgentError;
use super::prompt::PromptAssembler;
use super::state::ConversationState;
use super::usage::{UsageGrant, limit_reached_message};
use super::window::WindowPolicy;
use crate::application::tooling::ToolSessionManager;
use crate::config::AgentConfig;
use crate::config::defaults::DEFAULT_MAX_DECISIONS;
use crate::constants::FALLBACK_ANSWER;
use crate::model::ModelProvider;
use serde_json::{Map as JsonMap, Value};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Per-loop policy derived from `[agent]` configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgentOptions {
    pub window: WindowPolicy,
    /// Decide steps allowed per turn.
    pub max_decisions: usize,
}

impl Default for AgentOptions {
    fn default() -> Self {
        Self {
            window: WindowPolicy::default(),
            max_decisions: DEFAULT_MAX_DECISIONS,
        }
    }
}

impl From<&AgentConfig> for AgentOptions {
    fn from(config: &AgentConfig) -> Self {
        Self {
            window: WindowPolicy::from(config),
            max_decisions: config.max_decisions.max(1),
        }
    }
}

/// A validated tool request, ready for the Calling step.
#[derive(Debug, Clone, PartialEq)]
struct ToolRequest {
    server: String,
    tool: String,
    arguments: JsonMap<String, Value>,
}

impl ToolRequest {
    /// Fails closed with text for the model when the request is incomplete.
    fn from_decision(decision: Decision) -> Result<Self, String> {
        let (Some(server), Some(tool)) = (decision.tool_server, decision.tool_name) else {
            return Err(
                "Tool request rejected: both tool_server and tool must be provided.".to_string(),
            );
        };
        let Some(arguments) = decision.tool_arguments else {
            return Err(format!(
                "Tool request for {tool} on {server} rejected: tool_args must be a JSON object."
            ));
        };
        Ok(Self {
            server,
            tool,
            arguments,
        })
    }
}

enum LoopState {
    Deciding,
    Calling(ToolRequest),
    Finalized(String),
}

/// Drives one turn through Decide → (Call → Decide)* → Finalize.
pub struct AgentLoop<P: ModelProvider> {
    provider: P,
    tools: Arc<ToolSessionManager>,
    prompts: Arc<PromptAssembler>,
    options: AgentOptions,
}

impl<P: ModelProvider> AgentLoop<P> {
    pub fn new(provider: P, tools: Arc<ToolSessionManager>, prompts: Arc<PromptAssembler>) -> Self {
        Self {
            provider,
            tools,
            prompts,
            options: AgentOptions::default(),
        }
    }

    pub fn with_options(mut self, options: AgentOptions) -> Self {
        self.options = options;
        self
    }

    pub fn tools(&self) -> &Arc<ToolSessionManager> {
        &self.tools
    }

    /// Run one user turn to completion.
    ///
    /// Only a model transport failure ends the turn early; the state is then
    /// left as it was for a retry on the next turn.
    pub async fn run_turn(
        &self,
        user_input: impl Into<String>,
        state: &mut ConversationState,
    ) -> Result<String, AgentError> {
        state.begin_turn(user_input.into());
        info!(history = state.history().len(), "Agent turn started");

        let mut decisions = 0usize;
        let mut step = LoopState::Deciding;
        loop {
            step = match step {
                LoopState::Deciding if decisions >= self.options.max_decisions => {
                    warn!(decisions, "Agent turn hit the decision cap");
                    finish(
                        state,
                        format!(
                            "I stopped after {decisions} steps without reaching a final answer. Please try rephrasing your request."
                        ),
                    )
                }
                LoopState::Deciding => {
                    decisions += 1;
                    self.decide(state).await?
                }
                LoopState::Calling(request) => {
                    self.call(request, state).await;
                    LoopState::Deciding
                }
                LoopState::Finalized(answer) => {
                    info!(decisions, "Agent turn finalized");
                    state.finalize(answer.clone());
                    return Ok(answer);
                }
            };
        }
    }

    async fn decide(&self, state: &mut ConversationState) -> Result<LoopState, AgentError> {
        let window = self.options.window;
        let history_len = state.history().len();
        let system_prompt = if window.sends_system_prompt(history_len) {
            Some(self.prompts.render(&self.tools.catalog().await))
        } else {
            None
        };
        let messages = window.assemble(system_prompt.as_deref(), state.history(), state.user_input());
        debug!(
            history = history_len,
            messages = messages.len(),
            system_prompt = system_prompt.is_some(),
            "Invoking language model"
        );

        let raw = self.provider.invoke(&messages).await?;
        let decision = parse_decision(&raw);
        debug!(need_tool = ?decision.need_tool, "Parsed model decision");

        match decision.need_tool {
            NeedTool::Yes => {
                if !decision.response_text.is_empty() {
                    state.push_assistant(decision.response_text.clone());
                }
                match ToolRequest::from_decision(decision) {
                    Ok(request) => Ok(LoopState::Calling(request)),
                    Err(rejection) => {
                        warn!(%rejection, "Rejected malformed tool request");
                        state.push_assistant(rejection);
                        Ok(LoopState::Deciding)
                    }
                }
            }
            NeedTool::No | NeedTool::Unknown => Ok(finish(state, decision.response_text)),
        }
    }

    async fn call(&self, request: ToolRequest, state: &mut ConversationState) {
        let ToolRequest {
            server,
            tool,
            arguments,
        } = request;

        let text = match state.acquire_tool_use(&server, &tool) {
            UsageGrant::Exhausted { limit } => {
                let message = limit_reached_message(&tool, limit);
                warn!(server = %server, tool = %tool, "{message}");
                message
            }
            UsageGrant::Granted { count, limit } => {
                info!(server = %server, tool = %tool, "Tool usage {count}/{limit}");
                match self.tools.call_tool(&server, &tool, arguments.clone()).await {
                    Ok(result) => {
                        if result.is_error {
                            warn!(server = %server, tool = %tool, "Tool reported an error result");
                        }
                        let text = result.text();
                        debug!(server = %server, tool = %tool, response = %text, "Tool response");
                        text
                    }
                    Err(err) => err.user_message(),
                }
            }
        };

        state.push_tool_result(&server, &tool, &arguments, &text);
    }
}

/// Record the answer as the closing assistant turn. Never leaves it empty.
fn finish(state: &mut ConversationState, answer: String) -> LoopState {
    let answer = if answer.trim().is_empty() {
        FALLBACK_ANSWER.to_string()
    } else {
        answer
    };
    state.push_assistant(answer.clone());
    LoopState::Finalized(answer)
}
