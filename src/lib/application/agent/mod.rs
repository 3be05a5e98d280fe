//! # Agent Module
//!
//! The decision loop that sits between the language model and the tool
//! servers.
//!
//! ## Key Types
//!
//! - [`AgentLoop`] - runs one turn: Decide → (Call → Decide)* → Finalize
//! - [`ConversationState`] - history, usage counters and the final answer
//! - [`PromptAssembler`] - renders the system prompt from the tool catalog
//! - [`Decision`] - structured reading of one model reply ([`parse_decision`])
//! - [`WindowPolicy`] - how much history is sent on each Decide step
//! - [`AgentError`] - the only failure that ends a turn early
//!
//! ## Agent Loop
//!
//! 1. Assemble the windowed message list and ask the model
//! 2. Parse the reply; prose and malformed JSON become the final answer
//! 3. For a tool request, check the usage limit, call the tool and record the
//!    result in history
//! 4. Repeat until the model answers without a tool call

mod decision;
mod errors;
mod prompt;
mod runner;
mod state;
mod usage;
mod window;


pub use decision::{Decision, NeedTool, parse_decision};
pub use errors::AgentError;
pub use prompt::{PromptAssembler, PromptError, TOOL_SECTION_PLACEHOLDER, format_tool_section};
pub use runner::{AgentLoop, AgentOptions};
pub use state::ConversationState;
pub use usage::{ToolUsage, UsageGrant, limit_reached_message};
pub use window::WindowPolicy;
