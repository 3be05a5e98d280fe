//! # Application Module
//!
//! Core logic of the agent runtime.
//!
//! ## Submodules
//!
//! - [`agent`] - the decision loop, conversation state and prompt assembly
//! - [`chat`] - session-scoped front-end boundary with fallback answers
//! - [`stdio`] - interactive console front-end
//! - [`tooling`] - tool-server sessions and MCP stdio transport

pub mod agent;
pub mod chat;
pub mod stdio;
pub mod tooling;
