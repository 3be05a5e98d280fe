//! # Tooling
//!
//! Connections to external tool servers. A [`ToolSessionManager`] owns one
//! [`ToolSession`] per connected server and dispatches calls by server name;
//! each session talks to its server through a [`ToolTransport`].

mod error;
mod interface;
mod manager;
mod process;
mod session;

pub use error::{ConnectError, ToolError, ToolInvokeError};
pub use interface::{ToolDescriptor, ToolResult, ToolTransport, TransportConnector};
pub use manager::{Catalog, ToolSessionManager};
pub use process::{McpProcess, StdioConnector};
pub use session::ToolSession;
