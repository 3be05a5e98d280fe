use std::time::Duration;
use thiserror::Error;

/// Transport-level failures talking to one tool server.
#[derive(Debug, Error)]
pub enum ToolInvokeError {
    #[error("failed to spawn tool server '{server}': {source}")]
    Spawn {
        server: String,
        #[source]
        source: std::io::Error,
    },
    #[error("tool server '{server}' transport error: {message}")]
    Transport { server: String, message: String },
    #[error("tool server '{server}' returned invalid JSON: {source}")]
    InvalidJson {
        server: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("tool server '{server}' returned JSON-RPC error {code}: {message}")]
    Rpc {
        server: String,
        code: i64,
        message: String,
    },
    #[error("tool server '{server}' terminated unexpectedly")]
    Terminated { server: String },
    #[error("tool server '{server}' request cancelled")]
    Cancelled { server: String },
    #[error("tool server '{server}' did not answer within {timeout:?}")]
    Timeout { server: String, timeout: Duration },
}

/// A tool server that could not be brought up. The rest of the catalog is unaffected.
#[derive(Debug, Error)]
#[error("failed to connect tool server '{server}': {source}")]
pub struct ConnectError {
    pub server: String,
    #[source]
    pub source: ToolInvokeError,
}

/// Failure of a routed tool call, as seen by the agent loop.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("tool server '{server}' is not connected")]
    ServerNotFound { server: String },
    #[error("tool '{tool}' on server '{server}' failed: {source}")]
    ToolInvocationFailed {
        server: String,
        tool: String,
        #[source]
        source: ToolInvokeError,
    },
}

impl ToolError {
    /// Text folded into the conversation so the model can react to the failure.
    pub fn user_message(&self) -> String {
        match self {
            ToolError::ServerNotFound { server } => {
                format!("Tool server '{server}' is not available.")
            }
            ToolError::ToolInvocationFailed {
                server,
                tool,
                source,
            } => format!("Error calling tool '{tool}' on server '{server}': {source}"),
        }
    }
}
