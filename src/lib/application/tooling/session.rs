use super::error::ToolInvokeError;
use super::interface::{ToolDescriptor, ToolTransport};
use serde_json::Value;
use std::time::Duration;
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, warn};

/// One live connection to one tool server.
///
/// Calls go through an async mutex so at most one is in flight per server;
/// concurrent callers queue on the lock. A call that times out or whose future
/// is dropped releases the lock for the next caller.
pub struct ToolSession {
    name: String,
    capabilities: Vec<ToolDescriptor>,
    transport: Box<dyn ToolTransport>,
    in_flight: AsyncMutex<()>,
    call_timeout: Duration,
}

impl ToolSession {
    /// Discover capabilities over an already-open transport.
    pub async fn establish(
        name: impl Into<String>,
        transport: Box<dyn ToolTransport>,
        call_timeout: Duration,
    ) -> Result<Self, ToolInvokeError> {
        let name = name.into();
        let capabilities = match tokio::time::timeout(call_timeout, transport.list_capabilities())
            .await
        {
            Ok(Ok(capabilities)) => capabilities,
            Ok(Err(err)) => {
                let _ = transport.close().await;
                return Err(err);
            }
            Err(_) => {
                let _ = transport.close().await;
                return Err(ToolInvokeError::Timeout {
                    server: name,
                    timeout: call_timeout,
                });
            }
        };
        debug!(server = %name, tools = capabilities.len(), "Tool catalog discovered");

        Ok(Self {
            name,
            capabilities,
            transport,
            in_flight: AsyncMutex::new(()),
            call_timeout,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn capabilities(&self) -> &[ToolDescriptor] {
        &self.capabilities
    }

    pub async fn call(&self, tool: &str, arguments: Value) -> Result<Value, ToolInvokeError> {
        let _turn = self.in_flight.lock().await;
        match tokio::time::timeout(self.call_timeout, self.transport.call_tool(tool, arguments))
            .await
        {
            Ok(outcome) => outcome,
            Err(_) => Err(ToolInvokeError::Timeout {
                server: self.name.clone(),
                timeout: self.call_timeout,
            }),
        }
    }

    /// Waits for any in-flight call, bounded by the call timeout, then closes
    /// the transport. A call still running after that is cut off.
    pub async fn close(&self) -> Result<(), ToolInvokeError> {
        let _turn = match tokio::time::timeout(self.call_timeout, self.in_flight.lock()).await {
            Ok(guard) => Some(guard),
            Err(_) => {
                warn!(server = %self.name, "Closing tool session with a call still in flight");
                None
            }
        };
        self.transport.close().await
    }
}
