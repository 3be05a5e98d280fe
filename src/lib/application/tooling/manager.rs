use super::error::{ConnectError, ToolError, ToolInvokeError};
use super::interface::{ToolDescriptor, ToolResult, TransportConnector};
use super::process::StdioConnector;
use super::session::ToolSession;
use crate::config::ServerConfig;
use crate::config::defaults::{DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_TOOL_TIMEOUT_SECS};
use futures::future::join_all;
use serde_json::{Map as JsonMap, Value};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Server name to advertised tools, ordered by server name.
pub type Catalog = BTreeMap<String, Vec<ToolDescriptor>>;

/// Owns every tool-server session and routes calls by server name.
///
/// Connect and call failures are isolated per server: a server that fails to
/// come up is simply absent, and a failing call is returned as a value.
pub struct ToolSessionManager {
    connector: Arc<dyn TransportConnector>,
    sessions: RwLock<HashMap<String, Arc<ToolSession>>>,
    connect_timeout: Duration,
    call_timeout: Duration,
}

impl ToolSessionManager {
    pub fn new(connector: Arc<dyn TransportConnector>) -> Self {
        Self {
            connector,
            sessions: RwLock::new(HashMap::new()),
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            call_timeout: Duration::from_secs(DEFAULT_TOOL_TIMEOUT_SECS),
        }
    }

    /// Manager that launches servers as local child processes.
    pub fn stdio() -> Self {
        Self::new(Arc::new(StdioConnector))
    }

    pub fn with_timeouts(mut self, connect_timeout: Duration, call_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self.call_timeout = call_timeout;
        self
    }

    /// Connect every configured server independently.
    ///
    /// Successful sessions are kept even when others fail; the failures are
    /// returned so the caller can decide whether a partial catalog is enough.
    pub async fn connect_all(&self, configs: &[ServerConfig]) -> Result<(), Vec<ConnectError>> {
        let mut failures = Vec::new();
        let mut pending = Vec::new();
        {
            let sessions = self.sessions.read().await;
            let mut seen = HashSet::new();
            for config in configs {
                if sessions.contains_key(&config.name) || !seen.insert(config.name.as_str()) {
                    failures.push(ConnectError {
                        server: config.name.clone(),
                        source: ToolInvokeError::Transport {
                            server: config.name.clone(),
                            message: "a session with this name is already connected".into(),
                        },
                    });
                } else {
                    pending.push(config);
                }
            }
        }

        let outcomes = join_all(pending.into_iter().map(|config| self.connect_one(config))).await;

        let mut sessions = self.sessions.write().await;
        for outcome in outcomes {
            match outcome {
                Ok(session) => {
                    info!(
                        server = session.name(),
                        tools = session.capabilities().len(),
                        "Tool server connected"
                    );
                    sessions.insert(session.name().to_string(), Arc::new(session));
                }
                Err(err) => {
                    warn!(server = %err.server, error = %err.source, "Tool server failed to connect");
                    failures.push(err);
                }
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(failures)
        }
    }

    async fn connect_one(&self, config: &ServerConfig) -> Result<ToolSession, ConnectError> {
        let wrap = |source| ConnectError {
            server: config.name.clone(),
            source,
        };

        debug!(server = %config.name, command = %config.command.display(), "Connecting tool server");
        let transport = tokio::time::timeout(self.connect_timeout, self.connector.connect(config))
            .await
            .map_err(|_| {
                wrap(ToolInvokeError::Timeout {
                    server: config.name.clone(),
                    timeout: self.connect_timeout,
                })
            })?
            .map_err(wrap)?;

        ToolSession::establish(config.name.clone(), transport, self.call_timeout)
            .await
            .map_err(wrap)
    }

    /// Route a call to the named server. Never panics or propagates transport
    /// failures past this point; every outcome is a value.
    pub async fn call_tool(
        &self,
        server: &str,
        tool: &str,
        arguments: JsonMap<String, Value>,
    ) -> Result<ToolResult, ToolError> {
        let session = self
            .sessions
            .read()
            .await
            .get(server)
            .cloned()
            .ok_or_else(|| ToolError::ServerNotFound {
                server: server.to_string(),
            })?;

        debug!(server, tool, "Dispatching tool call");
        match session.call(tool, Value::Object(arguments)).await {
            Ok(output) => Ok(ToolResult::new(server, tool, output)),
            Err(source) => {
                warn!(server, tool, %source, "Tool call failed");
                Err(ToolError::ToolInvocationFailed {
                    server: server.to_string(),
                    tool: tool.to_string(),
                    source,
                })
            }
        }
    }

    /// Snapshot of every connected server's tools.
    pub async fn catalog(&self) -> Catalog {
        self.sessions
            .read()
            .await
            .iter()
            .map(|(name, session)| (name.clone(), session.capabilities().to_vec()))
            .collect()
    }

    /// Close every session. One session failing to close does not stop the others.
    pub async fn shutdown(&self) {
        let drained: Vec<Arc<ToolSession>> = {
            let mut sessions = self.sessions.write().await;
            sessions.drain().map(|(_, session)| session).collect()
        };
        if drained.is_empty() {
            return;
        }

        info!(sessions = drained.len(), "Shutting down tool sessions");
        let closes = drained.iter().map(|session| async move {
            match session.close().await {
                Ok(()) => info!(server = session.name(), "Tool session closed"),
                Err(err) => warn!(server = session.name(), %err, "Failed to close tool session"),
            }
        });
        join_all(closes).await;
    }
}
