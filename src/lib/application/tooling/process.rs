//! Stdio transport: a tool server spawned as a child process speaking
//! newline-delimited JSON-RPC 2.0 (MCP) on stdin/stdout.

use super::error::ToolInvokeError;
use super::interface::{ToolDescriptor, ToolTransport, TransportConnector};
use crate::config::ServerConfig;
use async_trait::async_trait;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::{Mutex as AsyncMutex, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

const PROTOCOL_VERSION: &str = "2025-06-18";
const EXIT_GRACE: Duration = Duration::from_secs(2);

type Responder = oneshot::Sender<Result<Value, ToolInvokeError>>;

/// Spawns tool servers as local child processes.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdioConnector;

#[async_trait]
impl TransportConnector for StdioConnector {
    async fn connect(
        &self,
        config: &ServerConfig,
    ) -> Result<Box<dyn ToolTransport>, ToolInvokeError> {
        let process = McpProcess::spawn(config.clone()).await?;
        Ok(Box::new(process))
    }
}

/// A running tool server.
///
/// The child and the reader task are owned here rather than by the shared
/// inner state, so dropping the process (for example when a connect times out
/// mid-handshake) aborts the reader and kills the child.
pub struct McpProcess {
    inner: Arc<McpProcessInner>,
    child: AsyncMutex<Option<Child>>,
    reader: JoinHandle<()>,
}

struct McpProcessInner {
    server: ServerConfig,
    writer: AsyncMutex<Option<BufWriter<ChildStdin>>>,
    pending: Mutex<HashMap<String, Responder>>,
    id_counter: AtomicU64,
}

/// Removes a pending request entry when the waiting future goes away,
/// whether it completed, timed out or was dropped.
struct PendingSlot<'a> {
    pending: &'a Mutex<HashMap<String, Responder>>,
    id: String,
}

impl Drop for PendingSlot<'_> {
    fn drop(&mut self) {
        if let Ok(mut pending) = self.pending.lock() {
            pending.remove(&self.id);
        }
    }
}

impl McpProcess {
    /// Launch the server and complete the MCP initialize handshake.
    pub async fn spawn(server: ServerConfig) -> Result<Self, ToolInvokeError> {
        let mut command = Command::new(&server.command);
        command
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);
        if let Some(dir) = &server.workdir {
            command.current_dir(dir);
        }
        if !server.args.is_empty() {
            command.args(&server.args);
        }
        for (key, value) in &server.env {
            command.env(key, value);
        }

        let mut child = command.spawn().map_err(|source| ToolInvokeError::Spawn {
            server: server.name.clone(),
            source,
        })?;

        let stdin = child.stdin.take().ok_or_else(|| ToolInvokeError::Transport {
            server: server.name.clone(),
            message: "failed to capture server stdin".into(),
        })?;
        let stdout = child.stdout.take().ok_or_else(|| ToolInvokeError::Transport {
            server: server.name.clone(),
            message: "failed to capture server stdout".into(),
        })?;

        let inner = Arc::new(McpProcessInner {
            server,
            writer: AsyncMutex::new(Some(BufWriter::new(stdin))),
            pending: Mutex::new(HashMap::new()),
            id_counter: AtomicU64::new(1),
        });

        let reader = tokio::spawn(Arc::clone(&inner).reader_loop(stdout));
        let process = Self {
            inner,
            child: AsyncMutex::new(Some(child)),
            reader,
        };

        if let Err(err) = process.inner.initialize_sequence().await {
            process.shutdown().await;
            return Err(err);
        }
        info!(server = %process.inner.server.name, "Tool server process initialised");
        Ok(process)
    }

    /// Close stdin, give the server a moment to exit, then kill it.
    async fn shutdown(&self) {
        let name = &self.inner.server.name;
        self.inner.writer.lock().await.take();

        let mut child = self.child.lock().await;
        if let Some(mut running) = child.take() {
            match tokio::time::timeout(EXIT_GRACE, running.wait()).await {
                Ok(Ok(status)) => {
                    debug!(server = %name, %status, "tool server exited");
                }
                Ok(Err(err)) => {
                    debug!(server = %name, %err, "failed to wait for tool server");
                }
                Err(_) => {
                    if let Err(err) = running.kill().await {
                        debug!(
                            server = %name,
                            %err,
                            "failed to kill tool server process (may have already exited)"
                        );
                    }
                }
            }
        }
        drop(child);

        self.reader.abort();
        self.inner.fail_all_pending();
    }
}

impl Drop for McpProcess {
    fn drop(&mut self) {
        // The child field is dropped next and `kill_on_drop` ends the process.
        self.reader.abort();
    }
}

#[async_trait]
impl ToolTransport for McpProcess {
    async fn list_capabilities(&self) -> Result<Vec<ToolDescriptor>, ToolInvokeError> {
        let result = self.inner.send_request("tools/list", json!({})).await?;
        Ok(parse_tool_list(&result))
    }

    async fn call_tool(&self, tool: &str, arguments: Value) -> Result<Value, ToolInvokeError> {
        let params = json!({
            "name": tool,
            "arguments": match arguments {
                Value::Null => Value::Object(Default::default()),
                other => other,
            }
        });
        self.inner.send_request("tools/call", params).await
    }

    async fn close(&self) -> Result<(), ToolInvokeError> {
        self.shutdown().await;
        Ok(())
    }
}

impl McpProcessInner {
    async fn initialize_sequence(&self) -> Result<(), ToolInvokeError> {
        let params = json!({
            "protocolVersion": PROTOCOL_VERSION,
            "clientInfo": {
                "name": env!("CARGO_PKG_NAME"),
                "version": env!("CARGO_PKG_VERSION"),
            },
            "capabilities": {}
        });
        let init_result = self.send_request("initialize", params).await?;
        let server_info = init_result.get("serverInfo").cloned().unwrap_or_default();
        debug!(
            server = %self.server.name,
            %server_info,
            "MCP initialize completed"
        );
        self.send_notification("notifications/initialized", json!({}))
            .await
    }

    async fn reader_loop(self: Arc<Self>, stdout: ChildStdout) {
        let mut lines = BufReader::new(stdout).lines();
        while let Ok(Some(raw)) = lines.next_line().await {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                continue;
            }
            if !trimmed.starts_with('{') {
                debug!(
                    server = %self.server.name,
                    line = trimmed,
                    "skipping non-JSON log line from tool server"
                );
                continue;
            }
            match serde_json::from_str::<Value>(trimmed) {
                Ok(value) => {
                    if let Err(err) = self.process_inbound_message(value).await {
                        warn!(
                            server = %self.server.name,
                            %err,
                            "failed to process message from tool server"
                        );
                    }
                }
                Err(source) => {
                    warn!(
                        server = %self.server.name,
                        line = trimmed,
                        %source,
                        "received invalid JSON from tool server"
                    );
                }
            }
        }

        debug!(server = %self.server.name, "tool server stdout closed");
        self.writer.lock().await.take();
        self.fail_all_pending();
    }

    async fn process_inbound_message(&self, value: Value) -> Result<(), ToolInvokeError> {
        match (value.get("id").cloned(), value.get("method").is_some()) {
            (Some(id), true) => self.handle_server_request(id, value).await,
            (Some(id), false) => {
                self.handle_response(id, value);
                Ok(())
            }
            (None, true) => {
                if let Some(method) = value.get("method").and_then(Value::as_str) {
                    debug!(
                        server = %self.server.name,
                        method,
                        "received notification from tool server"
                    );
                }
                Ok(())
            }
            (None, false) => Ok(()),
        }
    }

    fn handle_response(&self, id: Value, value: Value) {
        let Some(key) = response_key(&id) else {
            return;
        };

        let responder = match self.pending.lock() {
            Ok(mut pending) => pending.remove(&key),
            Err(_) => None,
        };

        let Some(sender) = responder else {
            debug!(
                server = %self.server.name,
                response_id = key,
                "received response for unknown or abandoned request"
            );
            return;
        };

        let outcome = match value.get("error") {
            Some(error) => {
                let code = error.get("code").and_then(Value::as_i64).unwrap_or(-32000);
                let message = error
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown error")
                    .to_string();
                Err(ToolInvokeError::Rpc {
                    server: self.server.name.clone(),
                    code,
                    message,
                })
            }
            None => Ok(value.get("result").cloned().unwrap_or(Value::Null)),
        };
        let _ = sender.send(outcome);
    }

    async fn handle_server_request(&self, id: Value, value: Value) -> Result<(), ToolInvokeError> {
        let method = value
            .get("method")
            .and_then(Value::as_str)
            .unwrap_or_default();
        let payload = if method == "ping" {
            json!({ "jsonrpc": "2.0", "id": id, "result": {} })
        } else {
            warn!(
                server = %self.server.name,
                method,
                "tool server sent unsupported request"
            );
            json!({
                "jsonrpc": "2.0",
                "id": id,
                "error": {
                    "code": -32601,
                    "message": format!("client does not implement method '{method}'"),
                }
            })
        };
        self.write_message(&payload).await
    }

    async fn send_request(&self, method: &str, params: Value) -> Result<Value, ToolInvokeError> {
        let id = self.next_id();
        let (tx, rx) = oneshot::channel();
        self.pending
            .lock()
            .map_err(|_| self.transport_error("pending request table poisoned"))?
            .insert(id.clone(), tx);
        let _slot = PendingSlot {
            pending: &self.pending,
            id: id.clone(),
        };

        let payload = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params
        });
        self.write_message(&payload).await?;

        match rx.await {
            Ok(outcome) => outcome,
            Err(_) => Err(ToolInvokeError::Cancelled {
                server: self.server.name.clone(),
            }),
        }
    }

    async fn send_notification(&self, method: &str, params: Value) -> Result<(), ToolInvokeError> {
        let payload = json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params
        });
        self.write_message(&payload).await
    }

    async fn write_message(&self, message: &Value) -> Result<(), ToolInvokeError> {
        let mut encoded =
            serde_json::to_string(message).map_err(|source| ToolInvokeError::InvalidJson {
                server: self.server.name.clone(),
                source,
            })?;
        encoded.push('\n');

        let mut writer = self.writer.lock().await;
        let stream = writer.as_mut().ok_or_else(|| ToolInvokeError::Terminated {
            server: self.server.name.clone(),
        })?;
        stream
            .write_all(encoded.as_bytes())
            .await
            .map_err(|source| self.transport_error(source.to_string()))?;
        stream
            .flush()
            .await
            .map_err(|source| self.transport_error(source.to_string()))
    }

    fn fail_all_pending(&self) {
        if let Ok(mut pending) = self.pending.lock() {
            for (_, sender) in pending.drain() {
                let _ = sender.send(Err(ToolInvokeError::Terminated {
                    server: self.server.name.clone(),
                }));
            }
        }
    }

    fn next_id(&self) -> String {
        let id = self.id_counter.fetch_add(1, Ordering::SeqCst);
        format!("req-{id}")
    }

    fn transport_error(&self, message: impl Into<String>) -> ToolInvokeError {
        ToolInvokeError::Transport {
            server: self.server.name.clone(),
            message: message.into(),
        }
    }
}

fn response_key(id: &Value) -> Option<String> {
    match id {
        Value::String(value) => Some(value.clone()),
        Value::Number(num) => Some(num.to_string()),
        _ => None,
    }
}

/// Tools in the order the server advertised them.
fn parse_tool_list(result: &Value) -> Vec<ToolDescriptor> {
    result
        .get("tools")
        .and_then(Value::as_array)
        .map(|array| {
            array
                .iter()
                .filter_map(|tool| {
                    let name = tool.get("name").and_then(Value::as_str)?;
                    Some(ToolDescriptor {
                        name: name.to_string(),
                        description: tool
                            .get("description")
                            .and_then(Value::as_str)
                            .map(str::to_string),
                        input_schema: tool.get("inputSchema").cloned(),
                    })
                })
                .collect()
        })
        .unwrap_or_default()
}
