use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use super::error::ToolInvokeError;
use crate::config::ServerConfig;

/// One entry of a server's capability catalog.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolDescriptor {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_schema: Option<Value>,
}

impl ToolDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            input_schema: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_schema(mut self, schema: Value) -> Self {
        self.input_schema = Some(schema);
        self
    }
}

/// Outcome of a tool call that reached the server.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolResult {
    pub server: String,
    pub tool: String,
    /// Raw `tools/call` result payload.
    pub output: Value,
    /// The server flagged the result as an error (`isError`).
    pub is_error: bool,
}

impl ToolResult {
    pub fn new(server: impl Into<String>, tool: impl Into<String>, output: Value) -> Self {
        let is_error = output
            .get("isError")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        Self {
            server: server.into(),
            tool: tool.into(),
            output,
            is_error,
        }
    }

    /// Newline-joined text blocks, or the raw payload when there are none.
    pub fn text(&self) -> String {
        let blocks: Vec<&str> = self
            .output
            .get("content")
            .and_then(Value::as_array)
            .map(|array| {
                array
                    .iter()
                    .filter(|block| {
                        block
                            .get("type")
                            .and_then(Value::as_str)
                            .map(|kind| kind.eq_ignore_ascii_case("text"))
                            .unwrap_or(false)
                    })
                    .filter_map(|block| block.get("text").and_then(Value::as_str))
                    .collect()
            })
            .unwrap_or_default();

        if !blocks.is_empty() {
            return blocks.join("\n");
        }

        match &self.output {
            Value::String(text) => text.clone(),
            other => other.to_string(),
        }
    }
}

/// Request/response channel to one tool server.
///
/// Implementations do not need to be safe for concurrent calls; the owning
/// session serializes access.
#[async_trait]
pub trait ToolTransport: Send + Sync {
    async fn list_capabilities(&self) -> Result<Vec<ToolDescriptor>, ToolInvokeError>;

    async fn call_tool(&self, tool: &str, arguments: Value) -> Result<Value, ToolInvokeError>;

    async fn close(&self) -> Result<(), ToolInvokeError>;
}

/// Opens transports from launch descriptors.
#[async_trait]
pub trait TransportConnector: Send + Sync {
    async fn connect(&self, config: &ServerConfig)
    -> Result<Box<dyn ToolTransport>, ToolInvokeError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn text_joins_every_text_block() {
        let result = ToolResult::new(
            "search",
            "web_search",
            json!({
                "content": [
                    { "type": "text", "text": "first" },
                    { "type": "image", "data": "..." },
                    { "type": "text", "text": "second" }
                ],
                "isError": false
            }),
        );
        assert_eq!(result.text(), "first\nsecond");
        assert!(!result.is_error);
    }

    #[test]
    fn text_falls_back_to_raw_payload() {
        let result = ToolResult::new("notes", "lookup", json!({ "isError": true, "code": 7 }));
        assert!(result.is_error);
        assert!(result.text().contains("\"code\":7"));
    }
}
