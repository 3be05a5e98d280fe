use serde_json::{Map as JsonMap, Value};

/// Whether the model asked for another tool call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NeedTool {
    Yes,
    No,
    /// The reply was not a structured object. Handled like `No` today.
    Unknown,
}

/// Structured reading of one model reply.
#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    pub need_tool: NeedTool,
    pub tool_server: Option<String>,
    pub tool_name: Option<String>,
    /// `Some` only when `need_tool` is `Yes`; `None` there means the
    /// arguments were present but not an object.
    pub tool_arguments: Option<JsonMap<String, Value>>,
    pub response_text: String,
}

impl Decision {
    fn unparsed(raw: &str) -> Self {
        Self {
            need_tool: NeedTool::Unknown,
            tool_server: None,
            tool_name: None,
            tool_arguments: None,
            response_text: raw.trim().to_string(),
        }
    }

    pub fn wants_tool(&self) -> bool {
        self.need_tool == NeedTool::Yes
    }
}

/// Interpret raw model text. Total: malformed replies become `Unknown`
/// decisions carrying the trimmed text as the answer.
pub fn parse_decision(raw: &str) -> Decision {
    let trimmed = raw.trim();
    let candidate = strip_code_fence(trimmed).unwrap_or(trimmed);

    match serde_json::from_str::<Value>(candidate) {
        Ok(Value::Object(map)) => from_object(map),
        _ => Decision::unparsed(raw),
    }
}

fn from_object(map: JsonMap<String, Value>) -> Decision {
    let wants_tool = map.get("tool_call").map(is_truthy).unwrap_or(false);

    let tool_arguments = if wants_tool {
        match map.get("tool_args") {
            None | Some(Value::Null) => Some(JsonMap::new()),
            Some(Value::Object(args)) => Some(args.clone()),
            Some(_) => None,
        }
    } else {
        None
    };

    Decision {
        need_tool: if wants_tool { NeedTool::Yes } else { NeedTool::No },
        tool_server: string_field(&map, "tool_server"),
        tool_name: string_field(&map, "tool"),
        tool_arguments,
        response_text: flatten_response(map.get("response")).trim().to_string(),
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Bool(flag) => *flag,
        Value::String(text) => text.trim().eq_ignore_ascii_case("true"),
        Value::Number(num) => num.as_f64().map(|n| n != 0.0).unwrap_or(false),
        _ => false,
    }
}

fn string_field(map: &JsonMap<String, Value>, key: &str) -> Option<String> {
    map.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

fn flatten_response(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text.clone(),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| match item {
                Value::String(text) => text.clone(),
                other => other.to_string(),
            })
            .collect::<Vec<_>>()
            .join("\n"),
        Some(other) => other.to_string(),
    }
}

fn strip_code_fence(text: &str) -> Option<&str> {
    let body = text.strip_prefix("```")?;
    let body = body
        .strip_prefix("json")
        .or_else(|| body.strip_prefix("JSON"))
        .unwrap_or(body);
    let end = body.rfind("```")?;
    Some(body[..end].trim())
}
