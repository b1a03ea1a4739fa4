use crate::constants::limits::ERROR_BODY_BYTES;
use crate::errors::ToolError;
use crate::utils::text::truncate_utf8_prefix;
use serde::Serialize;
use serde_json::Value;

/// What a tool produced before it is wrapped for the wire.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutput {
    Json(Value),
    /// Raw documents (XML exports) that are not meant to be re-parsed.
    Text(String),
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TextContent {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub text: String,
}

/// The `tools/call` result: always exactly one text item, `isError` set on
/// failure. Tool failures never become JSON-RPC errors.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ToolResult {
    pub content: Vec<TextContent>,
    #[serde(rename = "isError", skip_serializing_if = "std::ops::Not::not")]
    pub is_error: bool,
}

impl ToolResult {
    pub fn success(output: ToolOutput) -> Self {
        let text = match output {
            ToolOutput::Json(value) => {
                serde_json::to_string_pretty(&value).unwrap_or_else(|_| value.to_string())
            }
            ToolOutput::Text(text) => text,
        };
        Self::single(text, false)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::single(message.into(), true)
    }

    pub fn from_error(err: &ToolError) -> Self {
        Self::error(render_error(err))
    }

    fn single(text: String, is_error: bool) -> Self {
        Self {
            content: vec![TextContent { kind: "text", text }],
            is_error,
        }
    }

    pub fn text(&self) -> &str {
        self.content.first().map(|c| c.text.as_str()).unwrap_or("")
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Message, upstream status and upstream body in one diagnostic string.
pub fn render_error(err: &ToolError) -> String {
    let mut lines = vec![format!("Error: {}", err.message)];
    if let Some(status) = err.status {
        lines.push(format!("Status: {}", status));
    }
    if let Some(body) = err.body.as_deref() {
        lines.push(format!("Response: {}", truncate_utf8_prefix(body.trim(), ERROR_BODY_BYTES)));
    }
    if let Some(hint) = err.hint.as_deref() {
        lines.push(format!("Hint: {}", hint));
    }
    if err.retryable {
        lines.push("Retryable: true".to_string());
    }
    lines.join("\n")
}
