use crate::errors::ToolError;
use crate::utils::suggest::suggest;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DispatchError {
    #[error("Unknown tool: {name}")]
    UnknownTool { name: String, known: Vec<String> },
    #[error("Invalid arguments for {tool}: {reason}")]
    InvalidArguments { tool: String, reason: String },
}

impl From<DispatchError> for ToolError {
    fn from(err: DispatchError) -> Self {
        let message = err.to_string();
        match err {
            DispatchError::UnknownTool { name, known } => {
                let suggestions = suggest(&name, &known, 3);
                let mut out = ToolError::invalid_params(message).with_details(serde_json::json!({
                    "known_tools": known,
                    "did_you_mean": suggestions,
                }));
                if !suggestions.is_empty() {
                    out = out.with_hint(format!("Did you mean: {}?", suggestions.join(", ")));
                }
                out
            }
            DispatchError::InvalidArguments { .. } => ToolError::invalid_params(message),
        }
    }
}
