use crate::config::GatewayConfig;
use crate::errors::ToolError;
use crate::services::transport::OutboundRequest;
use crate::tools::DuplicateArgs;
use serde_json::{json, Value};

/// Optional flags are sent only when they differ from the catalogue's
/// defaults (`isChildOfSource=false`, `hasCategoryOfSource=true`).
pub fn shape_duplicate(config: &GatewayConfig, args: &DuplicateArgs) -> Result<OutboundRequest, ToolError> {
    let source = args.source_uuid.trim();
    if source.is_empty() {
        return Err(ToolError::invalid_params("sourceUuid must not be empty"));
    }
    let mut request = OutboundRequest::put(config.api_url("records/duplicate"))
        .with_query("metadataUuid", source)
        .with_accept("application/json");
    if let Some(group) = non_blank(args.group.as_deref()) {
        request = request.with_query("group", group);
    }
    if args.is_child_of_source {
        request = request.with_query("isChildOfSource", "true");
    }
    if let Some(target) = non_blank(args.target_uuid.as_deref()) {
        request = request.with_query("targetUuid", target);
    }
    if !args.has_category_of_source {
        request = request.with_query("hasCategoryOfSource", "false");
    }
    Ok(request)
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// What the duplicate endpoint told us about the new record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DuplicateOutcome {
    pub id: Option<String>,
    pub uuid: Option<String>,
}

impl DuplicateOutcome {
    pub fn needs_lookup(&self) -> bool {
        self.uuid.is_none() && self.id.is_some()
    }
}

/// The endpoint answers with a bare id on most versions and with an object
/// on some; both shapes are accepted. Only numeric values count as an
/// internal id; a bare non-numeric string is taken to be the new UUID.
pub fn parse_duplicate_response(body: &str) -> DuplicateOutcome {
    let trimmed = body.trim();
    match serde_json::from_str::<Value>(trimmed) {
        Ok(Value::Object(map)) => DuplicateOutcome {
            id: ["id", "metadataId"]
                .iter()
                .find_map(|key| map.get(*key).and_then(numeric_id)),
            uuid: ["uuid", "metadataUuid"]
                .iter()
                .find_map(|key| map.get(*key).and_then(non_blank_text)),
        },
        Ok(value) => match numeric_id(&value) {
            Some(id) => DuplicateOutcome {
                id: Some(id),
                uuid: None,
            },
            None => DuplicateOutcome {
                id: None,
                uuid: non_blank_text(&value),
            },
        },
        Err(_) if is_digits(trimmed) => DuplicateOutcome {
            id: Some(trimmed.to_string()),
            uuid: None,
        },
        Err(_) => DuplicateOutcome::default(),
    }
}

fn numeric_id(value: &Value) -> Option<String> {
    match value {
        Value::Number(n) if n.is_u64() => Some(n.to_string()),
        Value::String(s) if is_digits(s.trim()) => Some(s.trim().to_string()),
        _ => None,
    }
}

fn non_blank_text(value: &Value) -> Option<String> {
    value
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn is_digits(value: &str) -> bool {
    !value.is_empty() && value.chars().all(|c| c.is_ascii_digit())
}

pub fn format_duplicate_result(source_uuid: &str, outcome: &DuplicateOutcome, looked_up: bool) -> Value {
    let mut out = json!({
        "sourceUuid": source_uuid.trim(),
        "newUuid": outcome.uuid,
        "newId": outcome.id.as_deref().map(id_value),
    });
    if outcome.uuid.is_none() {
        let note = if looked_up {
            "The copy was created but is not in the search index yet. Retry lookup_record_by_id with newId shortly to resolve its UUID."
        } else {
            "The catalogue did not report an identifier for the copy."
        };
        out["note"] = Value::String(note.to_string());
    }
    out
}

// Numeric ids are reported as numbers so callers can pass them straight back.
fn id_value(id: &str) -> Value {
    id.parse::<u64>().map(Value::from).unwrap_or_else(|_| Value::from(id))
}
