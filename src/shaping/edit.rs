use crate::config::GatewayConfig;
use crate::errors::ToolError;
use crate::services::transport::OutboundRequest;
use serde::Deserialize;
use serde_json::{json, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditKind {
    #[default]
    Replace,
    Add,
    Delete,
}

impl EditKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EditKind::Replace => "replace",
            EditKind::Add => "add",
            EditKind::Delete => "delete",
        }
    }

    fn tag(self) -> &'static str {
        match self {
            EditKind::Replace => "gn_replace",
            EditKind::Add => "gn_add",
            EditKind::Delete => "gn_delete",
        }
    }
}

/// One XPath edit, consumed once to build a batch-edit body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditOperation {
    xpath: String,
    value: Option<String>,
    kind: EditKind,
}

impl EditOperation {
    pub fn new(xpath: &str, value: Option<String>, kind: EditKind) -> Result<Self, ToolError> {
        let xpath = xpath.trim();
        if xpath.is_empty() {
            return Err(ToolError::invalid_params("xpath must not be empty"));
        }
        if kind != EditKind::Delete && value.is_none() {
            return Err(ToolError::invalid_params(format!(
                "value is required for the '{}' operation",
                kind.as_str()
            ))
            .with_hint("Pass operation=delete to remove the element instead."));
        }
        Ok(Self {
            xpath: xpath.to_string(),
            value,
            kind,
        })
    }

    pub fn xpath(&self) -> &str {
        &self.xpath
    }

    pub fn kind(&self) -> EditKind {
        self.kind
    }

    /// The literal value is wrapped as-is; delete ignores it.
    pub fn envelope(&self) -> String {
        match self.kind {
            EditKind::Delete => wrap_value(EditKind::Delete, ""),
            kind => wrap_value(kind, self.value.as_deref().unwrap_or("")),
        }
    }

    pub fn to_payload(&self) -> Value {
        json!([{ "xpath": self.xpath, "value": self.envelope() }])
    }
}

pub fn wrap_value(kind: EditKind, value: &str) -> String {
    let tag = kind.tag();
    format!("<{tag}>{value}</{tag}>")
}

pub fn shape_batch_edit(
    config: &GatewayConfig,
    uuid: &str,
    operation: &EditOperation,
    update_date_stamp: bool,
) -> Result<OutboundRequest, ToolError> {
    let uuid = uuid.trim();
    if uuid.is_empty() {
        return Err(ToolError::invalid_params("uuid must not be empty"));
    }
    Ok(OutboundRequest::put(config.api_url("records/batchediting"))
        .with_query("uuids", uuid)
        .with_query("updateDateStamp", update_date_stamp.to_string())
        .with_accept("application/json")
        .with_json(operation.to_payload()))
}

/// The batch-edit report is passed through; callers also get what was sent.
pub fn format_edit_result(uuid: &str, operation: &EditOperation, upstream: Option<Value>) -> Value {
    json!({
        "uuid": uuid,
        "xpath": operation.xpath(),
        "operation": operation.kind().as_str(),
        "result": upstream.unwrap_or(Value::Null),
    })
}
