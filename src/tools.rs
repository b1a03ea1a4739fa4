//! Typed tool calls.
//!
//! The wire carries a tool name and a loose JSON object. After schema
//! validation the pair becomes a `ToolCall`, one variant per tool, so the
//! dispatcher matches on data instead of looking handlers up by string.

use crate::errors::DispatchError;
use crate::shaping::edit::EditKind;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolId {
    SearchRecords,
    GetRecord,
    ExportRecord,
    LookupRecordById,
    ListGroups,
    ListTags,
    UpdateRecordField,
    UpdateRecordTitle,
    DuplicateRecord,
    AddRecordTags,
    RemoveRecordTags,
}

impl ToolId {
    pub const ALL: &'static [ToolId] = &[
        ToolId::SearchRecords,
        ToolId::GetRecord,
        ToolId::ExportRecord,
        ToolId::LookupRecordById,
        ToolId::ListGroups,
        ToolId::ListTags,
        ToolId::UpdateRecordField,
        ToolId::UpdateRecordTitle,
        ToolId::DuplicateRecord,
        ToolId::AddRecordTags,
        ToolId::RemoveRecordTags,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ToolId::SearchRecords => "search_records",
            ToolId::GetRecord => "get_record",
            ToolId::ExportRecord => "export_record",
            ToolId::LookupRecordById => "lookup_record_by_id",
            ToolId::ListGroups => "list_groups",
            ToolId::ListTags => "list_tags",
            ToolId::UpdateRecordField => "update_record_field",
            ToolId::UpdateRecordTitle => "update_record_title",
            ToolId::DuplicateRecord => "duplicate_record",
            ToolId::AddRecordTags => "add_record_tags",
            ToolId::RemoveRecordTags => "remove_record_tags",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|id| id.name() == name)
    }
}

impl fmt::Display for ToolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One incoming call as received from the protocol layer.
#[derive(Debug, Clone)]
pub struct ToolCallRequest {
    pub name: String,
    pub arguments: Value,
}

impl ToolCallRequest {
    pub fn new(name: impl Into<String>, arguments: Value) -> Self {
        Self {
            name: name.into(),
            arguments,
        }
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchArgs {
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub from: Option<u64>,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub facets: Vec<String>,
    #[serde(default)]
    pub sort_by: Option<String>,
    #[serde(default)]
    pub sort_order: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetRecordArgs {
    pub uuid: String,
    #[serde(default = "default_true")]
    pub approved: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExportRecordArgs {
    pub uuid: String,
}

/// Internal ids arrive as numbers or strings depending on the caller.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Number(u64),
    Text(String),
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Number(n) => write!(f, "{}", n),
            RecordId::Text(s) => f.write_str(s.trim()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LookupArgs {
    pub id: RecordId,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateFieldArgs {
    pub uuid: String,
    pub xpath: String,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub operation: EditKind,
    #[serde(default = "default_true")]
    pub update_date_stamp: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTitleArgs {
    pub uuid: String,
    pub title: String,
    #[serde(default = "default_true")]
    pub update_date_stamp: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateArgs {
    pub source_uuid: String,
    #[serde(default)]
    pub group: Option<String>,
    #[serde(default)]
    pub is_child_of_source: bool,
    #[serde(default)]
    pub target_uuid: Option<String>,
    #[serde(default = "default_true")]
    pub has_category_of_source: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagArgs {
    pub uuid: String,
    pub tag_ids: Vec<u64>,
}

#[derive(Debug, Clone)]
pub enum ToolCall {
    SearchRecords(SearchArgs),
    GetRecord(GetRecordArgs),
    ExportRecord(ExportRecordArgs),
    LookupRecordById(LookupArgs),
    ListGroups,
    ListTags,
    UpdateRecordField(UpdateFieldArgs),
    UpdateRecordTitle(UpdateTitleArgs),
    DuplicateRecord(DuplicateArgs),
    AddRecordTags(TagArgs),
    RemoveRecordTags(TagArgs),
}

impl ToolCall {
    pub fn parse(id: ToolId, args: &Value) -> Result<Self, DispatchError> {
        Ok(match id {
            ToolId::SearchRecords => ToolCall::SearchRecords(decode(id, args)?),
            ToolId::GetRecord => ToolCall::GetRecord(decode(id, args)?),
            ToolId::ExportRecord => ToolCall::ExportRecord(decode(id, args)?),
            ToolId::LookupRecordById => ToolCall::LookupRecordById(decode(id, args)?),
            ToolId::ListGroups => ToolCall::ListGroups,
            ToolId::ListTags => ToolCall::ListTags,
            ToolId::UpdateRecordField => ToolCall::UpdateRecordField(decode(id, args)?),
            ToolId::UpdateRecordTitle => ToolCall::UpdateRecordTitle(decode(id, args)?),
            ToolId::DuplicateRecord => ToolCall::DuplicateRecord(decode(id, args)?),
            ToolId::AddRecordTags => ToolCall::AddRecordTags(decode(id, args)?),
            ToolId::RemoveRecordTags => ToolCall::RemoveRecordTags(decode(id, args)?),
        })
    }
}

fn decode<T: DeserializeOwned>(id: ToolId, args: &Value) -> Result<T, DispatchError> {
    let args = if args.is_null() {
        Value::Object(Default::default())
    } else {
        args.clone()
    };
    serde_json::from_value(args).map_err(|err| DispatchError::InvalidArguments {
        tool: id.name().to_string(),
        reason: err.to_string(),
    })
}
