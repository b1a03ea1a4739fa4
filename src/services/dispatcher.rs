use crate::config::GatewayConfig;
use crate::errors::{AuthError, DispatchError, ToolError};
use crate::mcp::catalog::{tool_by_name, tool_names, validate_tool_args};
use crate::mcp::envelope::{ToolOutput, ToolResult};
use crate::services::logger::Logger;
use crate::services::session::{Session, SessionManager};
use crate::services::transport::{HttpResponse, HttpTransport, OutboundRequest};
use crate::shaping::duplicate::{format_duplicate_result, parse_duplicate_response, shape_duplicate};
use crate::shaping::edit::{format_edit_result, shape_batch_edit, EditKind, EditOperation};
use crate::shaping::lookup::{
    found_payload, not_found_payload, parse_direct_record, parse_lookup_hit, shape_direct_fetch,
    shape_index_lookup,
};
use crate::shaping::records::{shape_export, shape_get_record, shape_list, shape_tags};
use crate::shaping::schema::{shape_schema_probe, SchemaVariant};
use crate::shaping::search::{format_search_response, shape_search};
use crate::tools::{
    DuplicateArgs, LookupArgs, TagArgs, ToolCall, ToolCallRequest, ToolId, UpdateFieldArgs,
    UpdateTitleArgs,
};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Instant;

/// Single entry point from a protocol call to catalogue HTTP traffic.
///
/// Holds no per-call state: every privileged call logs in again and drops its
/// `Session` when the handler returns.
pub struct Dispatcher {
    logger: Logger,
    config: Arc<GatewayConfig>,
    transport: Arc<dyn HttpTransport>,
    sessions: SessionManager,
}

impl Dispatcher {
    pub fn new(logger: Logger, config: Arc<GatewayConfig>, transport: Arc<dyn HttpTransport>) -> Self {
        let logger = logger.child("dispatch");
        let sessions = SessionManager::new(logger.clone(), transport.clone(), &config);
        Self {
            logger,
            config,
            transport,
            sessions,
        }
    }

    pub async fn dispatch(&self, request: ToolCallRequest) -> ToolResult {
        let call_id = uuid::Uuid::new_v4().to_string();
        let started = Instant::now();
        self.logger.debug(
            "tool call",
            Some(&json!({ "tool": request.name, "call_id": call_id })),
        );

        match self.run(&request).await {
            Ok(output) => {
                self.logger.info(
                    "tool call completed",
                    Some(&json!({
                        "tool": request.name,
                        "call_id": call_id,
                        "duration_ms": started.elapsed().as_millis() as u64,
                    })),
                );
                ToolResult::success(output)
            }
            Err(err) => {
                self.logger.warn(
                    "tool call failed",
                    Some(&json!({
                        "tool": request.name,
                        "call_id": call_id,
                        "code": err.code,
                        "status": err.status,
                        "duration_ms": started.elapsed().as_millis() as u64,
                    })),
                );
                ToolResult::from_error(&err)
            }
        }
    }

    async fn run(&self, request: &ToolCallRequest) -> Result<ToolOutput, ToolError> {
        let Some(id) = ToolId::from_name(&request.name) else {
            return Err(DispatchError::UnknownTool {
                name: request.name.clone(),
                known: tool_names(),
            }
            .into());
        };
        let Some(def) = tool_by_name(id.name()) else {
            return Err(ToolError::internal(format!("Tool {} has no catalog entry", id)));
        };
        if def.requires_auth && !self.config.has_credentials() {
            return Err(AuthError::MissingCredentials.into());
        }
        validate_tool_args(id.name(), &request.arguments)?;
        let call = ToolCall::parse(id, &request.arguments)?;
        self.execute(call).await
    }

    async fn execute(&self, call: ToolCall) -> Result<ToolOutput, ToolError> {
        match call {
            ToolCall::SearchRecords(args) => {
                let plan = shape_search(&self.config, &args);
                let response = self.send(plan.request.clone(), "Search").await?;
                let body = json_body(response, "Search")?;
                Ok(ToolOutput::Json(format_search_response(&body, &plan)))
            }
            ToolCall::GetRecord(args) => {
                let request = shape_get_record(&self.config, &args.uuid, args.approved)?;
                let response = self.send(request, "Record fetch").await?;
                Ok(match response.json() {
                    Some(value) => ToolOutput::Json(value),
                    None => ToolOutput::Text(response.body),
                })
            }
            ToolCall::ExportRecord(args) => {
                let request = shape_export(&self.config, &args.uuid)?;
                let response = self.send(request, "Record export").await?;
                Ok(ToolOutput::Text(response.body))
            }
            ToolCall::LookupRecordById(args) => self.lookup_by_id(args).await,
            ToolCall::ListGroups => self.list("groups").await,
            ToolCall::ListTags => self.list("tags").await,
            ToolCall::UpdateRecordField(args) => self.update_field(args).await,
            ToolCall::UpdateRecordTitle(args) => self.update_title(args).await,
            ToolCall::DuplicateRecord(args) => self.duplicate(args).await,
            ToolCall::AddRecordTags(args) => self.tags(args, true).await,
            ToolCall::RemoveRecordTags(args) => self.tags(args, false).await,
        }
    }

    async fn send(&self, request: OutboundRequest, context: &str) -> Result<HttpResponse, ToolError> {
        self.transport.send(request).await?.error_for_status(context)
    }

    async fn login(&self) -> Result<Session, ToolError> {
        Ok(self
            .sessions
            .acquire_session(self.config.credentials())
            .await?)
    }

    async fn list(&self, collection: &str) -> Result<ToolOutput, ToolError> {
        let response = self
            .send(shape_list(&self.config, collection), &format!("Listing {}", collection))
            .await?;
        Ok(ToolOutput::Json(json_body(response, "Listing")?))
    }

    async fn update_field(&self, args: UpdateFieldArgs) -> Result<ToolOutput, ToolError> {
        let operation = EditOperation::new(&args.xpath, args.value, args.operation)?;
        let session = self.login().await?;
        let request = shape_batch_edit(&self.config, &args.uuid, &operation, args.update_date_stamp)?
            .with_cookie(session.cookie_header());
        let response = self.send(request, "Batch edit").await?;
        Ok(ToolOutput::Json(format_edit_result(
            args.uuid.trim(),
            &operation,
            response.json(),
        )))
    }

    async fn update_title(&self, args: UpdateTitleArgs) -> Result<ToolOutput, ToolError> {
        let probe = shape_schema_probe(&self.config, &args.uuid)?;
        let session = self.login().await?;

        let exported = match self
            .transport
            .send(probe.with_cookie(session.cookie_header()))
            .await
        {
            Ok(response) if response.is_success() => Some(response.body),
            Ok(response) => {
                self.logger.warn(
                    "schema probe returned non-success status; assuming iso19115-3",
                    Some(&json!({ "status": response.status })),
                );
                None
            }
            Err(err) => {
                self.logger.warn(
                    "schema probe failed; assuming iso19115-3",
                    Some(&json!({ "error": err.message })),
                );
                None
            }
        };
        let detected = exported.as_deref().and_then(SchemaVariant::detect).is_some();
        let variant = SchemaVariant::detect_or_default(exported.as_deref());

        let operation = EditOperation::new(variant.title_xpath(), Some(args.title), EditKind::Replace)?;
        let request = shape_batch_edit(&self.config, &args.uuid, &operation, args.update_date_stamp)?
            .with_cookie(session.cookie_header());
        let response = self.send(request, "Title update").await?;

        let mut out = format_edit_result(args.uuid.trim(), &operation, response.json());
        out["schema"] = Value::String(variant.name().to_string());
        out["schemaDetected"] = Value::Bool(detected);
        Ok(ToolOutput::Json(out))
    }

    async fn duplicate(&self, args: DuplicateArgs) -> Result<ToolOutput, ToolError> {
        let request = shape_duplicate(&self.config, &args)?;
        let session = self.login().await?;
        let response = self
            .send(request.with_cookie(session.cookie_header()), "Duplicate")
            .await?;
        let mut outcome = parse_duplicate_response(&response.body);

        let looked_up = outcome.needs_lookup();
        if let Some(id) = outcome.id.clone().filter(|_| looked_up) {
            let lookup = shape_index_lookup(&self.config, &id).with_cookie(session.cookie_header());
            match self.send(lookup, "Duplicate lookup").await {
                Ok(found) => {
                    outcome.uuid = found
                        .json()
                        .as_ref()
                        .and_then(parse_lookup_hit)
                        .map(|hit| hit.uuid);
                }
                Err(err) => {
                    self.logger.warn(
                        "uuid lookup for duplicated record failed",
                        Some(&json!({ "id": id, "error": err.message, "status": err.status })),
                    );
                }
            }
        }

        Ok(ToolOutput::Json(format_duplicate_result(
            &args.source_uuid,
            &outcome,
            looked_up,
        )))
    }

    async fn lookup_by_id(&self, args: LookupArgs) -> Result<ToolOutput, ToolError> {
        let id = args.id.to_string();
        if id.is_empty() {
            return Err(ToolError::invalid_params("id must not be empty"));
        }

        let response = self
            .send(shape_index_lookup(&self.config, &id), "Record lookup")
            .await?;
        if let Some(hit) = response.json().as_ref().and_then(parse_lookup_hit) {
            return Ok(ToolOutput::Json(found_payload(
                &id,
                &hit.uuid,
                hit.title.as_deref(),
                "index",
            )));
        }

        if !self.config.has_credentials() {
            return Ok(ToolOutput::Json(not_found_payload(&id)));
        }

        let request = shape_direct_fetch(&self.config, &id)?;
        let session = self.login().await?;
        let response = self
            .transport
            .send(request.with_cookie(session.cookie_header()))
            .await?;
        if response.status >= 500 {
            return Err(ToolError::upstream(
                "Direct record fetch failed",
                response.status,
                response.body,
            ));
        }
        let uuid = response
            .is_success()
            .then(|| response.json())
            .flatten()
            .as_ref()
            .and_then(parse_direct_record);
        Ok(ToolOutput::Json(match uuid {
            Some(uuid) => found_payload(&id, &uuid, None, "record"),
            None => not_found_payload(&id),
        }))
    }

    async fn tags(&self, args: TagArgs, add: bool) -> Result<ToolOutput, ToolError> {
        let request = shape_tags(&self.config, &args.uuid, &args.tag_ids, add)?;
        let session = self.login().await?;
        let context = if add { "Adding tags" } else { "Removing tags" };
        let response = self
            .send(request.with_cookie(session.cookie_header()), context)
            .await?;
        Ok(ToolOutput::Json(json!({
            "uuid": args.uuid.trim(),
            "tagIds": args.tag_ids,
            "operation": if add { "add" } else { "remove" },
            "result": response.json(),
        })))
    }
}

fn json_body(response: HttpResponse, context: &str) -> Result<Value, ToolError> {
    match response.json() {
        Some(value) => Ok(value),
        None => Err(ToolError::upstream(
            format!("{} returned a non-JSON response", context),
            response.status,
            response.body,
        )),
    }
}
