use crate::app::App;
use crate::errors::{ErrorCode, ToolError};
use crate::mcp::catalog::list_tools;
use crate::mcp::protocol::{JsonRpcRequest, JsonRpcResponse};
use crate::tools::ToolCallRequest;
use serde_json::Value;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, BufWriter};
use tokio::sync::Mutex;
use tokio::task::JoinSet;

const PROTOCOL_VERSION: &str = "2025-06-18";
const SERVER_NAME: &str = "geonetwork-mcp";
const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

pub struct McpServer {
    app: Arc<App>,
}

impl McpServer {
    pub async fn new() -> Result<Self, ToolError> {
        let app = App::initialize()?;
        Ok(Self::with_app(Arc::new(app)))
    }

    pub fn with_app(app: Arc<App>) -> Self {
        Self { app }
    }

    fn handle_initialize(&self) -> Value {
        serde_json::json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": { "tools": { "listChanged": false } },
            "serverInfo": { "name": SERVER_NAME, "version": SERVER_VERSION },
        })
    }

    fn handle_tools_list(&self) -> Value {
        serde_json::json!({ "tools": list_tools() })
    }

    async fn handle_tools_call(&self, id: Value, params: &Value) -> JsonRpcResponse {
        let params = params.as_object().cloned().unwrap_or_default();
        let name = params
            .get("name")
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .trim();
        if name.is_empty() {
            return JsonRpcResponse::failure(
                id,
                ErrorCode::InvalidParams.as_i32(),
                "Missing tool name".to_string(),
            );
        }
        let args = params.get("arguments").cloned().unwrap_or(Value::Null);
        let result = self
            .app
            .dispatcher
            .dispatch(ToolCallRequest::new(name, args))
            .await;
        JsonRpcResponse::success(id, result.to_value())
    }

    /// Returns `None` for notifications and other id-less requests.
    pub async fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        match request.method.as_str() {
            "notifications/initialized" => request
                .id
                .map(|id| JsonRpcResponse::success(id, serde_json::json!({}))),
            _ if request.method.starts_with("notifications/") && request.id.is_none() => None,
            "initialize" => request
                .id
                .map(|id| JsonRpcResponse::success(id, self.handle_initialize())),
            "ping" => request
                .id
                .map(|id| JsonRpcResponse::success(id, serde_json::json!({}))),
            "tools/list" => request
                .id
                .map(|id| JsonRpcResponse::success(id, self.handle_tools_list())),
            "tools/call" => match request.id {
                Some(id) => Some(self.handle_tools_call(id, &request.params).await),
                None => None,
            },
            _ => request.id.map(|id| {
                JsonRpcResponse::failure(
                    id,
                    ErrorCode::MethodNotFound.as_i32(),
                    ErrorCode::MethodNotFound.message().to_string(),
                )
            }),
        }
    }

    /// Tool calls run on their own tasks so a slow catalogue request does not
    /// hold up `ping` or `tools/list`; responses may therefore arrive out of
    /// order, matched by id.
    pub async fn run_stdio(self: Arc<Self>) -> Result<(), ToolError> {
        let stdin = tokio::io::stdin();
        let mut reader = BufReader::new(stdin).lines();
        let writer = Arc::new(Mutex::new(BufWriter::new(tokio::io::stdout())));
        let mut in_flight = JoinSet::new();

        while let Some(line) = reader
            .next_line()
            .await
            .map_err(|err| ToolError::internal(err.to_string()))?
        {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            let request = match parse_line(trimmed) {
                Ok(request) => request,
                Err(response) => {
                    write_response(&writer, &response).await?;
                    continue;
                }
            };

            if request.method == "tools/call" {
                let server = self.clone();
                let writer = writer.clone();
                in_flight.spawn(async move {
                    if let Some(response) = server.handle_request(request).await {
                        if let Err(err) = write_response(&writer, &response).await {
                            server
                                .app
                                .logger
                                .error("failed to write response", Some(&serde_json::json!({ "error": err.message })));
                        }
                    }
                });
            } else if let Some(response) = self.handle_request(request).await {
                write_response(&writer, &response).await?;
            }

            while in_flight.try_join_next().is_some() {}
        }

        while in_flight.join_next().await.is_some() {}
        Ok(())
    }
}

/// Malformed input becomes a JSON-RPC error with a null id.
pub fn parse_line(line: &str) -> Result<JsonRpcRequest, JsonRpcResponse> {
    let parsed: Value = serde_json::from_str(line).map_err(|_| {
        JsonRpcResponse::failure(
            Value::Null,
            ErrorCode::ParseError.as_i32(),
            ErrorCode::ParseError.message().to_string(),
        )
    })?;
    serde_json::from_value(parsed).map_err(|_| {
        JsonRpcResponse::failure(
            Value::Null,
            ErrorCode::InvalidRequest.as_i32(),
            ErrorCode::InvalidRequest.message().to_string(),
        )
    })
}

async fn write_response<W>(writer: &Mutex<W>, response: &JsonRpcResponse) -> Result<(), ToolError>
where
    W: AsyncWrite + Unpin,
{
    let payload = serde_json::to_string(response)?;
    let mut writer = writer.lock().await;
    writer.write_all(payload.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    writer.flush().await?;
    Ok(())
}

pub async fn run_stdio() -> Result<(), ToolError> {
    let server = McpServer::new().await?;
    Arc::new(server).run_stdio().await
}
