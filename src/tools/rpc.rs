//! JSON-RPC 2.0 dispatch for tool clients
//!
//! Handles `initialize`, `ping`, `tools/list` and `tools/call`. Messages
//! are newline-delimited on stdio; `POST /mcp` carries one per request.

use super::base::ToolError;
use super::ToolRegistry;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

const JSONRPC_VERSION: &str = "2.0";

/// Protocol revision announced in `initialize`
pub const PROTOCOL_VERSION: &str = "2024-11-05";

pub const PARSE_ERROR: i32 = -32700;
pub const INVALID_REQUEST: i32 = -32600;
pub const METHOD_NOT_FOUND: i32 = -32601;
pub const INVALID_PARAMS: i32 = -32602;

/// An incoming request or notification
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub method: String,
    #[serde(default)]
    pub params: Value,
    /// Absent for notifications; an explicit `null` still gets a reply
    #[serde(default, deserialize_with = "present")]
    pub id: Option<Value>,
}

fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

/// A JSON-RPC 2.0 error object
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
}

/// Success or error response
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: &'static str,
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn failure(id: Value, code: i32, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            result: None,
            error: Some(JsonRpcError {
                code,
                message: message.into(),
            }),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CallParams {
    name: String,
    #[serde(default)]
    arguments: Value,
}

/// Parse and handle one raw message. Returns `None` for notifications.
pub async fn handle_message(
    registry: &ToolRegistry,
    raw: &str,
    cancel: &CancellationToken,
) -> Option<JsonRpcResponse> {
    let value: Value = match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(e) => {
            return Some(JsonRpcResponse::failure(Value::Null, PARSE_ERROR, e.to_string()));
        }
    };

    let id = value.get("id").cloned().unwrap_or(Value::Null);
    match serde_json::from_value::<JsonRpcRequest>(value) {
        Ok(request) if request.jsonrpc == JSONRPC_VERSION => handle(registry, request, cancel).await,
        Ok(_) => Some(JsonRpcResponse::failure(id, INVALID_REQUEST, "jsonrpc must be \"2.0\"")),
        Err(e) => Some(JsonRpcResponse::failure(id, INVALID_REQUEST, e.to_string())),
    }
}

/// Handle one decoded request
pub async fn handle(
    registry: &ToolRegistry,
    request: JsonRpcRequest,
    cancel: &CancellationToken,
) -> Option<JsonRpcResponse> {
    let Some(id) = request.id else {
        debug!(method = %request.method, "notification");
        return None;
    };

    let response = match request.method.as_str() {
        "initialize" => JsonRpcResponse::success(
            id,
            json!({
                "protocolVersion": PROTOCOL_VERSION,
                "capabilities": { "tools": {} },
                "serverInfo": { "name": "mixsearch", "version": crate::VERSION },
            }),
        ),
        "ping" => JsonRpcResponse::success(id, json!({})),
        "tools/list" => JsonRpcResponse::success(id, json!({ "tools": registry.list_tool_definitions() })),
        "tools/call" => match serde_json::from_value::<CallParams>(request.params) {
            Ok(call) => call_tool(registry, id, call, cancel).await,
            Err(e) => JsonRpcResponse::failure(id, INVALID_PARAMS, e.to_string()),
        },
        other => JsonRpcResponse::failure(id, METHOD_NOT_FOUND, format!("Method not found: {other}")),
    };
    Some(response)
}

async fn call_tool(
    registry: &ToolRegistry,
    id: Value,
    call: CallParams,
    cancel: &CancellationToken,
) -> JsonRpcResponse {
    match registry.call(&call.name, call.arguments, cancel).await {
        Ok(result) => JsonRpcResponse::success(
            id,
            json!({
                "content": [{ "type": "text", "text": result.text }],
                "structuredContent": result.structured,
                "isError": false,
            }),
        ),
        Err(err @ ToolError::UnknownTool(_)) => JsonRpcResponse::failure(id, INVALID_PARAMS, err.to_string()),
        Err(err) => {
            warn!(tool = %call.name, error = %err, "tool call failed");
            JsonRpcResponse::success(
                id,
                json!({
                    "content": [{ "type": "text", "text": err.to_string() }],
                    "isError": true,
                }),
            )
        }
    }
}

/// Serve newline-delimited JSON-RPC on stdin/stdout until EOF or shutdown.
///
/// Nothing but responses is written to stdout.
pub async fn serve_stdio(registry: &ToolRegistry, shutdown: CancellationToken) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    info!(tools = ?registry.names(), "serving tools on stdio");

    loop {
        let line = tokio::select! {
            _ = shutdown.cancelled() => break,
            line = lines.next_line() => line?,
        };
        let Some(line) = line else {
            break;
        };
        if line.trim().is_empty() {
            continue;
        }

        let request_token = shutdown.child_token();
        if let Some(response) = handle_message(registry, &line, &request_token).await {
            let mut out = serde_json::to_string(&response)?;
            out.push('\n');
            stdout.write_all(out.as_bytes()).await?;
            stdout.flush().await?;
        }
    }

    info!("stdio transport closed");
    Ok(())
}
