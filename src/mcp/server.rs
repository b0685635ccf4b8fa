//! MCP server with stdio transport
//!
//! Implements JSON-RPC 2.0 server that communicates over stdin/stdout.
//! Handles the initialize handshake, tool discovery and execution.

use super::protocol::{
    negotiate_protocol_version, CallToolResult, JsonRpcError, JsonRpcRequest, JsonRpcResponse,
    ToolCallParams,
};
use super::tools::ToolHandler;
use crate::error::Result;
use serde::Serialize;
use serde_json::{json, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, error, info, warn};

/// MCP server that handles JSON-RPC requests
pub struct McpServer {
    tool_handler: ToolHandler,
}

impl McpServer {
    /// Create a new MCP server
    pub fn new(tool_handler: ToolHandler) -> Self {
        Self { tool_handler }
    }

    /// Run the server over the process's stdin/stdout until EOF
    pub async fn run(&self) -> Result<()> {
        info!("MCP server started, listening on stdin...");
        let reader = BufReader::new(tokio::io::stdin());
        self.serve(reader, tokio::io::stdout()).await
    }

    /// Serve line-delimited JSON-RPC from `reader`, writing responses to `writer`
    pub async fn serve<R, W>(&self, mut reader: R, mut writer: W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut line = String::new();

        loop {
            line.clear();

            if reader.read_line(&mut line).await? == 0 {
                debug!("Received EOF, shutting down");
                break;
            }

            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            let Some(response) = self.handle_line(trimmed).await else {
                continue;
            };

            let response_json = encode_response(&response, response.id.as_ref());
            debug!("Sending response: {}", response_json);

            writer.write_all(response_json.as_bytes()).await?;
            writer.write_all(b"\n").await?;
            writer.flush().await?;
        }

        info!("MCP server shutting down");
        Ok(())
    }

    /// Process one raw JSON-RPC message; notifications yield no response
    pub async fn handle_line(&self, line: &str) -> Option<JsonRpcResponse> {
        debug!("Received request: {}", line);

        let request: JsonRpcRequest = match serde_json::from_str(line) {
            Ok(req) => req,
            Err(e) => {
                return Some(JsonRpcResponse::error(
                    None,
                    JsonRpcError::parse_error(format!("Invalid JSON: {}", e)),
                ));
            }
        };

        self.handle_request(request).await
    }

    /// Process a parsed request
    pub async fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        if request.jsonrpc != "2.0" {
            return Some(JsonRpcResponse::error(
                request.id.clone(),
                JsonRpcError::invalid_request("jsonrpc must be '2.0'"),
            ));
        }

        if request.is_notification() {
            debug!("Notification: {}", request.method);
            return None;
        }

        let response = match request.method.as_str() {
            "initialize" => self.handle_initialize(request),
            "ping" => JsonRpcResponse::success(request.id, json!({})),
            "tools/list" => self.handle_tools_list(request),
            "tools/call" => self.handle_tools_call(request).await,
            _ => {
                JsonRpcResponse::error(request.id, JsonRpcError::method_not_found(&request.method))
            }
        };
        Some(response)
    }

    fn handle_initialize(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        let requested = request.params.get("protocolVersion").and_then(Value::as_str);
        let version = negotiate_protocol_version(requested);
        debug!("Handling initialize (client {:?}, answering {})", requested, version);

        JsonRpcResponse::success(
            request.id,
            json!({
                "protocolVersion": version,
                "serverInfo": {
                    "name": "salesforce-mcp",
                    "version": env!("CARGO_PKG_VERSION")
                },
                "capabilities": {
                    "tools": {"listChanged": false}
                }
            }),
        )
    }

    fn handle_tools_list(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        debug!("Handling tools/list");

        JsonRpcResponse::success(
            request.id,
            json!({
                "tools": self.tool_handler.list_tools()
            }),
        )
    }

    async fn handle_tools_call(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        let params: ToolCallParams = match serde_json::from_value(request.params) {
            Ok(params) => params,
            Err(e) => {
                return JsonRpcResponse::error(
                    request.id,
                    JsonRpcError::invalid_params(format!("Invalid tools/call params: {}", e)),
                );
            }
        };
        debug!("Handling tools/call for {}", params.name);

        let result = match self.tool_handler.execute(&params.name, params.arguments).await {
            Ok(result) => result,
            Err(e) => {
                warn!("Tool {} returned protocol error: {}", params.name, e);
                return JsonRpcResponse::error(request.id, JsonRpcError::from(&e));
            }
        };

        match CallToolResult::from_tool_result(&result).and_then(serde_json::to_value) {
            Ok(value) => JsonRpcResponse::success(request.id, value),
            Err(e) => JsonRpcResponse::error(
                request.id,
                JsonRpcError::internal_error(format!("Serialization error: {}", e)),
            ),
        }
    }
}

/// Last-resort line when even the fallback error cannot be serialized
const INTERNAL_ERROR_LINE: &str =
    r#"{"jsonrpc":"2.0","error":{"code":-32603,"message":"Serialization error"},"id":null}"#;

/// Serialize a response; on failure answer the same id with an internal error
fn encode_response<T: Serialize>(response: &T, id: Option<&Value>) -> String {
    serde_json::to_string(response).unwrap_or_else(|e| {
        error!("Failed to serialize response: {}", e);
        let fallback = JsonRpcResponse::error(
            id.cloned(),
            JsonRpcError::internal_error(format!("Serialization error: {}", e)),
        );
        serde_json::to_string(&fallback).unwrap_or_else(|_| INTERNAL_ERROR_LINE.to_string())
    })
}
