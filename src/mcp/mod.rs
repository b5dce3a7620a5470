//! MCP dispatcher - routes JSON-RPC methods onto the tool runner and the
//! read-only resources.
//!
//! Transport agnostic: stdio and HTTP both hand raw lines or bodies to
//! [`McpServer::handle_message`].

pub mod jsonrpc;

use std::sync::Arc;

use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::gateway::Gateway;
use crate::tools::ToolRunner;
use jsonrpc::{error_codes, JsonRpcRequest, JsonRpcResponse, JSONRPC_VERSION};

pub const PROTOCOL_VERSION: &str = "2024-11-05";
pub const SERVER_NAME: &str = "ai-factory";

pub const PROVIDERS_URI: &str = "providers://status";
pub const USAGE_URI: &str = "usage://summary";

#[derive(Debug, Deserialize)]
struct CallParams {
    name: String,
    #[serde(default)]
    arguments: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct ReadParams {
    uri: String,
}

/// MCP server state: the gateway plus the tools built over it.
pub struct McpServer {
    gateway: Arc<Gateway>,
    tools: ToolRunner,
}

impl McpServer {
    pub fn new(gateway: Arc<Gateway>) -> Self {
        let tools = ToolRunner::new_with_defaults(gateway.clone());
        Self { gateway, tools }
    }

    /// Handle one raw JSON-RPC message.
    ///
    /// Returns the serialized response, or `None` for notifications.
    pub async fn handle_message(&self, raw: &str) -> Option<String> {
        let response = match serde_json::from_str::<Value>(raw) {
            Err(e) => {
                warn!("Discarding unparseable message: {}", e);
                Some(JsonRpcResponse::error(
                    None,
                    error_codes::PARSE_ERROR,
                    format!("Parse error: {e}"),
                ))
            }
            Ok(value) => {
                let id = value.get("id").cloned();
                match serde_json::from_value::<JsonRpcRequest>(value) {
                    Ok(request) => self.handle_request(request).await,
                    Err(e) => Some(JsonRpcResponse::error(
                        id,
                        error_codes::INVALID_REQUEST,
                        format!("Invalid request: {e}"),
                    )),
                }
            }
        };

        response.and_then(encode)
    }

    /// Handle a raw message that may not be valid UTF-8.
    ///
    /// Undecodable bytes get the same parse error reply as malformed JSON.
    pub async fn handle_bytes(&self, raw: &[u8]) -> Option<String> {
        match std::str::from_utf8(raw) {
            Ok(text) => self.handle_message(text).await,
            Err(e) => {
                warn!("Discarding non UTF-8 message: {}", e);
                encode(JsonRpcResponse::error(
                    None,
                    error_codes::PARSE_ERROR,
                    format!("Parse error: {e}"),
                ))
            }
        }
    }

    /// Dispatch a parsed request. Notifications never get a response.
    pub async fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        debug!("MCP request: {}", request.method);

        if request.is_notification() {
            if request.method != "notifications/initialized" {
                debug!("Ignoring notification {}", request.method);
            }
            return None;
        }

        if request.jsonrpc != JSONRPC_VERSION {
            return Some(JsonRpcResponse::error(
                request.id,
                error_codes::INVALID_REQUEST,
                format!("Invalid JSON-RPC version: {}", request.jsonrpc),
            ));
        }

        let id = request.id.clone();
        let response = match request.method.as_str() {
            "initialize" => JsonRpcResponse::success(id, self.initialize_result()),
            "ping" => JsonRpcResponse::success(id, json!({})),
            "tools/list" => JsonRpcResponse::success(id, json!({ "tools": self.tools.definitions() })),
            "tools/call" => self.call_tool(id, request.params).await,
            "resources/list" => JsonRpcResponse::success(id, Self::resource_list()),
            "resources/read" => self.read_resource(id, request.params),
            other => JsonRpcResponse::error(
                id,
                error_codes::METHOD_NOT_FOUND,
                format!("Unknown request: {other}"),
            ),
        };
        Some(response)
    }

    fn initialize_result(&self) -> Value {
        json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": {
                "tools": {},
                "resources": {}
            },
            "serverInfo": {
                "name": SERVER_NAME,
                "version": env!("CARGO_PKG_VERSION")
            }
        })
    }

    async fn call_tool(&self, id: Option<Value>, params: Option<Value>) -> JsonRpcResponse {
        let params: CallParams = match params.map(serde_json::from_value) {
            Some(Ok(params)) => params,
            Some(Err(e)) => {
                return JsonRpcResponse::error(id, error_codes::INVALID_PARAMS, e.to_string())
            }
            None => {
                return JsonRpcResponse::error(id, error_codes::INVALID_PARAMS, "Missing params")
            }
        };

        let arguments = params.arguments.unwrap_or_else(|| json!({}));
        let output = self.tools.call(&params.name, arguments).await;

        match serde_json::to_value(output) {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err(e) => JsonRpcResponse::error(id, error_codes::INTERNAL_ERROR, e.to_string()),
        }
    }

    fn resource_list() -> Value {
        json!({
            "resources": [
                {
                    "uri": PROVIDERS_URI,
                    "name": "AI Provider Status",
                    "mimeType": "application/json",
                    "description": "Current status of all configured AI providers"
                },
                {
                    "uri": USAGE_URI,
                    "name": "AI Usage Summary",
                    "mimeType": "application/json",
                    "description": "Per-provider request counts, latency and recent errors"
                }
            ]
        })
    }

    /// JSON body of a known resource.
    pub fn resource_json(&self, uri: &str) -> Option<Value> {
        let value = match uri {
            PROVIDERS_URI => serde_json::to_value(self.gateway.registry.status()),
            USAGE_URI => serde_json::to_value(self.gateway.usage.get_summary()),
            _ => return None,
        };
        value.ok()
    }

    fn read_resource(&self, id: Option<Value>, params: Option<Value>) -> JsonRpcResponse {
        let params: ReadParams = match params.map(serde_json::from_value) {
            Some(Ok(params)) => params,
            Some(Err(e)) => {
                return JsonRpcResponse::error(id, error_codes::INVALID_PARAMS, e.to_string())
            }
            None => {
                return JsonRpcResponse::error(id, error_codes::INVALID_PARAMS, "Missing params")
            }
        };

        // Unknown URIs read as empty
        let contents = match self.resource_json(&params.uri) {
            Some(body) => {
                let text = serde_json::to_string_pretty(&body).unwrap_or_default();
                vec![json!({
                    "uri": params.uri,
                    "mimeType": "application/json",
                    "text": text
                })]
            }
            None => Vec::new(),
        };

        JsonRpcResponse::success(id, json!({ "contents": contents }))
    }
}

fn encode(response: JsonRpcResponse) -> Option<String> {
    match serde_json::to_string(&response) {
        Ok(text) => Some(text),
        Err(e) => {
            warn!("Failed to serialize response: {}", e);
            None
        }
    }
}
