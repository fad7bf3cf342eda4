//! MCP Server
//!
//! Handles the MCP protocol over stdio, processing JSON-RPC 2.0 messages one
//! line at a time. A request is answered before the next line is read.

use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, error, info, warn};

use crate::handler::Router;
use crate::protocol::{
    CallToolParams, InitializeResult, JsonRpcRequest, JsonRpcResponse, ListToolsResult,
    ServerCapabilities, ServerInfo, ToolsCapability, INTERNAL_ERROR, INVALID_PARAMS,
    METHOD_NOT_FOUND, PARSE_ERROR, PROTOCOL_VERSION,
};
use crate::tools::all_tools;

pub const SERVER_NAME: &str = "camp-bridge";

/// MCP Server that communicates over stdio
pub struct McpServer {
    router: Router,
    initialized: bool,
}

impl McpServer {
    pub fn new(router: Router) -> Self {
        Self {
            router,
            initialized: false,
        }
    }

    /// Run the server, reading from stdin and writing to stdout
    pub async fn run(&mut self) -> anyhow::Result<()> {
        let mut reader = BufReader::new(tokio::io::stdin());
        let mut stdout = tokio::io::stdout();
        let mut line = String::new();

        loop {
            line.clear();
            let bytes_read = reader.read_line(&mut line).await?;

            if bytes_read == 0 {
                info!("Client disconnected");
                break;
            }

            let message = line.trim();
            if message.is_empty() {
                continue;
            }

            debug!("Received: {}", message);

            if let Some(resp) = self.handle_message(message).await {
                let resp_str = serde_json::to_string(&resp)?;
                debug!("Sending: {}", resp_str);
                stdout.write_all(resp_str.as_bytes()).await?;
                stdout.write_all(b"\n").await?;
                stdout.flush().await?;
            }
        }

        Ok(())
    }

    /// Handle a single JSON-RPC message. Notifications get no response.
    async fn handle_message(&mut self, message: &str) -> Option<JsonRpcResponse> {
        let request: JsonRpcRequest = match serde_json::from_str(message) {
            Ok(req) => req,
            Err(e) => {
                error!("Failed to parse request: {}", e);
                return Some(JsonRpcResponse::error(
                    None,
                    PARSE_ERROR,
                    format!("Parse error: {}", e),
                ));
            }
        };

        let Some(id) = request.id else {
            self.handle_notification(&request.method);
            return None;
        };

        let response = match self.handle_request(&request.method, request.params).await {
            Ok(value) => JsonRpcResponse::success(Some(id), value),
            Err((code, message)) => JsonRpcResponse::error(Some(id), code, message),
        };
        Some(response)
    }

    fn handle_notification(&mut self, method: &str) {
        match method {
            "notifications/initialized" => {
                info!("Client initialized");
                self.initialized = true;
            }
            "notifications/cancelled" => debug!("Request cancelled"),
            _ => debug!("Unknown notification: {}", method),
        }
    }

    async fn handle_request(&mut self, method: &str, params: Option<Value>) -> Result<Value, (i32, String)> {
        match method {
            "initialize" => self.handle_initialize(),
            "tools/list" => to_result(ListToolsResult { tools: all_tools() }),
            "tools/call" => self.handle_call_tool(params).await,
            "ping" => Ok(json!({})),
            _ => {
                warn!("Unknown method: {}", method);
                Err((METHOD_NOT_FOUND, format!("Method not found: {}", method)))
            }
        }
    }

    fn handle_initialize(&self) -> Result<Value, (i32, String)> {
        info!("Initializing MCP server");

        to_result(InitializeResult {
            protocol_version: PROTOCOL_VERSION.to_string(),
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability {}),
            },
            server_info: ServerInfo {
                name: SERVER_NAME.to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
        })
    }

    async fn handle_call_tool(&mut self, params: Option<Value>) -> Result<Value, (i32, String)> {
        let params: CallToolParams = match params {
            Some(p) => serde_json::from_value(p)
                .map_err(|e| (INVALID_PARAMS, format!("Invalid params: {}", e)))?,
            None => return Err((INVALID_PARAMS, "Missing params".to_string())),
        };

        info!("Calling tool: {}", params.name);
        let result = self.router.handle_tool(&params.name, params.arguments).await;
        to_result(result)
    }
}

fn to_result<T: serde::Serialize>(value: T) -> Result<Value, (i32, String)> {
    serde_json::to_value(value).map_err(|e| (INTERNAL_ERROR, format!("Serialization error: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use camp_api::BasecampClient;
    use tempfile::TempDir;

    fn server(tmp: &TempDir) -> McpServer {
        let client = BasecampClient::new("token", Some("1".to_string())).with_base_url("http://127.0.0.1:9");
        McpServer::new(Router::new(client, tmp.path().join("index.json")))
    }

    async fn call(server: &mut McpServer, message: Value) -> Value {
        let resp = server
            .handle_message(&message.to_string())
            .await
            .expect("requests get a response");
        serde_json::to_value(resp).unwrap()
    }

    #[tokio::test]
    async fn test_initialize() {
        let tmp = TempDir::new().unwrap();
        let mut server = server(&tmp);

        let resp = call(
            &mut server,
            json!({ "jsonrpc": "2.0", "id": 1, "method": "initialize", "params": {} }),
        )
        .await;
        assert_eq!(resp["id"], 1);
        assert_eq!(resp["result"]["protocolVersion"], PROTOCOL_VERSION);
        assert_eq!(resp["result"]["serverInfo"]["name"], SERVER_NAME);
        assert!(resp["result"]["capabilities"]["tools"].is_object());
    }

    #[tokio::test]
    async fn test_notifications_get_no_response() {
        let tmp = TempDir::new().unwrap();
        let mut server = server(&tmp);

        let message = json!({ "jsonrpc": "2.0", "method": "notifications/initialized" }).to_string();
        assert!(server.handle_message(&message).await.is_none());
        assert!(server.initialized);
    }

    #[tokio::test]
    async fn test_protocol_errors() {
        let tmp = TempDir::new().unwrap();
        let mut server = server(&tmp);

        let parse = server.handle_message("{not json").await.unwrap();
        assert_eq!(parse.error.map(|e| e.code), Some(PARSE_ERROR));

        let unknown = call(&mut server, json!({ "jsonrpc": "2.0", "id": 2, "method": "resources/list" })).await;
        assert_eq!(unknown["error"]["code"], METHOD_NOT_FOUND);

        let no_params = call(&mut server, json!({ "jsonrpc": "2.0", "id": 3, "method": "tools/call" })).await;
        assert_eq!(no_params["error"]["code"], INVALID_PARAMS);
    }

    #[tokio::test]
    async fn test_ping_and_tools_list() {
        let tmp = TempDir::new().unwrap();
        let mut server = server(&tmp);

        let ping = call(&mut server, json!({ "jsonrpc": "2.0", "id": "p", "method": "ping" })).await;
        assert_eq!(ping["result"], json!({}));

        let list = call(&mut server, json!({ "jsonrpc": "2.0", "id": 4, "method": "tools/list" })).await;
        let tools = list["result"]["tools"].as_array().unwrap();
        assert_eq!(tools.len(), all_tools().len());
        assert!(tools.iter().any(|t| t["name"] == "basecamp_index_find_column"));
        assert!(tools[0]["inputSchema"]["properties"].is_object());
    }

    #[tokio::test]
    async fn test_tool_errors_are_results_not_rpc_errors() {
        let tmp = TempDir::new().unwrap();
        let mut server = server(&tmp);

        let resp = call(
            &mut server,
            json!({
                "jsonrpc": "2.0",
                "id": 5,
                "method": "tools/call",
                "params": { "name": "basecamp_get_card", "arguments": { "project_id": "1" } }
            }),
        )
        .await;
        assert!(resp.get("error").is_none());
        assert_eq!(resp["result"]["isError"], true);
        assert_eq!(resp["result"]["content"][0]["text"], "Missing required argument: card_id");
    }
}
