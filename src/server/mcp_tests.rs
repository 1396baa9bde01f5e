//! Unit tests for MCP protocol implementation.
//!
//! Tests JSON-RPC 2.0 request/response handling, the tool definition,
//! MCP type serialization and request dispatch.

use super::*;
use crate::config::Config;
use crate::server::AppState;
use crate::storage::InMemoryStorage;
use serde_json::json;
use std::sync::Arc;

fn create_test_server() -> McpServer {
    let state = AppState::new(Config::default(), InMemoryStorage::new());
    McpServer::new(Arc::new(state))
}

fn request(id: Option<Value>, method: &str, params: Option<Value>) -> JsonRpcRequest {
    JsonRpcRequest {
        jsonrpc: "2.0".to_string(),
        id,
        method: method.to_string(),
        params,
    }
}

/// Call the tool and decode the envelope from the text content.
async fn call_tool(server: &McpServer, arguments: Value) -> (Value, Option<Value>) {
    let response = server
        .handle_request(request(
            Some(json!(1)),
            "tools/call",
            Some(json!({"name": TOOL_NAME, "arguments": arguments})),
        ))
        .await
        .unwrap();
    let result = response.result.unwrap();
    let text = result["content"][0]["text"].as_str().unwrap();
    let envelope: Value = serde_json::from_str(text).unwrap();
    (envelope, result.get("isError").cloned())
}

// ============================================================================
// JsonRpcResponse tests
// ============================================================================

#[test]
fn test_jsonrpc_response_success_with_id() {
    let response = JsonRpcResponse::success(Some(json!(1)), json!({"result": "ok"}));

    assert_eq!(response.jsonrpc, "2.0");
    assert_eq!(response.id, json!(1));
    assert!(response.error.is_none());
    assert_eq!(response.result.unwrap()["result"], "ok");
}

#[test]
fn test_jsonrpc_response_success_without_id() {
    let response = JsonRpcResponse::success(None, json!({"data": "value"}));

    assert_eq!(response.id, Value::Null);
    assert!(response.result.is_some());
}

#[test]
fn test_jsonrpc_response_error_with_id() {
    let response = JsonRpcResponse::error(Some(json!(42)), -32600, "Invalid request");

    assert_eq!(response.id, json!(42));
    assert!(response.result.is_none());

    let error = response.error.unwrap();
    assert_eq!(error.code, -32600);
    assert_eq!(error.message, "Invalid request");
}

#[test]
fn test_jsonrpc_response_serialization() {
    let response = JsonRpcResponse::success(Some(json!(1)), json!({"test": true}));
    let serialized = serde_json::to_string(&response).unwrap();

    assert!(serialized.contains("\"jsonrpc\":\"2.0\""));
    assert!(serialized.contains("\"id\":1"));
    assert!(serialized.contains("\"result\""));
    assert!(!serialized.contains("\"error\""));
}

// ============================================================================
// Request deserialization tests
// ============================================================================

#[test]
fn test_jsonrpc_request_deserialization() {
    let json_str = r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{}}"#;
    let request: JsonRpcRequest = serde_json::from_str(json_str).unwrap();

    assert_eq!(request.jsonrpc, "2.0");
    assert_eq!(request.id, Some(json!(1)));
    assert_eq!(request.method, "initialize");
    assert!(request.params.is_some());
}

#[test]
fn test_jsonrpc_notification_no_id() {
    let json_str = r#"{"jsonrpc":"2.0","method":"initialized"}"#;
    let request: JsonRpcRequest = serde_json::from_str(json_str).unwrap();

    assert!(request.id.is_none());
    assert!(request.params.is_none());
}

#[test]
fn test_tool_call_params_deserialization() {
    let json_str = r#"{"name":"tree_of_thoughts","arguments":{"action":"list_sessions"}}"#;
    let params: ToolCallParams = serde_json::from_str(json_str).unwrap();

    assert_eq!(params.name, "tree_of_thoughts");
    assert_eq!(params.arguments.unwrap()["action"], "list_sessions");
}

// ============================================================================
// Tool definition tests
// ============================================================================

#[test]
fn test_tree_of_thoughts_tool_definition() {
    let tool = get_tree_of_thoughts_tool();
    assert_eq!(tool.name, "tree_of_thoughts");
    assert_eq!(tool.input_schema["type"], "object");
    assert_eq!(tool.input_schema["required"], json!(["action"]));

    let actions = tool.input_schema["properties"]["action"]["enum"]
        .as_array()
        .unwrap();
    assert_eq!(actions.len(), 9);
    assert!(actions.contains(&json!("display_results")));
}

#[test]
fn test_tool_schema_bounds() {
    let props = &get_tree_of_thoughts_tool().input_schema["properties"];
    assert_eq!(props["value"]["minimum"], 1);
    assert_eq!(props["value"]["maximum"], 10);
    assert_eq!(props["confidence"]["maximum"], 1);
    assert_eq!(
        props["viability"]["enum"],
        json!(["promising", "uncertain", "dead_end"])
    );
}

// ============================================================================
// MCP type serialization tests
// ============================================================================

#[test]
fn test_initialize_result_serialization() {
    let result = InitializeResult {
        protocol_version: PROTOCOL_VERSION.to_string(),
        capabilities: Capabilities {
            tools: ToolCapabilities {
                list_changed: false,
            },
        },
        server_info: ServerInfo {
            name: "test-server".to_string(),
            version: "1.0.0".to_string(),
        },
    };

    let json = serde_json::to_value(&result).unwrap();

    assert_eq!(json["protocolVersion"], "2024-11-05");
    assert_eq!(json["capabilities"]["tools"]["listChanged"], false);
    assert_eq!(json["serverInfo"]["name"], "test-server");
}

#[test]
fn test_tool_call_result_serialization() {
    let result = ToolCallResult {
        content: vec![ToolResultContent {
            content_type: "text".to_string(),
            text: "Hello, world!".to_string(),
        }],
        is_error: None,
    };

    let json = serde_json::to_value(&result).unwrap();

    assert_eq!(json["content"][0]["type"], "text");
    assert!(json.get("isError").is_none());
}

// ============================================================================
// Dispatch tests
// ============================================================================

#[tokio::test]
async fn test_initialize() {
    let server = create_test_server();
    let response = server
        .handle_request(request(Some(json!(1)), "initialize", Some(json!({}))))
        .await
        .unwrap();

    let result = response.result.unwrap();
    assert_eq!(result["protocolVersion"], PROTOCOL_VERSION);
    assert_eq!(result["serverInfo"]["name"], SERVER_NAME);
}

#[tokio::test]
async fn test_notifications_get_no_response() {
    let server = create_test_server();
    assert!(server
        .handle_request(request(None, "initialized", None))
        .await
        .is_none());
    assert!(server
        .handle_request(request(None, "notifications/whatever", None))
        .await
        .is_none());
}

#[tokio::test]
async fn test_unknown_method() {
    let server = create_test_server();
    let response = server
        .handle_request(request(Some(json!(7)), "resources/list", None))
        .await
        .unwrap();
    assert_eq!(response.error.unwrap().code, -32601);
}

#[tokio::test]
async fn test_tools_list_returns_single_tool() {
    let server = create_test_server();
    let response = server
        .handle_request(request(Some(json!(2)), "tools/list", None))
        .await
        .unwrap();

    let tools = response.result.unwrap()["tools"].as_array().unwrap().clone();
    assert_eq!(tools.len(), 1);
    assert_eq!(tools[0]["name"], TOOL_NAME);
}

#[tokio::test]
async fn test_tools_call_missing_params() {
    let server = create_test_server();
    let response = server
        .handle_request(request(Some(json!(3)), "tools/call", None))
        .await
        .unwrap();
    assert_eq!(response.error.unwrap().code, -32602);
}

#[tokio::test]
async fn test_tools_call_success_is_not_error() {
    let server = create_test_server();
    let (envelope, is_error) = call_tool(
        &server,
        json!({"action": "create_session", "problem_statement": "p"}),
    )
    .await;

    assert_eq!(envelope["success"], true);
    assert!(is_error.is_none());
}

#[tokio::test]
async fn test_tools_call_failure_sets_is_error() {
    let server = create_test_server();
    let (envelope, is_error) = call_tool(
        &server,
        json!({"action": "get_session", "session_id": "tot_session_missing"}),
    )
    .await;

    assert_eq!(envelope["success"], false);
    assert_eq!(envelope["error"], "NOT_FOUND");
    assert_eq!(is_error, Some(json!(true)));
}

#[tokio::test]
async fn test_tools_call_unknown_tool() {
    let server = create_test_server();
    let response = server
        .handle_request(request(
            Some(json!(4)),
            "tools/call",
            Some(json!({"name": "reasoning_linear", "arguments": {}})),
        ))
        .await
        .unwrap();

    assert!(response.result.is_none());
    let error = response.error.unwrap();
    assert_eq!(error.code, -32602);
    assert!(error.message.contains("Unknown tool"));
}

#[tokio::test]
async fn test_run_with_line_protocol() {
    let server = create_test_server();
    let input = concat!(
        r#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#,
        "\n\n",
        "not json\n",
        r#"{"jsonrpc":"2.0","method":"initialized"}"#,
        "\n",
    );
    let mut output = Vec::new();

    server
        .run_with(input.as_bytes(), &mut output)
        .await
        .unwrap();

    let lines: Vec<Value> = String::from_utf8(output)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["id"], 1);
    assert_eq!(lines[0]["result"], json!({}));
    assert_eq!(lines[1]["error"]["code"], -32700);
    assert_eq!(lines[1]["id"], Value::Null);
}
