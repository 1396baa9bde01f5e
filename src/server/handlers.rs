//! Tool call routing for the `tree_of_thoughts` tool.
//!
//! Arguments carry an `action` discriminator and are decoded into the closed
//! [`TotRequest`] enum. Every outcome, success or failure, is rendered as a
//! JSON envelope:
//! - success: `{"success": true, "action": ..., <result fields>}`
//! - failure: `{"success": false, "error": <CODE>, "message": ...}`

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Instant;
use tracing::{debug, info, warn};

use super::SharedState;
use crate::error::{AppError, AppResult, McpError, McpResult, ToolError};
use crate::modes::{
    serialize_for_log, AddEvaluationParams, AddThoughtsParams, BacktrackParams,
    CreateSessionParams, SearchNextParams, SessionParams, SetSolutionParams,
};

/// Name under which the engine is exposed to MCP clients.
pub const TOOL_NAME: &str = "tree_of_thoughts";

/// A decoded `tree_of_thoughts` call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum TotRequest {
    /// Start a session with an implicit root node.
    CreateSession(CreateSessionParams),
    /// Append thoughts under a parent.
    AddThoughts(AddThoughtsParams),
    /// Record a node evaluation.
    AddEvaluation(AddEvaluationParams),
    /// Select the next node to explore.
    SearchNext(SearchNextParams),
    /// Retire a dead end.
    Backtrack(BacktrackParams),
    /// Record the final answer.
    SetSolution(SetSolutionParams),
    /// Dump one session.
    GetSession(SessionParams),
    /// Summarize all sessions.
    ListSessions {},
    /// Rank evaluated nodes.
    DisplayResults(SessionParams),
}

impl TotRequest {
    /// The wire name of this action.
    pub fn action(&self) -> &'static str {
        match self {
            TotRequest::CreateSession(_) => "create_session",
            TotRequest::AddThoughts(_) => "add_thoughts",
            TotRequest::AddEvaluation(_) => "add_evaluation",
            TotRequest::SearchNext(_) => "search_next",
            TotRequest::Backtrack(_) => "backtrack",
            TotRequest::SetSolution(_) => "set_solution",
            TotRequest::GetSession(_) => "get_session",
            TotRequest::ListSessions {} => "list_sessions",
            TotRequest::DisplayResults(_) => "display_results",
        }
    }
}

/// Successful call: result fields flattened next to the discriminators.
#[derive(Debug, Serialize)]
struct SuccessEnvelope<'a> {
    success: bool,
    action: &'a str,
    #[serde(flatten)]
    payload: Value,
}

/// Failed call.
#[derive(Debug, Serialize)]
struct ErrorEnvelope<'a> {
    success: bool,
    error: &'a str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    action: Option<String>,
}

/// Route tool calls to appropriate handlers
pub async fn handle_tool_call(
    state: &SharedState,
    tool_name: &str,
    arguments: Option<Value>,
) -> McpResult<Value> {
    info!(tool = %tool_name, "Routing tool call");

    match tool_name {
        TOOL_NAME => Ok(handle_tree_of_thoughts(state, arguments).await),
        _ => Err(McpError::UnknownTool {
            tool_name: tool_name.to_string(),
        }),
    }
}

/// Handle a `tree_of_thoughts` call, always producing an envelope.
pub async fn handle_tree_of_thoughts(state: &SharedState, arguments: Option<Value>) -> Value {
    let start = Instant::now();
    let requested_action = arguments
        .as_ref()
        .and_then(|args| args.get("action"))
        .and_then(Value::as_str)
        .map(str::to_string);

    let outcome = match parse_request(arguments) {
        Ok(request) => {
            debug!(
                request = %serialize_for_log(&request, TOOL_NAME),
                "Dispatching tree_of_thoughts action"
            );
            let action = request.action();
            dispatch(state, request).await.map(|payload| (action, payload))
        }
        Err(e) => Err(e),
    };

    let latency_ms = start.elapsed().as_millis() as u64;

    match outcome {
        Ok((action, payload)) => {
            info!(action = %action, latency_ms, "Action completed");
            render(&SuccessEnvelope {
                success: true,
                action,
                payload,
            })
        }
        Err(e) => {
            warn!(
                action = ?requested_action,
                code = e.code(),
                error = %e,
                latency_ms,
                "Action failed"
            );
            render(&ErrorEnvelope {
                success: false,
                error: e.code(),
                message: e.to_string(),
                action: requested_action,
            })
        }
    }
}

/// Decode raw arguments into a request; malformed input is a validation error.
fn parse_request(arguments: Option<Value>) -> AppResult<TotRequest> {
    let args = arguments.ok_or_else(|| ToolError::validation("arguments", "Missing arguments"))?;
    serde_json::from_value(args)
        .map_err(|e| ToolError::validation("arguments", e.to_string()).into())
}

async fn dispatch(state: &SharedState, request: TotRequest) -> AppResult<Value> {
    let mode = &state.tot_mode;

    match request {
        TotRequest::CreateSession(params) => to_payload(mode.create_session(params).await?),
        TotRequest::AddThoughts(params) => to_payload(mode.add_thoughts(params).await?),
        TotRequest::AddEvaluation(params) => to_payload(mode.add_evaluation(params).await?),
        TotRequest::SearchNext(params) => to_payload(mode.search_next(params).await?),
        TotRequest::Backtrack(params) => to_payload(mode.backtrack(params).await?),
        TotRequest::SetSolution(params) => to_payload(mode.set_solution(params).await?),
        TotRequest::GetSession(params) => to_payload(mode.get_session(params).await?),
        TotRequest::ListSessions {} => to_payload(mode.list_sessions().await?),
        TotRequest::DisplayResults(params) => to_payload(mode.display_results(params).await?),
    }
}

fn to_payload<T: Serialize>(result: T) -> AppResult<Value> {
    serde_json::to_value(result).map_err(|e| AppError::from(McpError::Json(e)))
}

fn render<T: Serialize>(envelope: &T) -> Value {
    serde_json::to_value(envelope).unwrap_or_else(|e| {
        serde_json::json!({
            "success": false,
            "error": "INTERNAL_ERROR",
            "message": format!("Failed to serialize response: {}", e),
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::server::AppState;
    use crate::storage::InMemoryStorage;
    use serde_json::json;
    use std::sync::Arc;

    fn state() -> SharedState {
        Arc::new(AppState::new(Config::default(), InMemoryStorage::new()))
    }

    async fn call(state: &SharedState, args: Value) -> Value {
        handle_tool_call(state, TOOL_NAME, Some(args)).await.unwrap()
    }

    #[test]
    fn test_request_decoding() {
        let request: TotRequest = serde_json::from_value(json!({
            "action": "add_thoughts",
            "session_id": "s",
            "thoughts": ["a", "b"]
        }))
        .unwrap();
        assert_eq!(request.action(), "add_thoughts");
        match request {
            TotRequest::AddThoughts(params) => {
                assert_eq!(params.contents, vec!["a", "b"]);
                assert!(params.parent_node_id.is_none());
            }
            other => panic!("unexpected request: {:?}", other),
        }
    }

    #[test]
    fn test_request_decoding_flattened_evaluation() {
        let request: TotRequest = serde_json::from_value(json!({
            "action": "add_evaluation",
            "session_id": "s",
            "node_id": "n",
            "value": 7,
            "confidence": 0.8,
            "viability": "promising"
        }))
        .unwrap();
        match request {
            TotRequest::AddEvaluation(params) => {
                assert_eq!(params.evaluation.value, 7);
                assert_eq!(params.evaluation.viability, "promising");
            }
            other => panic!("unexpected request: {:?}", other),
        }
    }

    #[test]
    fn test_list_sessions_needs_no_fields() {
        let request: TotRequest =
            serde_json::from_value(json!({"action": "list_sessions"})).unwrap();
        assert_eq!(request.action(), "list_sessions");
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let err = handle_tool_call(&state(), "reasoning_linear", Some(json!({})))
            .await
            .unwrap_err();
        assert!(matches!(err, McpError::UnknownTool { .. }));
    }

    #[tokio::test]
    async fn test_unknown_action_is_validation_error() {
        let response = call(&state(), json!({"action": "explode"})).await;
        assert_eq!(response["success"], false);
        assert_eq!(response["error"], "VALIDATION_ERROR");
        assert_eq!(response["action"], "explode");
    }

    #[tokio::test]
    async fn test_missing_arguments() {
        let response = handle_tool_call(&state(), TOOL_NAME, None).await.unwrap();
        assert_eq!(response["success"], false);
        assert_eq!(response["error"], "VALIDATION_ERROR");
        assert!(response.get("action").is_none());
    }

    #[tokio::test]
    async fn test_missing_field_is_validation_error() {
        let response = call(&state(), json!({"action": "add_thoughts", "session_id": "s"})).await;
        assert_eq!(response["error"], "VALIDATION_ERROR");
        assert!(response["message"]
            .as_str()
            .unwrap()
            .contains("contents"));
    }

    #[tokio::test]
    async fn test_success_envelope_flattens_result() {
        let response = call(
            &state(),
            json!({"action": "create_session", "problem_statement": "pick a DB"}),
        )
        .await;
        assert_eq!(response["success"], true);
        assert_eq!(response["action"], "create_session");
        assert!(response["session_id"]
            .as_str()
            .unwrap()
            .starts_with("tot_session_"));
        assert_eq!(response["configuration"]["search_strategy"], "breadth_first");
        assert_eq!(response["status"], "active");
    }

    #[tokio::test]
    async fn test_unknown_session_envelope() {
        let response = call(
            &state(),
            json!({"action": "search_next", "session_id": "tot_session_missing"}),
        )
        .await;
        assert_eq!(response["success"], false);
        assert_eq!(response["error"], "NOT_FOUND");
        assert!(response["message"]
            .as_str()
            .unwrap()
            .contains("tot_session_missing"));
    }

    #[tokio::test]
    async fn test_list_sessions_envelope() {
        let state = state();
        call(&state, json!({"action": "create_session", "problem_statement": "a"})).await;
        let response = call(&state, json!({"action": "list_sessions"})).await;
        assert_eq!(response["success"], true);
        assert_eq!(response["total_sessions"], 1);
        assert_eq!(response["sessions"][0]["total_nodes"], 1);
    }
}
