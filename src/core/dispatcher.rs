/// Protocol Dispatcher
///
/// Maps one request envelope to one response envelope given the tool registry.
/// The dispatcher keeps no state between calls and never returns an error:
/// every failure, including a panicking tool, becomes an error envelope that
/// echoes the request `id`.
///
/// Methods:
/// - `initialize`: server name, version and protocol version
/// - `getMetadata`: every registered tool with its parameter schema
/// - `execute`: run a tool by name with named parameters
/// - `resources/list`: always empty, the server exposes tools only

use futures_util::FutureExt;
use serde_json::{Map, Value, json};
use std::any::Any;
use std::panic::AssertUnwindSafe;
use tracing::{debug, warn};

use crate::core::protocol::{MCPRequest, MCPResponse, Method, PROTOCOL_VERSION};
use crate::core::registry::ToolRegistry;

/// Server metadata reported by `initialize`.
#[derive(Clone, Debug)]
pub struct AppState {
    /// Server name as reported in initialize responses
    pub server_name: String,
    /// Server version string as reported in initialize responses
    pub server_version: String,
}

/// Decode one transport frame and dispatch it.
///
/// Text that is not JSON yields a Server Error with a `null` id.
pub async fn dispatch_line(registry: &ToolRegistry, state: &AppState, line: &str) -> MCPResponse {
    match serde_json::from_str::<Value>(line) {
        Ok(value) => dispatch_value(registry, state, value).await,
        Err(e) => {
            warn!(error = %e, "request is not valid JSON");
            MCPResponse::server_error(None, format!("Parse error: {e}"))
        }
    }
}

/// Dispatch an already parsed JSON value.
///
/// A value that is not a well-formed request envelope (not an object, or no
/// string `method`) yields a Server Error carrying the original `id` when one
/// can be recovered.
pub async fn dispatch_value(registry: &ToolRegistry, state: &AppState, value: Value) -> MCPResponse {
    let id = value.get("id").cloned().filter(|id| !id.is_null());
    match serde_json::from_value::<MCPRequest>(value) {
        Ok(request) => dispatch(registry, state, request).await,
        Err(e) => {
            warn!(error = %e, "malformed request envelope");
            MCPResponse::server_error(id, format!("Invalid request: {e}"))
        }
    }
}

/// Route a decoded request to its method handler.
pub async fn dispatch(registry: &ToolRegistry, state: &AppState, request: MCPRequest) -> MCPResponse {
    debug!(method = %request.method, id = ?request.id, "dispatching request");
    match Method::parse(&request.method) {
        Method::Initialize => handle_initialize(state, request.id),
        Method::GetMetadata => handle_get_metadata(registry, request.id),
        Method::Execute => handle_execute(registry, request.id, request.params).await,
        Method::ResourcesList => handle_resources_list(request.id),
        Method::Unknown(method) => {
            warn!(%method, "method not found");
            MCPResponse::method_not_found(request.id, format!("Method '{method}' not found"))
        }
    }
}

fn handle_initialize(state: &AppState, id: Option<Value>) -> MCPResponse {
    MCPResponse::success(
        id,
        json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": {},
            "serverInfo": {
                "name": state.server_name,
                "version": state.server_version
            }
        }),
    )
}

fn handle_get_metadata(registry: &ToolRegistry, id: Option<Value>) -> MCPResponse {
    let tools: Vec<Value> = registry.list_all().iter().map(|tool| tool.to_metadata()).collect();
    debug!(count = tools.len(), "listing tools");
    MCPResponse::success(id, json!({ "tools": tools }))
}

fn handle_resources_list(id: Option<Value>) -> MCPResponse {
    MCPResponse::success(id, json!({ "resources": [] }))
}

/// Run a tool.
///
/// `params.name` selects the tool and `params.parameters` (default `{}`)
/// carries its arguments. The arguments are bound against the tool's schema
/// first, then the handler is awaited with panics contained.
async fn handle_execute(registry: &ToolRegistry, id: Option<Value>, params: Option<Value>) -> MCPResponse {
    let params = match params {
        None | Some(Value::Null) => Map::new(),
        Some(Value::Object(map)) => map,
        Some(_) => return MCPResponse::server_error(id, "execute params must be an object"),
    };

    // A missing or non-string name is reported as an unknown tool.
    let tool_name = match params.get("name") {
        Some(Value::String(name)) => name.clone(),
        Some(other) => other.to_string(),
        None => "null".to_string(),
    };
    let tool = match params.get("name") {
        Some(Value::String(name)) => registry.lookup(name),
        _ => None,
    };

    let Some(tool) = tool else {
        warn!(tool = %tool_name, "tool not found");
        return MCPResponse::method_not_found(id, format!("Tool '{tool_name}' not found"));
    };

    let arguments = match params.get("parameters") {
        None | Some(Value::Null) => Map::new(),
        Some(Value::Object(map)) => map.clone(),
        Some(_) => return MCPResponse::server_error(id, "execute parameters must be an object"),
    };
    debug!(tool = %tool_name, parameters = ?arguments, "executing tool");

    let arguments = match tool.schema().bind(arguments) {
        Ok(arguments) => arguments,
        Err(e) => {
            warn!(tool = %tool_name, error = %e, "rejected tool arguments");
            return MCPResponse::server_error(id, e.to_string());
        }
    };

    let outcome = AssertUnwindSafe(async move { tool.invoke(arguments).await })
        .catch_unwind()
        .await;
    match outcome {
        Ok(Ok(content)) => {
            debug!(tool = %tool_name, "tool execution completed");
            MCPResponse::success(id, json!({ "content": content }))
        }
        Ok(Err(e)) => {
            warn!(tool = %tool_name, error = %e, "tool execution failed");
            MCPResponse::server_error(id, e.to_string())
        }
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            warn!(tool = %tool_name, %message, "tool panicked");
            MCPResponse::server_error(id, message)
        }
    }
}

/// Text carried by a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "internal error".to_string()
    }
}
