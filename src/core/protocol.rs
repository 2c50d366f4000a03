/// JSON-RPC Envelopes
///
/// Request and response structures exchanged over every transport, the error
/// codes the server emits, and the fixed set of control methods it answers.

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const JSONRPC_VERSION: &str = "2.0";

/// Protocol version reported by `initialize`.
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// Unknown top-level method, or unknown tool name inside `execute`.
pub const METHOD_NOT_FOUND: i32 = -32601;

/// Any failure while decoding or serving a request.
pub const SERVER_ERROR: i32 = -32000;

/// JSON-RPC 2.0 request envelope.
///
/// `jsonrpc` is accepted but not enforced. `id` is an opaque correlation token
/// echoed back unchanged; an absent `id` is answered with `null`.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct MCPRequest {
    #[serde(default)]
    pub jsonrpc: Option<String>,
    #[serde(default)]
    pub id: Option<Value>,
    pub method: String,
    #[serde(default)]
    pub params: Option<Value>,
}

/// JSON-RPC 2.0 response envelope.
///
/// Exactly one of `result` and `error` is present; the constructors are the
/// only way to build one.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MCPResponse {
    jsonrpc: String,
    id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<MCPError>,
}

/// JSON-RPC 2.0 error object.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct MCPError {
    pub code: i32,
    pub message: String,
}

impl MCPResponse {
    pub fn success(id: Option<Value>, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id: id.unwrap_or(Value::Null),
            result: Some(result),
            error: None,
        }
    }

    pub fn failure(id: Option<Value>, code: i32, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id: id.unwrap_or(Value::Null),
            result: None,
            error: Some(MCPError {
                code,
                message: message.into(),
            }),
        }
    }

    pub fn method_not_found(id: Option<Value>, message: impl Into<String>) -> Self {
        Self::failure(id, METHOD_NOT_FOUND, message)
    }

    pub fn server_error(id: Option<Value>, message: impl Into<String>) -> Self {
        Self::failure(id, SERVER_ERROR, message)
    }

    pub fn id(&self) -> &Value {
        &self.id
    }

    pub fn result(&self) -> Option<&Value> {
        self.result.as_ref()
    }

    pub fn error(&self) -> Option<&MCPError> {
        self.error.as_ref()
    }

    /// Encode as a single JSON line (without the trailing newline).
    ///
    /// Encoding cannot fail for values built from `serde_json::Value`; should
    /// it ever, a fixed Server Error line is returned instead.
    pub fn to_line(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            tracing::error!(error = %e, "failed to encode response");
            format!(
                r#"{{"jsonrpc":"2.0","id":null,"error":{{"code":{SERVER_ERROR},"message":"failed to encode response"}}}}"#
            )
        })
    }
}

/// Control methods understood by the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Method {
    Initialize,
    GetMetadata,
    Execute,
    ResourcesList,
    Unknown(String),
}

impl Method {
    pub fn parse(name: &str) -> Self {
        match name {
            "initialize" => Method::Initialize,
            "getMetadata" => Method::GetMetadata,
            "execute" => Method::Execute,
            "resources/list" => Method::ResourcesList,
            other => Method::Unknown(other.to_string()),
        }
    }
}
