/// JSON-RPC 2.0 Protocol Layer
///
/// This module contains the transport-independent JSON-RPC 2.0 building blocks:
/// - Envelope parsing and classification (request vs. notification)
/// - Response and error-object construction
/// - The reserved error codes used across the server
///
/// Parsing is pure and synchronous; transport concerns (HTTP status codes,
/// session mirroring) live in core::server.

use serde::Serialize;
use serde_json::Value;

/// JSON-RPC version identifier expected on every envelope.
pub const JSONRPC_VERSION: &str = "2.0";

/// Invalid JSON was received by the server.
pub const PARSE_ERROR: i32 = -32700;
/// The JSON sent is not a valid request object.
pub const INVALID_REQUEST: i32 = -32600;
/// The method does not exist or is not available.
pub const METHOD_NOT_FOUND: i32 = -32601;
/// Invalid method parameters.
pub const INVALID_PARAMS: i32 = -32602;
/// Internal JSON-RPC error.
pub const INTERNAL_ERROR: i32 = -32603;

/// JSON-RPC 2.0 error object.
///
/// Errors carry a numeric code, a human-readable message, and optional
/// additional data per the JSON-RPC 2.0 specification.
#[derive(Serialize, Debug, Clone)]
pub struct RpcError {
    /// JSON-RPC error code (e.g., -32601 for method not found)
    pub code: i32,
    /// Human-readable error message
    pub message: String,
    /// Optional additional error data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// JSON-RPC 2.0 response structure.
///
/// Responses include jsonrpc "2.0", the request id echoed verbatim (null when
/// the id could not be recovered), and exactly one of result or error.
#[derive(Serialize, Debug, Clone)]
pub struct RpcResponse {
    /// JSON-RPC version identifier, always "2.0"
    jsonrpc: String,
    /// Request ID from the original request, echoed verbatim and
    /// type-preserving. Serialized even when null.
    pub id: Value,
    /// Response result, present when the request succeeded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Error information, present when the request failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

impl RpcResponse {
    /// Build a success response carrying `result` for the given request id.
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Build an error response with the given code and message.
    pub fn error(id: Value, code: i32, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: None,
            error: Some(RpcError {
                code,
                message: message.into(),
                data: None,
            }),
        }
    }

    /// Error code carried by this response, if it is an error response.
    pub fn error_code(&self) -> Option<i32> {
        self.error.as_ref().map(|e| e.code)
    }
}

/// A validated JSON-RPC envelope, classified by the presence of an id.
///
/// An id that is present and non-null makes the envelope a Request that must
/// be answered; an absent or null id makes it a Notification that is
/// acknowledged at the transport level only.
#[derive(Debug, Clone)]
pub enum Envelope {
    Request {
        /// Request id, kept as a raw value so the reply preserves its type
        id: Value,
        method: String,
        params: Value,
    },
    Notification {
        method: String,
        #[allow(dead_code)]
        params: Value,
    },
}

impl Envelope {
    pub fn method(&self) -> &str {
        match self {
            Envelope::Request { method, .. } => method,
            Envelope::Notification { method, .. } => method,
        }
    }
}

/// Parse raw request bytes into a classified envelope.
///
/// Validation rules are applied in order:
/// 1. invalid JSON -> ParseError (-32700) with a null id
/// 2. top-level value not an object -> InvalidRequest (-32600)
/// 3. jsonrpc field not "2.0" -> InvalidRequest (-32600)
/// 4. method missing, non-string or empty -> InvalidRequest (-32600)
/// 5. otherwise classified by id: absent or null is a Notification,
///    anything else is a Request
///
/// On failure the returned error response carries the request id when it
/// could be recovered from the body, null otherwise.
pub fn parse_envelope(body: &[u8]) -> Result<Envelope, RpcResponse> {
    let value: Value = match serde_json::from_slice(body) {
        Ok(v) => v,
        Err(e) => {
            return Err(RpcResponse::error(
                Value::Null,
                PARSE_ERROR,
                format!("Parse error: {}", e),
            ));
        }
    };

    let obj = match value.as_object() {
        Some(o) => o,
        None => {
            return Err(RpcResponse::error(
                Value::Null,
                INVALID_REQUEST,
                "Invalid Request: body must be an object",
            ));
        }
    };

    // Best-effort id for error responses from this point on
    let id = obj.get("id").cloned().unwrap_or(Value::Null);

    match obj.get("jsonrpc").and_then(|v| v.as_str()) {
        Some(JSONRPC_VERSION) => {}
        _ => {
            return Err(RpcResponse::error(
                id,
                INVALID_REQUEST,
                "Invalid Request: jsonrpc must be \"2.0\"",
            ));
        }
    }

    let method = match obj.get("method").and_then(|v| v.as_str()) {
        Some(m) if !m.is_empty() => m.to_string(),
        _ => {
            return Err(RpcResponse::error(
                id,
                INVALID_REQUEST,
                "Invalid Request: method is required",
            ));
        }
    };

    let params = obj
        .get("params")
        .cloned()
        .unwrap_or_else(|| serde_json::json!({}));

    if id.is_null() {
        Ok(Envelope::Notification { method, params })
    } else {
        Ok(Envelope::Request { id, method, params })
    }
}
