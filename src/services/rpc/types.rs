//! JSON-RPC Wire Types
//!
//! Request/response envelopes exchanged with the streaming application, and
//! the fixed error-code enumeration it reports failures with.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Correlation identifier assigned to every outbound request.
pub type CallId = u64;

/// Protocol version tag carried by every envelope.
pub const JSONRPC_VERSION: &str = "2.0";

/// Error codes used by the remote protocol.
///
/// The numeric values are fixed by the remote end; codes outside the known
/// set are preserved in `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "i64", into = "i64")]
pub enum ErrorCode {
    ParseError,
    InvalidRequest,
    MethodNotFound,
    InvalidParams,
    InternalJsonRpcError,
    InternalServerError,
    Other(i64),
}

impl ErrorCode {
    /// Numeric wire value.
    pub fn as_i64(self) -> i64 {
        match self {
            ErrorCode::ParseError => -32700,
            ErrorCode::InvalidRequest => -32600,
            ErrorCode::MethodNotFound => -32601,
            ErrorCode::InvalidParams => -32602,
            ErrorCode::InternalJsonRpcError => -32603,
            ErrorCode::InternalServerError => -32000,
            ErrorCode::Other(code) => code,
        }
    }
}

impl From<i64> for ErrorCode {
    fn from(code: i64) -> Self {
        match code {
            -32700 => ErrorCode::ParseError,
            -32600 => ErrorCode::InvalidRequest,
            -32601 => ErrorCode::MethodNotFound,
            -32602 => ErrorCode::InvalidParams,
            -32603 => ErrorCode::InternalJsonRpcError,
            -32000 => ErrorCode::InternalServerError,
            other => ErrorCode::Other(other),
        }
    }
}

impl From<ErrorCode> for i64 {
    fn from(code: ErrorCode) -> Self {
        code.as_i64()
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCode::Other(code) => write!(f, "{}", code),
            known => write!(f, "{:?} ({})", known, known.as_i64()),
        }
    }
}

/// `params` object of a request.
#[derive(Debug, Clone, PartialEq, Serialize)]
struct RequestParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    resource: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    args: Vec<Value>,
}

/// An outbound call. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Request {
    id: CallId,
    jsonrpc: &'static str,
    method: String,
    params: RequestParams,
}

impl Request {
    pub fn new(
        id: CallId,
        method: impl Into<String>,
        resource: Option<&str>,
        args: Vec<Value>,
    ) -> Self {
        Self {
            id,
            jsonrpc: JSONRPC_VERSION,
            method: method.into(),
            params: RequestParams {
                resource: resource.map(str::to_string),
                args,
            },
        }
    }

    pub fn id(&self) -> CallId {
        self.id
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    /// Resource the call is addressed to, if any.
    pub fn resource(&self) -> Option<&str> {
        self.params.resource.as_deref()
    }

    pub fn args(&self) -> &[Value] {
        &self.params.args
    }
}

/// Error object of a failed response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorObject {
    pub code: ErrorCode,
    pub message: String,
    #[serde(default)]
    pub data: Option<Value>,
}

/// An inbound response.
///
/// `id` is optional because the remote end also pushes event frames that are
/// not replies to any request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    #[serde(default)]
    pub id: Option<CallId>,
    #[serde(default)]
    pub jsonrpc: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorObject>,
}

impl Response {
    /// Build a success response.
    pub fn success(id: CallId, result: Value) -> Self {
        Self {
            id: Some(id),
            jsonrpc: Some(JSONRPC_VERSION.to_string()),
            result: Some(result),
            error: None,
        }
    }

    /// Build an error response.
    pub fn failure(id: CallId, error: ErrorObject) -> Self {
        Self {
            id: Some(id),
            jsonrpc: Some(JSONRPC_VERSION.to_string()),
            result: None,
            error: Some(error),
        }
    }

    /// Split into the result payload or the error object.
    ///
    /// An error field wins over a result field; a missing result is `null`.
    pub fn into_result(self) -> Result<Value, ErrorObject> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(self.result.unwrap_or(Value::Null)),
        }
    }
}
