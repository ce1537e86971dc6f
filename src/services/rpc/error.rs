//! Transport Errors

use std::time::Duration;

use serde_json::Value;
use thiserror::Error;

use super::codec::CodecError;
use super::types::{CallId, ErrorCode, ErrorObject};

/// Errors surfaced to callers of [`super::RpcClient`].
#[derive(Error, Debug)]
pub enum RpcError {
    /// The initial connect failed or timed out, or no transport is configured.
    #[error("not connected to the streaming application")]
    NotConnected,

    /// The channel closed before a response arrived.
    #[error("connection to the streaming application closed")]
    Closed,

    #[error("request '{method}' (id={id}) timed out after {timeout:?}")]
    Timeout {
        method: String,
        id: CallId,
        timeout: Duration,
    },

    /// The remote end answered with an error object.
    #[error("remote error {code}: {message}")]
    Remote {
        code: ErrorCode,
        message: String,
        data: Option<Value>,
    },

    /// The result did not match the shape the caller asked for.
    #[error("failed to decode result as {shape}: {source}")]
    Decode {
        shape: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl RpcError {
    /// Protocol error code, when the failure has one.
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            RpcError::Remote { code, .. } => Some(*code),
            RpcError::Codec(err) => err.code(),
            _ => None,
        }
    }

    /// Returns `true` for failures that end the transport for every caller.
    pub fn is_transport_fatal(&self) -> bool {
        matches!(self, RpcError::NotConnected | RpcError::Closed | RpcError::Io(_))
    }
}

impl From<ErrorObject> for RpcError {
    fn from(error: ErrorObject) -> Self {
        RpcError::Remote {
            code: error.code,
            message: error.message,
            data: error.data,
        }
    }
}
