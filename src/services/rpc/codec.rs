//! Frame Codec
//!
//! One JSON object per line. Stateless; performs no I/O.

use serde_json::Value;
use thiserror::Error;

use super::types::{CallId, ErrorCode, Request, Response};

/// Byte terminating every frame.
pub const FRAME_DELIMITER: u8 = b'\n';

/// Errors produced while encoding or decoding a frame.
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("failed to serialize request: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("failed to parse frame: {0}")]
    Parse(#[source] serde_json::Error),
}

impl CodecError {
    /// Protocol error code this failure is classified as.
    ///
    /// A frame that cannot be parsed counts as a `ParseError`, the same as if
    /// the remote end had reported -32700.
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            CodecError::Parse(_) => Some(ErrorCode::ParseError),
            CodecError::Encode(_) => None,
        }
    }
}

/// Encode a request as a single newline-terminated frame.
///
/// Compact serde_json output escapes control characters inside strings, so a
/// newline in an argument is written as `\n` and the terminator is the only
/// raw delimiter in the frame.
pub fn encode(request: &Request) -> Result<Vec<u8>, CodecError> {
    let mut frame = serde_json::to_vec(request).map_err(CodecError::Encode)?;
    frame.push(FRAME_DELIMITER);
    Ok(frame)
}

/// Decode exactly one frame. A trailing `\n` or `\r\n` is accepted.
pub fn decode(frame: &[u8]) -> Result<Response, CodecError> {
    serde_json::from_slice(trim_delimiter(frame)).map_err(CodecError::Parse)
}

/// Best-effort extraction of the `id` from a frame that failed to decode,
/// so the waiting caller can be told instead of left hanging.
pub fn peek_id(frame: &[u8]) -> Option<CallId> {
    let value: Value = serde_json::from_slice(trim_delimiter(frame)).ok()?;
    value.get("id")?.as_u64()
}

fn trim_delimiter(frame: &[u8]) -> &[u8] {
    let frame = frame.strip_suffix(&[FRAME_DELIMITER]).unwrap_or(frame);
    frame.strip_suffix(b"\r").unwrap_or(frame)
}
