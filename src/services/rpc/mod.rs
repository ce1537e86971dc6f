//! Streaming Application RPC
//!
//! Request/response plumbing to the streaming application over its local
//! control channel.
//!
//! ## Architecture
//!
//! ```text
//! caller → RpcClient::call → codec::encode → channel write
//!                                              ↓
//! caller ← pending table ← codec::decode ← read loop
//! ```

pub mod client;
pub mod codec;
pub mod connect;
pub mod error;
pub mod types;

pub use client::{ConnectionState, RpcClient, TransportConfig, DEFAULT_CONNECT_TIMEOUT};
pub use codec::CodecError;
pub use connect::DEFAULT_ENDPOINT;
pub use error::RpcError;
pub use types::{CallId, ErrorCode, ErrorObject, Request, Response};
