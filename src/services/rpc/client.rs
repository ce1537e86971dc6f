//! Correlated RPC Client
//!
//! JSON-RPC 2.0 over a single local duplex channel to the streaming
//! application. Any number of callers share the channel concurrently; one
//! background reader matches every inbound frame to the caller waiting on its
//! id, so responses complete callers in arrival order rather than issue order.

use std::future::Future;
use std::io;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::{oneshot, watch, Mutex};
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::codec::{self, CodecError, FRAME_DELIMITER};
use super::connect;
use super::error::RpcError;
use super::types::{CallId, Request, Response};

/// Default bound on the initial connect (2 seconds).
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_millis(2000);

/// Process-wide call id counter. Ids are never reused.
static NEXT_CALL_ID: AtomicU64 = AtomicU64::new(1);

fn next_call_id() -> CallId {
    NEXT_CALL_ID.fetch_add(1, Ordering::Relaxed)
}

/// Transport tuning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportConfig {
    /// Bound on the initial connect attempt.
    pub connect_timeout: Duration,
    /// Optional bound on each call; `None` waits for the response forever.
    pub call_timeout: Option<Duration>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            call_timeout: None,
        }
    }
}

/// Lifecycle of the transport. `Failed` and `Closed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Ready,
    /// The initial connect failed or timed out.
    Failed,
    /// The read loop ended after a successful connect.
    Closed,
}

/// A caller waiting for the response to one request.
struct PendingCall {
    method: String,
    responder: oneshot::Sender<Result<Value, RpcError>>,
}

type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// State shared between callers and the read loop.
struct Shared {
    /// In-flight calls keyed by call id; an entry is removed exactly once.
    pending: DashMap<CallId, PendingCall>,
    state: watch::Sender<ConnectionState>,
    /// Write half of the channel; the lock keeps each frame contiguous.
    writer: Mutex<Option<BoxedWriter>>,
}

impl Shared {
    async fn write_frame(&self, frame: &[u8]) -> Result<(), RpcError> {
        let mut guard = self.writer.lock().await;
        let writer = guard.as_mut().ok_or(RpcError::NotConnected)?;
        writer.write_all(frame).await?;
        writer.flush().await?;
        Ok(())
    }

    /// Hand a decoded response to its caller.
    fn resolve(&self, response: Response) {
        let Some(id) = response.id else {
            debug!("ignoring frame without id");
            return;
        };

        match self.pending.remove(&id) {
            Some((_, call)) => {
                debug!(id, method = %call.method, "rpc response received");
                let _ = call
                    .responder
                    .send(response.into_result().map_err(RpcError::from));
            }
            None => warn!(id, "unexpected response received"),
        }
    }

    /// Fail the caller of a frame that could not be decoded, if it can be
    /// identified.
    fn reject_malformed(&self, frame: &[u8], error: CodecError) {
        match codec::peek_id(frame).and_then(|id| self.pending.remove(&id)) {
            Some((id, call)) => {
                warn!(id, method = %call.method, error = %error, "malformed response");
                let _ = call.responder.send(Err(error.into()));
            }
            None => warn!(error = %error, "discarding malformed frame"),
        }
    }

    /// Enter `Closed` and fail every call still waiting.
    fn close(&self) {
        self.state.send_replace(ConnectionState::Closed);

        let ids: Vec<CallId> = self.pending.iter().map(|entry| *entry.key()).collect();
        let mut failed = 0usize;
        for id in ids {
            if let Some((_, call)) = self.pending.remove(&id) {
                let _ = call.responder.send(Err(RpcError::Closed));
                failed += 1;
            }
        }
        if failed > 0 {
            warn!(failed, "channel closed with calls in flight");
        }
    }
}

/// Client for the streaming application's request/response protocol.
pub struct RpcClient {
    shared: Arc<Shared>,
    state_rx: watch::Receiver<ConnectionState>,
    call_timeout: Option<Duration>,
    cancel: CancellationToken,
}

impl RpcClient {
    /// Start connecting with `connector` and return immediately.
    ///
    /// The connect attempt runs in a background task bounded by
    /// `config.connect_timeout`. On success the same task becomes the read
    /// loop for the lifetime of the connection. Must be called from within a
    /// tokio runtime.
    pub fn connect<F, S>(connector: F, config: &TransportConfig) -> Self
    where
        F: Future<Output = io::Result<S>> + Send + 'static,
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        let (state_tx, state_rx) = watch::channel(ConnectionState::Connecting);
        let shared = Arc::new(Shared {
            pending: DashMap::new(),
            state: state_tx,
            writer: Mutex::new(None),
        });
        let cancel = CancellationToken::new();

        let task_shared = Arc::clone(&shared);
        let task_cancel = cancel.clone();
        let connect_timeout = config.connect_timeout;
        tokio::spawn(async move {
            let attempt = tokio::select! {
                attempt = timeout(connect_timeout, connector) => attempt,
                _ = task_cancel.cancelled() => {
                    task_shared.state.send_replace(ConnectionState::Failed);
                    return;
                }
            };

            let stream = match attempt {
                Ok(Ok(stream)) => stream,
                Ok(Err(e)) => {
                    warn!(error = %e, "connect to streaming application failed");
                    task_shared.state.send_replace(ConnectionState::Failed);
                    return;
                }
                Err(_) => {
                    warn!(
                        timeout_ms = connect_timeout.as_millis() as u64,
                        "connect to streaming application timed out"
                    );
                    task_shared.state.send_replace(ConnectionState::Failed);
                    return;
                }
            };

            let (reader, writer) = tokio::io::split(stream);
            *task_shared.writer.lock().await = Some(Box::new(writer));
            task_shared.state.send_replace(ConnectionState::Ready);
            info!("connected to streaming application");

            Self::read_loop(reader, &task_shared, task_cancel).await;
            task_shared.close();
        });

        Self {
            shared,
            state_rx,
            call_timeout: config.call_timeout,
            cancel,
        }
    }

    /// Wrap an already-open duplex stream.
    pub fn from_stream<S>(stream: S, config: &TransportConfig) -> Self
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        Self::connect(async move { Ok(stream) }, config)
    }

    /// Connect to the local channel at `endpoint` (Unix socket path or
    /// Windows pipe name).
    pub fn connect_local(endpoint: &str, config: &TransportConfig) -> Self {
        let endpoint = endpoint.to_string();
        Self::connect(async move { connect::open(&endpoint).await }, config)
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ConnectionState {
        *self.state_rx.borrow()
    }

    /// Wait for the initial connect to settle.
    ///
    /// Returns `true` if it succeeded. Once settled the answer never changes,
    /// even if the channel later closes.
    pub async fn wait_ready(&self) -> bool {
        let mut rx = self.state_rx.clone();
        let settled = match rx
            .wait_for(|state| *state != ConnectionState::Connecting)
            .await
        {
            Ok(state) => *state,
            Err(_) => ConnectionState::Failed,
        };
        settled != ConnectionState::Failed
    }

    /// Number of calls waiting for a response.
    pub fn pending_calls(&self) -> usize {
        self.shared.pending.len()
    }

    /// Call `method` on `resource` and decode the result as `T`.
    pub async fn call<T>(
        &self,
        method: &str,
        resource: Option<&str>,
        args: Vec<Value>,
    ) -> Result<T, RpcError>
    where
        T: DeserializeOwned,
    {
        let result = self.request(method, resource, args).await?;
        serde_json::from_value(result).map_err(|source| RpcError::Decode {
            shape: std::any::type_name::<T>(),
            source,
        })
    }

    /// Call `method` on `resource`, reporting only success or failure.
    ///
    /// The remote end still answers every request; the result payload is
    /// discarded.
    pub async fn fire_and_forget(
        &self,
        method: &str,
        resource: Option<&str>,
        args: Vec<Value>,
    ) -> Result<(), RpcError> {
        self.request(method, resource, args).await.map(|_| ())
    }

    /// Stop the read loop. Calls still waiting fail with `RpcError::Closed`.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    async fn request(
        &self,
        method: &str,
        resource: Option<&str>,
        args: Vec<Value>,
    ) -> Result<Value, RpcError> {
        match self.state() {
            ConnectionState::Failed => return Err(RpcError::NotConnected),
            ConnectionState::Closed => return Err(RpcError::Closed),
            ConnectionState::Connecting | ConnectionState::Ready => {}
        }
        if !self.wait_ready().await {
            return Err(RpcError::NotConnected);
        }

        let id = next_call_id();
        let request = Request::new(id, method, resource, args);
        let frame = codec::encode(&request)?;

        let (tx, mut rx) = oneshot::channel();
        self.shared.pending.insert(
            id,
            PendingCall {
                method: method.to_string(),
                responder: tx,
            },
        );

        // The read loop may have closed between the readiness check and the
        // insert; its drain then either took our entry or never saw it.
        if self.state() == ConnectionState::Closed && self.shared.pending.remove(&id).is_some() {
            return Err(RpcError::Closed);
        }

        if let Err(e) = self.shared.write_frame(&frame).await {
            self.shared.pending.remove(&id);
            return Err(e);
        }
        debug!(id, method, "rpc request sent");

        let outcome = match self.call_timeout {
            None => rx.await,
            Some(limit) => match timeout(limit, &mut rx).await {
                Ok(outcome) => outcome,
                Err(_) => {
                    if self.shared.pending.remove(&id).is_some() {
                        return Err(RpcError::Timeout {
                            method: method.to_string(),
                            id,
                            timeout: limit,
                        });
                    }
                    // The read loop claimed the entry first; its answer is
                    // already on the way.
                    rx.await
                }
            },
        };

        outcome.unwrap_or(Err(RpcError::Closed))
    }

    async fn read_loop<R>(reader: R, shared: &Shared, cancel: CancellationToken)
    where
        R: AsyncRead + Unpin,
    {
        let mut reader = BufReader::new(reader);
        let mut frame = Vec::new();

        loop {
            frame.clear();
            let read = tokio::select! {
                read = reader.read_until(FRAME_DELIMITER, &mut frame) => read,
                _ = cancel.cancelled() => {
                    debug!("read loop stopped");
                    return;
                }
            };

            match read {
                Ok(0) => {
                    info!("streaming application closed the channel");
                    return;
                }
                Ok(_) => {}
                Err(e) => {
                    warn!(error = %e, "reading from streaming application failed");
                    return;
                }
            }

            if frame.iter().all(u8::is_ascii_whitespace) {
                continue;
            }

            match codec::decode(&frame) {
                Ok(response) => shared.resolve(response),
                Err(e) => shared.reject_malformed(&frame, e),
            }
        }
    }
}

impl Drop for RpcClient {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
