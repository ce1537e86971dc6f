//! Test doubles shared by the integration tests: a scripted streaming
//! application on the far end of an in-memory channel, and a chat adapter
//! driven from the test.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::{mpsc, Mutex};

use streambot::services::remote::{ChatAdapter, ChatAdapterType, ChatError, ChatEvent};
use streambot::services::rpc::{RpcClient, TransportConfig};

// ============================================================================
// Fake streaming application
// ============================================================================

/// Answer for one request: a result, or an error code and message.
pub type Answer = Result<Value, (i64, &'static str)>;

/// Requests received by the fake, in arrival order.
#[derive(Clone, Default)]
pub struct RequestLog(Arc<StdMutex<Vec<Value>>>);

impl RequestLog {
    pub fn all(&self) -> Vec<Value> {
        self.0.lock().unwrap().clone()
    }

    pub fn methods(&self) -> Vec<String> {
        self.all()
            .iter()
            .map(|req| req["method"].as_str().unwrap_or_default().to_string())
            .collect()
    }
}

/// Connect a client to a fake that answers every request with `answer`.
pub fn spawn_fake_obs<F>(answer: F) -> (Arc<RpcClient>, RequestLog)
where
    F: Fn(&Value) -> Answer + Send + 'static,
{
    let (client_io, server_io) = tokio::io::duplex(64 * 1024);
    let log = RequestLog::default();

    let server_log = log.clone();
    tokio::spawn(async move {
        let (reader, mut writer) = tokio::io::split(server_io);
        let mut lines = BufReader::new(reader).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            let request: Value = serde_json::from_str(&line).expect("client sent valid JSON");
            server_log.0.lock().unwrap().push(request.clone());

            let response = match answer(&request) {
                Ok(result) => json!({"id": request["id"], "jsonrpc": "2.0", "result": result}),
                Err((code, message)) => json!({
                    "id": request["id"],
                    "jsonrpc": "2.0",
                    "error": {"code": code, "message": message, "data": null},
                }),
            };
            let mut frame = serde_json::to_vec(&response).unwrap();
            frame.push(b'\n');
            if writer.write_all(&frame).await.is_err() {
                break;
            }
        }
    });

    let client = RpcClient::from_stream(client_io, &TransportConfig::default());
    (Arc::new(client), log)
}

// ============================================================================
// Fake chat adapter
// ============================================================================

/// Chat adapter whose events come from the test.
#[derive(Default)]
pub struct FakeChat {
    events: Mutex<Option<mpsc::Sender<ChatEvent>>>,
    sent: StdMutex<Vec<(String, String)>>,
    stopped: AtomicBool,
}

impl FakeChat {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Deliver `event` to the engine, waiting for the engine to start first.
    pub async fn emit(&self, event: ChatEvent) {
        for _ in 0..200 {
            if let Some(tx) = self.events.lock().await.as_ref() {
                tx.send(event).await.expect("engine is receiving");
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("engine never started the adapter");
    }

    /// `(channel, text)` of every message sent so far.
    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChatAdapter for FakeChat {
    fn adapter_type(&self) -> ChatAdapterType {
        ChatAdapterType::Custom("fake".to_string())
    }

    async fn start(&self, event_tx: mpsc::Sender<ChatEvent>) -> Result<(), ChatError> {
        *self.events.lock().await = Some(event_tx);
        Ok(())
    }

    async fn stop(&self) -> Result<(), ChatError> {
        self.stopped.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn send_message(&self, channel: &str, text: &str) -> Result<(), ChatError> {
        self.sent
            .lock()
            .unwrap()
            .push((channel.to_string(), text.to_string()));
        Ok(())
    }
}

/// Poll `check` until it holds, for up to a second.
pub async fn eventually<F>(mut check: F)
where
    F: FnMut() -> bool,
{
    for _ in 0..200 {
        if check() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert!(check(), "condition not reached in time");
}
