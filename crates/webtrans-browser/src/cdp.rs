//! Minimal Chrome DevTools Protocol client over a websocket.
//!
//! Commands carry an id; the reader task routes each response to the
//! caller waiting on that id. Notifications are not subscribed to and are
//! dropped. Once either socket task ends the client reports itself
//! disconnected and further calls fail at once.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, warn};
use webtrans_core::{Error, Result};

type Responder = oneshot::Sender<Result<Value>>;
type PendingMap = Arc<Mutex<HashMap<u64, Responder>>>;

pub struct CdpClient {
    next_id: AtomicU64,
    pending: PendingMap,
    outgoing: mpsc::UnboundedSender<Message>,
    alive: Arc<AtomicBool>,
    command_timeout: Duration,
    tasks: Vec<JoinHandle<()>>,
}

impl CdpClient {
    /// Connect to a target's `webSocketDebuggerUrl`.
    pub async fn connect(ws_url: &str, command_timeout: Duration) -> Result<Self> {
        let (stream, _) = tokio_tungstenite::connect_async(ws_url)
            .await
            .map_err(|e| Error::Browser(format!("CDP connect to {} failed: {}", ws_url, e)))?;
        let (mut sink, mut source) = stream.split();

        let alive = Arc::new(AtomicBool::new(true));
        let pending: PendingMap = Arc::new(Mutex::new(HashMap::new()));

        let (outgoing, mut rx) = mpsc::unbounded_channel::<Message>();
        let writer = {
            let alive = alive.clone();
            let pending = pending.clone();
            tokio::spawn(async move {
                while let Some(message) = rx.recv().await {
                    if let Err(e) = sink.send(message).await {
                        warn!("CDP write failed: {}", e);
                        break;
                    }
                }
                alive.store(false, Ordering::SeqCst);
                fail_pending(&pending);
            })
        };

        let reader = {
            let alive = alive.clone();
            let pending = pending.clone();
            tokio::spawn(async move {
                while let Some(frame) = source.next().await {
                    match frame {
                        Ok(Message::Text(text)) => dispatch(&text, &pending),
                        Ok(Message::Close(_)) => break,
                        Ok(_) => {}
                        Err(e) => {
                            warn!("CDP read failed: {}", e);
                            break;
                        }
                    }
                }
                alive.store(false, Ordering::SeqCst);
                fail_pending(&pending);
                debug!("CDP connection closed");
            })
        };

        Ok(Self {
            next_id: AtomicU64::new(1),
            pending,
            outgoing,
            alive,
            command_timeout,
            tasks: vec![writer, reader],
        })
    }

    /// Send a command and wait for its result object.
    pub async fn call(&self, method: &str, params: Value) -> Result<Value> {
        if !self.is_connected() {
            return Err(Error::Browser("CDP connection closed".into()));
        }
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();
        self.pending.lock().insert(id, tx);
        // The reader may have drained the map between the check and the insert.
        if !self.alive.load(Ordering::SeqCst) {
            self.pending.lock().remove(&id);
            return Err(Error::Browser("CDP connection closed".into()));
        }

        let message = json!({ "id": id, "method": method, "params": params });
        if self.outgoing.send(Message::Text(message.to_string())).is_err() {
            self.pending.lock().remove(&id);
            return Err(Error::Browser("CDP connection closed".into()));
        }

        match tokio::time::timeout(self.command_timeout, rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(Error::Browser("CDP connection closed".into())),
            Err(_) => {
                self.pending.lock().remove(&id);
                Err(Error::Timeout(format!("CDP command {} timed out", method)))
            }
        }
    }

    /// False once the peer closed the socket or either side of it failed.
    pub fn is_connected(&self) -> bool {
        self.alive.load(Ordering::SeqCst) && !self.outgoing.is_closed()
    }
}

impl Drop for CdpClient {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

/// Route one incoming frame to the caller waiting on its id.
fn dispatch(text: &str, pending: &PendingMap) {
    let message: Value = match serde_json::from_str(text) {
        Ok(v) => v,
        Err(e) => {
            warn!("Malformed CDP frame: {}", e);
            return;
        }
    };

    if let Some(id) = message.get("id").and_then(Value::as_u64) {
        let Some(responder) = pending.lock().remove(&id) else {
            debug!("CDP response for unknown id {}", id);
            return;
        };
        let _ = responder.send(parse_response(&message));
        return;
    }

    if let Some(method) = message.get("method").and_then(Value::as_str) {
        debug!(method, "ignoring CDP event");
    }
}

fn parse_response(message: &Value) -> Result<Value> {
    if let Some(error) = message.get("error") {
        let text = error
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("unknown CDP error");
        let code = error.get("code").and_then(Value::as_i64).unwrap_or_default();
        return Err(Error::Browser(format!("{} ({})", text, code)));
    }
    Ok(message.get("result").cloned().unwrap_or(Value::Null))
}

fn fail_pending(pending: &PendingMap) {
    for (_, responder) in pending.lock().drain() {
        let _ = responder.send(Err(Error::Browser("CDP connection closed".into())));
    }
}
