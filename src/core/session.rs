/// Session Registry and SSE Stream Emitter
///
/// Sessions map a client-supplied connection id to an unbounded FIFO queue.
/// GET /sse installs a queue and returns the stream that drains it; POST
/// handlers push responses onto the queue of an existing session and never
/// create one. Each registration carries an epoch so that a superseded
/// stream's teardown cannot remove the registration that replaced it.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use std::time::Duration;

use bytes::Bytes;
use futures_util::Stream;
use serde_json::{json, Value};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::time::{sleep, Instant, Sleep};

use crate::core::protocol::INTERNAL_ERROR;

/// Connection id used when the client sends no X-Connection-ID header.
pub const DEFAULT_CONNECTION_ID: &str = "default";

/// Idle window after which a keep-alive ping frame is emitted.
pub const PING_INTERVAL: Duration = Duration::from_secs(30);

struct SessionEntry {
    epoch: u64,
    sender: UnboundedSender<Value>,
}

struct SessionMap {
    next_epoch: u64,
    sessions: HashMap<String, SessionEntry>,
}

/// Process-wide map of live SSE sessions.
///
/// Constructor-injected and shared behind an Arc; the map mutex is the only
/// critical section, queue sends happen outside it.
pub struct SessionRegistry {
    inner: Mutex<SessionMap>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(SessionMap {
                next_epoch: 0,
                sessions: HashMap::new(),
            }),
        }
    }

    /// Install a fresh empty queue for the connection id and return the
    /// stream that drains it.
    ///
    /// A stale registration under the same id is superseded: its sender is
    /// dropped here, so the old stream observes a closed channel and ends,
    /// while the epoch guard keeps its teardown from touching this entry.
    pub fn subscribe(self: &Arc<Self>, connection_id: &str) -> SseStream {
        let (sender, receiver) = mpsc::unbounded_channel();
        let epoch = {
            let mut map = self.lock();
            map.next_epoch += 1;
            let epoch = map.next_epoch;
            map.sessions
                .insert(connection_id.to_string(), SessionEntry { epoch, sender });
            epoch
        };

        SseStream {
            connection_id: connection_id.to_string(),
            epoch,
            registry: Arc::clone(self),
            receiver,
            idle: Box::pin(sleep(PING_INTERVAL)),
            done: false,
        }
    }

    /// Push a message onto the session's queue.
    ///
    /// Returns whether a session existed for the id; pushing to a missing
    /// session is a silent no-op.
    pub fn push(&self, connection_id: &str, message: Value) -> bool {
        let sender = {
            let map = self.lock();
            match map.sessions.get(connection_id) {
                Some(entry) => entry.sender.clone(),
                None => return false,
            }
        };
        // A send failure means the receiving stream is mid-teardown; the
        // message is dropped just as it would be for an absent session.
        sender.send(message).is_ok()
    }

    /// Remove the registration for the id, but only while the given epoch is
    /// still the current one.
    fn remove(&self, connection_id: &str, epoch: u64) {
        let mut map = self.lock();
        if map
            .sessions
            .get(connection_id)
            .is_some_and(|entry| entry.epoch == epoch)
        {
            map.sessions.remove(connection_id);
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SessionMap> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// One SSE connection draining a session queue.
///
/// Emits one `data: <json>\n\n` frame per queued message, a ping
/// notification after each 30-second idle window, and ends when the queue
/// closes (superseded subscribe) or a message fails to serialize. Teardown
/// runs exactly once via Drop, client disconnects included.
pub struct SseStream {
    connection_id: String,
    epoch: u64,
    registry: Arc<SessionRegistry>,
    receiver: UnboundedReceiver<Value>,
    idle: Pin<Box<Sleep>>,
    done: bool,
}

fn frame(text: &str) -> Bytes {
    Bytes::from(format!("data: {}\n\n", text))
}

fn ping_frame() -> Bytes {
    frame(r#"{"jsonrpc":"2.0","method":"ping","params":{}}"#)
}

impl SseStream {
    fn rearm_idle(&mut self) {
        self.idle.as_mut().reset(Instant::now() + PING_INTERVAL);
    }
}

impl Stream for SseStream {
    type Item = Result<Bytes, actix_web::Error>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.done {
            return Poll::Ready(None);
        }

        // Bias toward queued messages; the idle timer only runs while the
        // queue is empty.
        match this.receiver.poll_recv(cx) {
            Poll::Ready(Some(message)) => match serde_json::to_string(&message) {
                Ok(text) => {
                    this.rearm_idle();
                    Poll::Ready(Some(Ok(frame(&text))))
                }
                Err(e) => {
                    // One final error notification, then the stream ends.
                    this.done = true;
                    let notice = json!({
                        "jsonrpc": "2.0",
                        "method": "error",
                        "params": {
                            "code": INTERNAL_ERROR,
                            "message": format!("Stream error: {}", e),
                        }
                    });
                    let text = serde_json::to_string(&notice)
                        .unwrap_or_else(|_| "{}".to_string());
                    Poll::Ready(Some(Ok(frame(&text))))
                }
            },
            Poll::Ready(None) => {
                this.done = true;
                Poll::Ready(None)
            }
            Poll::Pending => match this.idle.as_mut().poll(cx) {
                Poll::Ready(()) => {
                    this.rearm_idle();
                    Poll::Ready(Some(Ok(ping_frame())))
                }
                Poll::Pending => Poll::Pending,
            },
        }
    }
}

impl Drop for SseStream {
    fn drop(&mut self) {
        self.registry.remove(&self.connection_id, self.epoch);
    }
}
