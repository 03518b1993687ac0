//! Realtime WebSocket client.
//!
//! Request/response plus pub/sub over a single WebSocket connection. The
//! connection lifecycle is an explicit state machine
//! (`Disconnected → Connecting → Connected → {Disconnected, Error}`) driven by
//! open/close/timer events; reconnection after an abnormal close is a bounded
//! loop, not timer recursion, so the attempt budget and timer cancellation
//! stay auditable.
//!
//! Request correlation lives in [`PendingRequests`]: every entry is removed by
//! exactly one of resolve, reject, timeout, or close-triggered rejection.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::{broadcast, mpsc, oneshot, Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::errors::{DistriError, DistriResult};

/// Connection lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Disconnected,
    Connecting,
    Connected,
    Error,
}

/// Kinds of frames exchanged on the realtime socket.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FrameKind {
    Handshake,
    Request,
    Response,
    Ping,
    Pong,
    Notification,
    Error,
}

/// One JSON frame on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Frame {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: FrameKind,
    pub from: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    #[serde(default)]
    pub timestamp: i64,
    #[serde(default)]
    pub data: Value,
}

impl Frame {
    fn new(kind: FrameKind, from: &str, to: Option<String>, data: Value) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            kind,
            from: from.to_string(),
            to,
            timestamp: chrono::Utc::now().timestamp_millis(),
            data,
        }
    }
}

/// Configuration for [`RealtimeClient`].
#[derive(Debug, Clone)]
pub struct RealtimeConfig {
    /// HTTP(S) endpoint of the node; `/ws` is derived from it.
    pub endpoint: String,
    /// Identity announced in the handshake and stamped on outgoing frames.
    pub node_id: String,
    /// Per-request response timeout.
    pub timeout: Duration,
    pub heartbeat_interval: Duration,
    pub reconnect_delay: Duration,
    pub max_reconnect_attempts: u32,
}

impl RealtimeConfig {
    pub fn new(endpoint: impl Into<String>, node_id: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            node_id: node_id.into(),
            timeout: Duration::from_millis(10_000),
            heartbeat_interval: Duration::from_millis(30_000),
            reconnect_delay: Duration::from_millis(5_000),
            max_reconnect_attempts: 3,
        }
    }
}

/// Events emitted to realtime subscribers.
#[derive(Debug, Clone)]
pub enum RealtimeEvent {
    StatusChanged(ConnectionStatus),
    /// A server notification; `kind` is the notification's own `type` field.
    Notification { kind: String, data: Value },
    /// A protocol-level error frame or an unparseable inbound frame.
    /// Non-fatal: the connection stays up.
    ProtocolError {
        message: String,
        details: Option<Value>,
    },
}

enum Outbound {
    Frame(Frame),
    Close,
}

const CLIENT_VERSION: &str = env!("CARGO_PKG_VERSION");

// ============================================================================
// Request correlation
// ============================================================================

/// Correlation table mapping request ids to response waiters.
///
/// Invariant: at most one entry per id, and every entry leaves the table
/// through exactly one of [`complete`](Self::complete),
/// [`remove`](Self::remove) (timeout path), or [`fail_all`](Self::fail_all).
#[derive(Default)]
pub(crate) struct PendingRequests {
    inner: Mutex<HashMap<String, oneshot::Sender<DistriResult<Value>>>>,
}

impl PendingRequests {
    async fn insert(&self, id: String, sender: oneshot::Sender<DistriResult<Value>>) {
        self.inner.lock().await.insert(id, sender);
    }

    /// Resolve or reject the waiter for `id`. Returns false when the id is
    /// unknown (already completed, timed out, or never issued).
    async fn complete(&self, id: &str, result: DistriResult<Value>) -> bool {
        match self.inner.lock().await.remove(id) {
            Some(sender) => {
                let _ = sender.send(result);
                true
            }
            None => false,
        }
    }

    /// Drop the entry for `id` without resolving it (the waiter has given
    /// up). Returns whether an entry existed.
    async fn remove(&self, id: &str) -> bool {
        self.inner.lock().await.remove(id).is_some()
    }

    /// Reject every pending request and clear the table.
    async fn fail_all(&self, make_error: impl Fn() -> DistriError) {
        let mut inner = self.inner.lock().await;
        for (_, sender) in inner.drain() {
            let _ = sender.send(Err(make_error()));
        }
    }

    async fn len(&self) -> usize {
        self.inner.lock().await.len()
    }
}

// ============================================================================
// Client
// ============================================================================

struct Shared {
    config: RealtimeConfig,
    status: RwLock<ConnectionStatus>,
    pending: PendingRequests,
    outbound: RwLock<Option<mpsc::Sender<Outbound>>>,
    events: broadcast::Sender<RealtimeEvent>,
    /// Narrow per-notification-type channels; the broad channel above always
    /// fires too.
    typed_channels: DashMap<String, broadcast::Sender<Value>>,
    /// Set by `disconnect()`; suppresses reconnection.
    client_closed: AtomicBool,
    reconnect_attempts: AtomicU32,
    heartbeat: Mutex<Option<JoinHandle<()>>>,
    reconnect_task: Mutex<Option<JoinHandle<()>>>,
}

/// WebSocket client for a Distri node: request/response with correlation and
/// timeouts, heartbeat, bounded reconnection, and notification fan-out.
#[derive(Clone)]
pub struct RealtimeClient {
    shared: Arc<Shared>,
}

impl RealtimeClient {
    pub fn new(config: RealtimeConfig) -> Self {
        let (events, _) = broadcast::channel(256);
        Self {
            shared: Arc::new(Shared {
                config,
                status: RwLock::new(ConnectionStatus::Disconnected),
                pending: PendingRequests::default(),
                outbound: RwLock::new(None),
                events,
                typed_channels: DashMap::new(),
                client_closed: AtomicBool::new(false),
                reconnect_attempts: AtomicU32::new(0),
                heartbeat: Mutex::new(None),
                reconnect_task: Mutex::new(None),
            }),
        }
    }

    pub async fn status(&self) -> ConnectionStatus {
        *self.shared.status.read().await
    }

    pub fn node_id(&self) -> &str {
        &self.shared.config.node_id
    }

    /// Subscribe to the broad event channel (status changes, notifications,
    /// protocol errors).
    pub fn subscribe_events(&self) -> broadcast::Receiver<RealtimeEvent> {
        self.shared.events.subscribe()
    }

    /// Subscribe to notifications of one specific type.
    pub fn subscribe_notifications(&self, kind: &str) -> broadcast::Receiver<Value> {
        self.shared
            .typed_channels
            .entry(kind.to_string())
            .or_insert_with(|| broadcast::channel(256).0)
            .subscribe()
    }

    /// Open the connection. No-op when already connected or connecting.
    pub async fn connect(&self) -> DistriResult<()> {
        {
            let status = self.shared.status.read().await;
            if matches!(
                *status,
                ConnectionStatus::Connected | ConnectionStatus::Connecting
            ) {
                return Ok(());
            }
        }
        self.shared.client_closed.store(false, Ordering::SeqCst);
        self.shared.reconnect_attempts.store(0, Ordering::SeqCst);
        Shared::open(self.shared.clone()).await
    }

    /// Close the connection with normal-closure code 1000, cancelling the
    /// heartbeat and any scheduled reconnection, and rejecting every pending
    /// request.
    pub async fn disconnect(&self) {
        let shared = &self.shared;
        shared.client_closed.store(true, Ordering::SeqCst);

        if let Some(task) = shared.reconnect_task.lock().await.take() {
            task.abort();
        }
        shared.stop_heartbeat().await;

        let sender = shared.outbound.read().await.clone();
        if let Some(sender) = sender {
            let _ = sender.send(Outbound::Close).await;
        }
        *shared.outbound.write().await = None;

        shared
            .pending
            .fail_all(|| DistriError::connection("connection closed"))
            .await;
        shared.set_status(ConnectionStatus::Disconnected).await;
    }

    /// Send a request and wait for its response. Requires a live connection;
    /// the returned future resolves exactly once per request id.
    pub async fn request(
        &self,
        method: &str,
        params: Option<Value>,
        target_node: Option<&str>,
    ) -> DistriResult<Value> {
        if self.status().await != ConnectionStatus::Connected {
            return Err(DistriError::connection("client is not connected"));
        }

        let request_id = Uuid::new_v4().to_string();
        let (sender, receiver) = oneshot::channel();
        self.shared
            .pending
            .insert(request_id.clone(), sender)
            .await;

        let frame = Frame {
            id: request_id.clone(),
            ..Frame::new(
                FrameKind::Request,
                &self.shared.config.node_id,
                target_node.map(str::to_string),
                serde_json::json!({ "method": method, "params": params }),
            )
        };

        if let Err(error) = self.shared.send_frame(frame).await {
            self.shared.pending.remove(&request_id).await;
            return Err(error);
        }

        match tokio::time::timeout(self.shared.config.timeout, receiver).await {
            Ok(Ok(result)) => result,
            // Sender dropped without a verdict; treat as a dead connection.
            Ok(Err(_)) => Err(DistriError::connection("connection closed")),
            Err(_) => {
                self.shared.pending.remove(&request_id).await;
                Err(DistriError::protocol(format!(
                    "request timeout for method: {method}"
                )))
            }
        }
    }

    pub async fn subscribe(&self, options: Value) -> DistriResult<()> {
        self.request("subscribe", Some(options), None).await?;
        Ok(())
    }

    pub async fn unsubscribe(&self, options: Value) -> DistriResult<()> {
        self.request("unsubscribe", Some(options), None).await?;
        Ok(())
    }

    pub async fn publish(&self, channel: &str, data: Value) -> DistriResult<()> {
        self.request(
            "publish",
            Some(serde_json::json!({ "channel": channel, "data": data })),
            None,
        )
        .await?;
        Ok(())
    }

    /// Fire-and-forget heartbeat frame. Silently does nothing while not
    /// connected.
    pub async fn ping(&self) {
        if self.status().await != ConnectionStatus::Connected {
            return;
        }
        let frame = Frame::new(
            FrameKind::Ping,
            &self.shared.config.node_id,
            None,
            Value::Object(Default::default()),
        );
        let _ = self.shared.send_frame(frame).await;
    }
}

impl Shared {
    async fn set_status(&self, status: ConnectionStatus) {
        let mut current = self.status.write().await;
        if *current != status {
            *current = status;
            let _ = self.events.send(RealtimeEvent::StatusChanged(status));
        }
    }

    async fn send_frame(&self, frame: Frame) -> DistriResult<()> {
        let sender = self.outbound.read().await.clone();
        let Some(sender) = sender else {
            return Err(DistriError::connection("websocket is not connected"));
        };
        sender
            .send(Outbound::Frame(frame))
            .await
            .map_err(|_| DistriError::connection("websocket is not connected"))
    }

    /// Establish the socket and spawn the reader/writer/heartbeat tasks.
    ///
    /// Returns a boxed future with an explicit `Send` bound: `open` is awaited
    /// inside the task spawned by `spawn_reconnect`, which forms an
    /// opaque-type cycle that the compiler cannot resolve auto-traits through
    /// when `open` is a plain `async fn`. A concrete boxed return type breaks
    /// the cycle.
    fn open(shared: Arc<Shared>) -> Pin<Box<dyn Future<Output = DistriResult<()>> + Send>> {
        Box::pin(async move {
        shared.set_status(ConnectionStatus::Connecting).await;

        let url = match websocket_url(&shared.config.endpoint) {
            Ok(url) => url,
            Err(error) => {
                shared.set_status(ConnectionStatus::Error).await;
                return Err(error);
            }
        };

        let (socket, _) = match connect_async(url.as_str()).await {
            Ok(pair) => pair,
            Err(error) => {
                shared.set_status(ConnectionStatus::Error).await;
                return Err(DistriError::connection(format!(
                    "failed to connect to {url}: {error}"
                )));
            }
        };
        debug!(%url, "websocket connection opened");

        let (mut sink, mut stream) = socket.split();
        let (outbound_tx, mut outbound_rx) = mpsc::channel::<Outbound>(64);
        *shared.outbound.write().await = Some(outbound_tx);

        tokio::spawn(async move {
            while let Some(command) = outbound_rx.recv().await {
                match command {
                    Outbound::Frame(frame) => match serde_json::to_string(&frame) {
                        Ok(text) => {
                            if sink.send(WsMessage::Text(text.into())).await.is_err() {
                                break;
                            }
                        }
                        Err(error) => warn!(%error, "failed to encode outbound frame"),
                    },
                    Outbound::Close => {
                        let _ = sink
                            .send(WsMessage::Close(Some(CloseFrame {
                                code: CloseCode::Normal,
                                reason: "client disconnect".into(),
                            })))
                            .await;
                        break;
                    }
                }
            }
        });

        // Open side effects: reset the attempt budget, start the heartbeat,
        // announce ourselves.
        shared.reconnect_attempts.store(0, Ordering::SeqCst);
        shared.set_status(ConnectionStatus::Connected).await;
        shared.start_heartbeat().await;
        let handshake = Frame::new(
            FrameKind::Handshake,
            &shared.config.node_id,
            None,
            serde_json::json!({
                "node": { "id": shared.config.node_id },
                "version": CLIENT_VERSION,
            }),
        );
        shared.send_frame(handshake).await?;

        let reader_shared = shared.clone();
        tokio::spawn(async move {
            let mut normal_close = false;
            while let Some(message) = stream.next().await {
                match message {
                    Ok(WsMessage::Text(text)) => reader_shared.handle_raw(&text).await,
                    Ok(WsMessage::Close(frame)) => {
                        normal_close = frame
                            .map(|f| f.code == CloseCode::Normal)
                            .unwrap_or(false);
                        break;
                    }
                    Ok(_) => {}
                    Err(error) => {
                        warn!(%error, "websocket read error");
                        break;
                    }
                }
            }
            reader_shared.on_closed(normal_close).await;
        });

        Ok(())
        })
    }

    /// Runs on every terminal close, whatever the cause: reject all pending
    /// requests, stop timers, and schedule bounded reconnection for abnormal
    /// closes.
    async fn on_closed(self: &Arc<Self>, normal_close: bool) {
        self.stop_heartbeat().await;
        *self.outbound.write().await = None;
        self.pending
            .fail_all(|| DistriError::connection("connection closed"))
            .await;
        self.set_status(ConnectionStatus::Disconnected).await;

        if normal_close || self.client_closed.load(Ordering::SeqCst) {
            return;
        }
        self.spawn_reconnect().await;
    }

    /// Bounded reconnection driver. Each pass waits `reconnect_delay`, then
    /// redials; success resets the budget (on open), exhaustion leaves the
    /// client disconnected until `connect()` is called again.
    async fn spawn_reconnect(self: &Arc<Self>) {
        let mut slot = self.reconnect_task.lock().await;
        if let Some(previous) = slot.take() {
            previous.abort();
        }

        let shared = self.clone();
        *slot = Some(tokio::spawn(async move {
            loop {
                if shared.client_closed.load(Ordering::SeqCst) {
                    return;
                }
                let attempt = shared.reconnect_attempts.fetch_add(1, Ordering::SeqCst) + 1;
                if attempt > shared.config.max_reconnect_attempts {
                    debug!("reconnect attempts exhausted");
                    shared.set_status(ConnectionStatus::Disconnected).await;
                    return;
                }
                warn!(attempt, "scheduling reconnect");
                tokio::time::sleep(shared.config.reconnect_delay).await;
                if shared.client_closed.load(Ordering::SeqCst) {
                    return;
                }
                match Shared::open(shared.clone()).await {
                    Ok(()) => return,
                    Err(error) => warn!(%error, "reconnect attempt failed"),
                }
            }
        }));
    }

    async fn start_heartbeat(self: &Arc<Self>) {
        self.stop_heartbeat().await;
        if self.config.heartbeat_interval.is_zero() {
            return;
        }
        let shared = self.clone();
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(shared.config.heartbeat_interval);
            ticker.tick().await; // the first tick fires immediately
            loop {
                ticker.tick().await;
                if *shared.status.read().await != ConnectionStatus::Connected {
                    return;
                }
                let frame = Frame::new(
                    FrameKind::Ping,
                    &shared.config.node_id,
                    None,
                    Value::Object(Default::default()),
                );
                if shared.send_frame(frame).await.is_err() {
                    return;
                }
            }
        });
        *self.heartbeat.lock().await = Some(task);
    }

    async fn stop_heartbeat(&self) {
        if let Some(task) = self.heartbeat.lock().await.take() {
            task.abort();
        }
    }

    /// Parse and dispatch one inbound text frame. Malformed JSON is logged
    /// and surfaced as a non-fatal protocol-error event.
    async fn handle_raw(self: &Arc<Self>, text: &str) {
        match serde_json::from_str::<Frame>(text) {
            Ok(frame) => self.handle_frame(frame).await,
            Err(error) => {
                warn!(%error, "failed to parse inbound frame");
                let _ = self.events.send(RealtimeEvent::ProtocolError {
                    message: "failed to parse message".to_string(),
                    details: None,
                });
            }
        }
    }

    async fn handle_frame(self: &Arc<Self>, frame: Frame) {
        match frame.kind {
            FrameKind::Response => {
                let result = if let Some(error) = frame.data.get("error") {
                    Err(DistriError::Protocol {
                        message: error
                            .get("message")
                            .and_then(Value::as_str)
                            .unwrap_or("Protocol error")
                            .to_string(),
                        details: Some(error.clone()),
                    })
                } else {
                    Ok(frame.data.get("result").cloned().unwrap_or(Value::Null))
                };
                if !self.pending.complete(&frame.id, result).await {
                    debug!(id = %frame.id, "response for unknown request id");
                }
            }
            FrameKind::Ping => {
                let pong = Frame::new(
                    FrameKind::Pong,
                    &self.config.node_id,
                    Some(frame.from),
                    Value::Object(Default::default()),
                );
                let _ = self.send_frame(pong).await;
            }
            FrameKind::Pong => {
                debug!(from = %frame.from, "received pong");
            }
            FrameKind::Notification => {
                let kind = frame
                    .data
                    .get("type")
                    .and_then(Value::as_str)
                    .unwrap_or("notification")
                    .to_string();
                // Dual-channel fan-out: the broad channel carries every
                // notification, the typed channel only its own kind.
                let _ = self.events.send(RealtimeEvent::Notification {
                    kind: kind.clone(),
                    data: frame.data.clone(),
                });
                if let Some(channel) = self.typed_channels.get(&kind) {
                    let _ = channel.send(frame.data);
                }
            }
            FrameKind::Error => {
                let _ = self.events.send(RealtimeEvent::ProtocolError {
                    message: frame
                        .data
                        .get("message")
                        .and_then(Value::as_str)
                        .unwrap_or("Protocol error")
                        .to_string(),
                    details: Some(frame.data),
                });
            }
            FrameKind::Handshake | FrameKind::Request => {
                debug!(kind = ?frame.kind, "unhandled inbound frame kind");
            }
        }
    }
}

/// Derive the `ws(s)://…/ws` URL from an HTTP(S) endpoint.
fn websocket_url(endpoint: &str) -> DistriResult<String> {
    let trimmed = endpoint.trim_end_matches('/');
    let base = if let Some(rest) = trimmed.strip_prefix("https://") {
        format!("wss://{rest}")
    } else if let Some(rest) = trimmed.strip_prefix("http://") {
        format!("ws://{rest}")
    } else if trimmed.starts_with("ws://") || trimmed.starts_with("wss://") {
        trimmed.to_string()
    } else {
        return Err(DistriError::connection(format!(
            "unsupported endpoint: {endpoint}"
        )));
    };
    Ok(format!("{base}/ws"))
}
