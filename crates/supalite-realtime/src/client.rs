use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::{broadcast, oneshot, Mutex, RwLock};
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, trace, warn};

use crate::channel::{ChangeCallback, ChannelBuilder, RealtimeSubscription, SubscriptionInner};
use crate::error::RealtimeError;
use crate::protocol::{self, RefCounter};
use crate::types::{ChangeEvent, ChangePayload, ChannelState, RealtimeConfig, SocketMessage};

type WsSink = futures_util::stream::SplitSink<
    tokio_tungstenite::WebSocketStream<
        tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
    >,
    Message,
>;

// ── SocketHandle ──────────────────────────────────────────────────────────────

/// Handle passed to subscriptions for sending messages through the
/// shared socket.
#[derive(Clone)]
pub(crate) struct SocketHandle {
    inner: Arc<RealtimeClientInner>,
}

impl SocketHandle {
    pub(crate) fn next_ref(&self) -> String {
        self.inner.ref_counter.next()
    }

    /// Send a message and await the `phx_reply` carrying `ack_ref`.
    pub(crate) async fn send_with_ack(
        &self,
        msg: SocketMessage,
        ack_ref: &str,
        timeout: Duration,
    ) -> Result<SocketMessage, RealtimeError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        {
            let mut pending = self.inner.pending_replies.lock().await;
            pending.insert(ack_ref.to_string(), reply_tx);
        }

        if let Err(e) = self.send_message(&msg).await {
            self.inner.pending_replies.lock().await.remove(ack_ref);
            return Err(e);
        }

        match tokio::time::timeout(timeout, reply_rx).await {
            Ok(Ok(reply)) => Ok(reply),
            // Sender dropped: the connection went away underneath us.
            Ok(Err(_)) => Err(RealtimeError::ConnectionClosed),
            Err(_) => {
                self.inner.pending_replies.lock().await.remove(ack_ref);
                Err(RealtimeError::AckTimeout(timeout))
            }
        }
    }

    /// Remove a subscription from the dispatch list.
    pub(crate) async fn detach(&self, id: u64) {
        let mut subs = self.inner.subscriptions.write().await;
        subs.retain(|s| s.id() != id);
    }

    async fn send_message(&self, msg: &SocketMessage) -> Result<(), RealtimeError> {
        let text = serde_json::to_string(msg)?;
        let mut ws = self.inner.ws_write.lock().await;
        let sink = ws.as_mut().ok_or(RealtimeError::NotConnected)?;
        trace!(topic = %msg.topic, event = %msg.event, "Sending socket message");
        sink.send(Message::Text(text.into())).await?;
        Ok(())
    }
}

// ── RealtimeClient ────────────────────────────────────────────────────────────

struct RealtimeClientInner {
    config: RealtimeConfig,
    ws_write: Mutex<Option<WsSink>>,
    subscriptions: RwLock<Vec<RealtimeSubscription>>,
    ref_counter: RefCounter,
    subscription_ids: AtomicU64,
    pending_replies: Mutex<HashMap<String, oneshot::Sender<SocketMessage>>>,
    connected: AtomicBool,
    shutdown_tx: broadcast::Sender<()>,
}

/// The channel registry: one persistent websocket connection
/// multiplexing named channels.
///
/// Wraps `Arc<Inner>`: cheaply cloneable, `Send + Sync`. Exactly one
/// registry (and so at most one socket) exists per client; the socket is
/// opened lazily by the first `subscribe()` and closed by `disconnect()`.
#[derive(Clone)]
pub struct RealtimeClient {
    inner: Arc<RealtimeClientInner>,
}

impl RealtimeClient {
    pub fn new(
        url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Result<Self, RealtimeError> {
        Self::with_config(RealtimeConfig::new(url, api_key))
    }

    pub fn with_config(config: RealtimeConfig) -> Result<Self, RealtimeError> {
        if config.url.trim().is_empty() {
            return Err(RealtimeError::InvalidConfig(
                "URL must not be empty".to_string(),
            ));
        }
        if config.api_key.trim().is_empty() {
            return Err(RealtimeError::InvalidConfig(
                "API key must not be empty".to_string(),
            ));
        }

        let (shutdown_tx, _) = broadcast::channel(1);

        Ok(Self {
            inner: Arc::new(RealtimeClientInner {
                config,
                ws_write: Mutex::new(None),
                subscriptions: RwLock::new(Vec::new()),
                ref_counter: RefCounter::new(),
                subscription_ids: AtomicU64::new(1),
                pending_replies: Mutex::new(HashMap::new()),
                connected: AtomicBool::new(false),
                shutdown_tx,
            }),
        })
    }

    /// Ensure the shared socket is open. Idempotent: the sink lock is
    /// held across the handshake, so concurrent callers can never open a
    /// second socket.
    pub async fn connect(&self) -> Result<(), RealtimeError> {
        let mut ws = self.inner.ws_write.lock().await;
        if ws.is_some() && self.inner.connected.load(Ordering::SeqCst) {
            return Ok(());
        }

        let ws_url = build_ws_url(&self.inner.config.url, &self.inner.config.api_key)?;
        debug!(url = %ws_url, "Connecting realtime socket");

        let (ws_stream, _) = tokio_tungstenite::connect_async(ws_url.as_str()).await?;
        let (write, read) = ws_stream.split();
        *ws = Some(write);
        self.inner.connected.store(true, Ordering::SeqCst);
        drop(ws);

        // Reader task: replies, server closes, and change dispatch.
        let inner = Arc::clone(&self.inner);
        let mut shutdown_rx = self.inner.shutdown_tx.subscribe();
        tokio::spawn(async move {
            let mut read = read;
            loop {
                tokio::select! {
                    msg = read.next() => {
                        match msg {
                            Some(Ok(Message::Text(text))) => {
                                handle_message(&inner, &text).await;
                            }
                            Some(Ok(Message::Ping(data))) => {
                                let mut ws = inner.ws_write.lock().await;
                                if let Some(sink) = ws.as_mut() {
                                    let _ = sink.send(Message::Pong(data)).await;
                                }
                            }
                            Some(Ok(Message::Close(_))) => {
                                debug!("Socket closed by server");
                                mark_disconnected(&inner).await;
                                break;
                            }
                            Some(Err(e)) => {
                                warn!(error = %e, "Socket read error");
                                mark_disconnected(&inner).await;
                                break;
                            }
                            None => {
                                debug!("Socket stream ended");
                                mark_disconnected(&inner).await;
                                break;
                            }
                            _ => {} // Binary, Pong, Frame
                        }
                    }
                    _ = shutdown_rx.recv() => {
                        debug!("Reader task shutting down");
                        break;
                    }
                }
            }
        });

        // Heartbeat task.
        let inner_hb = Arc::clone(&self.inner);
        let mut shutdown_rx_hb = self.inner.shutdown_tx.subscribe();
        let heartbeat_interval = self.inner.config.heartbeat_interval;
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(heartbeat_interval);
            // Skip the first immediate tick.
            interval.tick().await;
            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        if !inner_hb.connected.load(Ordering::SeqCst) {
                            break;
                        }
                        let msg = protocol::heartbeat(inner_hb.ref_counter.next());
                        let text = match serde_json::to_string(&msg) {
                            Ok(t) => t,
                            Err(_) => continue,
                        };
                        let mut ws = inner_hb.ws_write.lock().await;
                        if let Some(sink) = ws.as_mut() {
                            if let Err(e) = sink.send(Message::Text(text.into())).await {
                                warn!(error = %e, "Heartbeat send failed");
                                inner_hb.connected.store(false, Ordering::SeqCst);
                                break;
                            }
                            trace!("Heartbeat sent");
                        }
                    }
                    _ = shutdown_rx_hb.recv() => {
                        debug!("Heartbeat task shutting down");
                        break;
                    }
                }
            }
        });

        debug!("Realtime socket connected");
        Ok(())
    }

    /// Tear the shared connection down: every tracked subscription is
    /// marked closed and the dispatch list cleared, even when closing
    /// the sink fails. Safe to call when already disconnected.
    pub async fn disconnect(&self) -> Result<(), RealtimeError> {
        debug!("Disconnecting realtime socket");
        let _ = self.inner.shutdown_tx.send(());
        self.inner.connected.store(false, Ordering::SeqCst);

        let close_result = {
            let mut ws = self.inner.ws_write.lock().await;
            match ws.take() {
                Some(mut sink) => sink.send(Message::Close(None)).await,
                None => Ok(()),
            }
        };

        // Dropping the pending senders fails any in-flight waiters.
        self.inner.pending_replies.lock().await.clear();
        {
            let mut subs = self.inner.subscriptions.write().await;
            for sub in subs.iter() {
                sub.set_state(ChannelState::Closed);
            }
            subs.clear();
        }

        close_result.map_err(RealtimeError::from)
    }

    /// Start building a channel subscription. The topic will be
    /// `realtime:<name>`, where `name` is `<schema>` (schema-wide) or
    /// `<schema>:<table>`.
    pub fn channel(&self, name: &str) -> ChannelBuilder {
        ChannelBuilder {
            client: self.clone(),
            topic: format!("realtime:{}", name),
            bindings: Vec::new(),
            join_timeout: self.inner.config.join_timeout,
        }
    }

    /// A snapshot copy of the currently tracked subscriptions.
    pub async fn subscriptions(&self) -> Vec<RealtimeSubscription> {
        self.inner.subscriptions.read().await.clone()
    }

    pub fn is_connected(&self) -> bool {
        self.inner.connected.load(Ordering::SeqCst)
    }

    pub(crate) fn new_subscription(
        &self,
        topic: String,
        bindings: Vec<(ChangeEvent, ChangeCallback)>,
        join_timeout: Duration,
    ) -> RealtimeSubscription {
        RealtimeSubscription {
            inner: Arc::new(SubscriptionInner {
                id: self.inner.subscription_ids.fetch_add(1, Ordering::Relaxed),
                topic,
                bindings,
                state: std::sync::RwLock::new(ChannelState::Unjoined),
                join_ref: std::sync::RwLock::new(None),
                socket: SocketHandle {
                    inner: Arc::clone(&self.inner),
                },
                join_timeout,
            }),
        }
    }

    /// Register the subscription for dispatch and send `phx_join`. A
    /// rejected or timed-out join detaches the subscription and returns
    /// it to `Unjoined`.
    pub(crate) async fn join_subscription(
        &self,
        sub: &RealtimeSubscription,
    ) -> Result<(), RealtimeError> {
        let handle = SocketHandle {
            inner: Arc::clone(&self.inner),
        };

        sub.set_state(ChannelState::Joining);
        let msg_ref = handle.next_ref();
        sub.set_join_ref(msg_ref.clone());

        {
            let mut subs = self.inner.subscriptions.write().await;
            subs.push(sub.clone());
        }

        let msg = protocol::join(sub.topic(), msg_ref.clone());
        match handle
            .send_with_ack(msg, &msg_ref, sub.inner.join_timeout)
            .await
        {
            Ok(reply) => {
                let status = reply
                    .payload
                    .get("status")
                    .and_then(|s| s.as_str())
                    .unwrap_or("");
                if status == "ok" {
                    sub.set_state(ChannelState::Joined);
                    debug!(topic = %sub.topic(), id = sub.id(), "Joined channel");
                    Ok(())
                } else {
                    handle.detach(sub.id()).await;
                    sub.set_state(ChannelState::Unjoined);
                    let reason = reply
                        .payload
                        .get("response")
                        .and_then(|r| r.get("reason"))
                        .and_then(|r| r.as_str())
                        .unwrap_or("unknown")
                        .to_string();
                    Err(RealtimeError::JoinRejected(reason))
                }
            }
            Err(e) => {
                handle.detach(sub.id()).await;
                sub.set_state(ChannelState::Unjoined);
                Err(e)
            }
        }
    }
}

// ── WebSocket URL construction ────────────────────────────────────────────────

/// Build the websocket URL from the realtime endpoint:
/// `<endpoint>/websocket?apikey=<key>&vsn=1.0.0`, with http/https
/// swapped for ws/wss.
pub(crate) fn build_ws_url(endpoint: &str, api_key: &str) -> Result<String, RealtimeError> {
    let mut parsed = url::Url::parse(endpoint)?;

    let ws_scheme = match parsed.scheme() {
        "http" | "ws" => "ws",
        "https" | "wss" => "wss",
        other => {
            return Err(RealtimeError::InvalidConfig(format!(
                "Unsupported URL scheme: {}",
                other
            )));
        }
    };
    parsed
        .set_scheme(ws_scheme)
        .map_err(|_| RealtimeError::InvalidConfig("Failed to set WS scheme".to_string()))?;

    {
        let mut path = parsed.path().trim_end_matches('/').to_string();
        path.push_str("/websocket");
        parsed.set_path(&path);
    }

    parsed
        .query_pairs_mut()
        .append_pair("apikey", api_key)
        .append_pair("vsn", "1.0.0");

    Ok(parsed.to_string())
}

// ── Message routing ───────────────────────────────────────────────────────────

async fn handle_message(inner: &Arc<RealtimeClientInner>, text: &str) {
    let msg: SocketMessage = match serde_json::from_str(text) {
        Ok(m) => m,
        Err(e) => {
            warn!(error = %e, "Failed to parse socket message");
            return;
        }
    };

    trace!(topic = %msg.topic, event = %msg.event, "Received socket message");

    match msg.event.as_str() {
        protocol::PHX_REPLY => {
            if let Some(ref msg_ref) = msg.msg_ref {
                let mut pending = inner.pending_replies.lock().await;
                if let Some(tx) = pending.remove(msg_ref) {
                    let _ = tx.send(msg);
                }
            }
        }
        protocol::PHX_CLOSE | protocol::PHX_ERROR => {
            debug!(topic = %msg.topic, event = %msg.event, "Channel closed by server");
            close_topic(inner, &msg.topic).await;
        }
        _ => match msg.event.parse::<ChangeEvent>() {
            Ok(event) if event != ChangeEvent::All => {
                dispatch_change(inner, &msg, event).await;
            }
            _ => {
                trace!(event = %msg.event, "Unhandled event type");
            }
        },
    }
}

async fn dispatch_change(inner: &Arc<RealtimeClientInner>, msg: &SocketMessage, event: ChangeEvent) {
    let payload: ChangePayload = match serde_json::from_value(msg.payload.clone()) {
        Ok(p) => p,
        Err(e) => {
            warn!(error = %e, "Failed to parse change payload");
            return;
        }
    };

    let subs = inner.subscriptions.read().await.clone();
    for sub in subs.iter().filter(|s| s.topic() == msg.topic) {
        sub.dispatch(event, &payload);
    }
}

async fn close_topic(inner: &Arc<RealtimeClientInner>, topic: &str) {
    let mut subs = inner.subscriptions.write().await;
    for sub in subs.iter().filter(|s| s.topic() == topic) {
        sub.set_state(ChannelState::Closed);
    }
    subs.retain(|s| s.topic() != topic);
}

async fn mark_disconnected(inner: &Arc<RealtimeClientInner>) {
    inner.connected.store(false, Ordering::SeqCst);
    inner.pending_replies.lock().await.clear();
    let mut subs = inner.subscriptions.write().await;
    for sub in subs.iter() {
        sub.set_state(ChannelState::Closed);
    }
    subs.clear();
}
