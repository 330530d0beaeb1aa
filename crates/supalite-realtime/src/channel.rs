use std::sync::{Arc, RwLock};
use std::time::Duration;

use tracing::debug;

use crate::client::{RealtimeClient, SocketHandle};
use crate::error::RealtimeError;
use crate::protocol;
use crate::types::{ChangeEvent, ChangePayload, ChannelState};

/// Callback invoked with the payload of a matching change event.
pub type ChangeCallback = Arc<dyn Fn(ChangePayload) + Send + Sync + 'static>;

// ── ChannelBuilder ────────────────────────────────────────────────────────────

/// Immutable configuration for one channel subscription.
///
/// Created via [`RealtimeClient::channel`]. `on` accumulates bindings in
/// registration order; the terminal `subscribe()` performs the idempotent
/// ensure-connect, joins the channel, and freezes the bindings.
pub struct ChannelBuilder {
    pub(crate) client: RealtimeClient,
    pub(crate) topic: String,
    pub(crate) bindings: Vec<(ChangeEvent, ChangeCallback)>,
    pub(crate) join_timeout: Duration,
}

impl ChannelBuilder {
    /// Register a callback for `event`. Callbacks fire in registration
    /// order; `ChangeEvent::All` bindings are the catch-all for events no
    /// exact binding matched.
    pub fn on<F>(mut self, event: ChangeEvent, callback: F) -> Self
    where
        F: Fn(ChangePayload) + Send + Sync + 'static,
    {
        self.bindings.push((event, Arc::new(callback)));
        self
    }

    /// Override the join acknowledgement timeout for this channel.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.join_timeout = timeout;
        self
    }

    /// Ensure the shared connection is open, send `phx_join`, and await
    /// the acknowledgement. Bindings are immutable from here on.
    pub async fn subscribe(self) -> Result<RealtimeSubscription, RealtimeError> {
        self.client.connect().await?;
        let subscription =
            self.client
                .new_subscription(self.topic, self.bindings, self.join_timeout);
        self.client.join_subscription(&subscription).await?;
        Ok(subscription)
    }
}

// ── RealtimeSubscription ──────────────────────────────────────────────────────

/// A handle to one registered interest in a channel's events.
///
/// Wraps `Arc<Inner>`: cheaply cloneable, `Send + Sync`. Identity is the
/// unique `id`, not the topic: two independent subscriptions to the same
/// table coexist.
#[derive(Clone)]
pub struct RealtimeSubscription {
    pub(crate) inner: Arc<SubscriptionInner>,
}

impl std::fmt::Debug for RealtimeSubscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealtimeSubscription")
            .field("id", &self.inner.id)
            .field("topic", &self.inner.topic)
            .finish_non_exhaustive()
    }
}

pub(crate) struct SubscriptionInner {
    pub(crate) id: u64,
    pub(crate) topic: String,
    /// Frozen at subscribe time, in registration order.
    pub(crate) bindings: Vec<(ChangeEvent, ChangeCallback)>,
    pub(crate) state: RwLock<ChannelState>,
    pub(crate) join_ref: RwLock<Option<String>>,
    pub(crate) socket: SocketHandle,
    pub(crate) join_timeout: Duration,
}

impl RealtimeSubscription {
    /// Unique identity of this subscription within its client.
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    /// The channel topic, e.g. `realtime:public:todos`.
    pub fn topic(&self) -> &str {
        &self.inner.topic
    }

    pub fn state(&self) -> ChannelState {
        *self
            .inner
            .state
            .read()
            .unwrap_or_else(|p| p.into_inner())
    }

    pub fn is_closed(&self) -> bool {
        self.state() == ChannelState::Closed
    }

    pub(crate) fn set_state(&self, state: ChannelState) {
        *self
            .inner
            .state
            .write()
            .unwrap_or_else(|p| p.into_inner()) = state;
    }

    pub(crate) fn join_ref(&self) -> Option<String> {
        self.inner
            .join_ref
            .read()
            .unwrap_or_else(|p| p.into_inner())
            .clone()
    }

    pub(crate) fn set_join_ref(&self, join_ref: String) {
        *self
            .inner
            .join_ref
            .write()
            .unwrap_or_else(|p| p.into_inner()) = Some(join_ref);
    }

    /// Send `phx_leave` and await the acknowledgement. Idempotent: a
    /// closed subscription returns Ok without touching the socket. On
    /// transport failure the state is left unchanged so the caller can
    /// retry.
    pub async fn unsubscribe(&self) -> Result<(), RealtimeError> {
        if self.is_closed() {
            return Ok(());
        }
        let join_ref = self.join_ref().ok_or(RealtimeError::NotConnected)?;
        let msg_ref = self.inner.socket.next_ref();
        let msg = protocol::leave(&self.inner.topic, &join_ref, msg_ref.clone());
        let reply = self
            .inner
            .socket
            .send_with_ack(msg, &msg_ref, self.inner.join_timeout)
            .await?;

        let status = reply
            .payload
            .get("status")
            .and_then(|s| s.as_str())
            .unwrap_or("");
        if status != "ok" {
            return Err(RealtimeError::JoinRejected(format!(
                "leave rejected with status {:?}",
                status
            )));
        }

        self.set_state(ChannelState::Closed);
        self.inner.socket.detach(self.inner.id).await;
        debug!(topic = %self.inner.topic, id = self.inner.id, "Left channel");
        Ok(())
    }

    /// Deliver one inbound event to the matching bindings.
    ///
    /// Two tiers: exact matches fire in registration order; if none
    /// matched, wildcard bindings fire in registration order; otherwise
    /// the event is dropped. Each matching callback fires exactly once.
    pub(crate) fn dispatch(&self, event: ChangeEvent, payload: &ChangePayload) {
        if self.state() != ChannelState::Joined {
            return;
        }
        let mut matched = false;
        for (bound, callback) in &self.inner.bindings {
            if *bound == event {
                callback(payload.clone());
                matched = true;
            }
        }
        if !matched {
            for (bound, callback) in &self.inner.bindings {
                if *bound == ChangeEvent::All {
                    callback(payload.clone());
                }
            }
        }
    }
}
