use std::collections::BTreeMap;

use tokio::sync::Mutex;
use tracing::debug;

use supalite_core::SupaliteError;
use supalite_realtime::{RealtimeClient, RealtimeSubscription};

/// Tracks every live subscription of one client and owns the
/// last-one-out disconnect of the shared socket.
///
/// The lock is held across a whole removal, so concurrent `remove`
/// calls serialize and the disconnect-when-empty decision is made
/// against a consistent set.
pub struct SubscriptionManager {
    registry: RealtimeClient,
    tracked: Mutex<BTreeMap<u64, RealtimeSubscription>>,
}

impl SubscriptionManager {
    pub(crate) fn new(registry: RealtimeClient) -> Self {
        Self {
            registry,
            tracked: Mutex::new(BTreeMap::new()),
        }
    }

    pub(crate) async fn track(&self, subscription: RealtimeSubscription) {
        let mut tracked = self.tracked.lock().await;
        debug!(
            id = subscription.id(),
            topic = %subscription.topic(),
            "Tracking subscription"
        );
        tracked.insert(subscription.id(), subscription);
    }

    /// Remove a subscription and return the number still open.
    ///
    /// Idempotent: an already-closed subscription skips the leave, and a
    /// subscription removed twice cannot trigger a second disconnect.
    /// The socket closes only when this removal actually emptied the
    /// set; a leave failure surfaces without mutating the set.
    pub async fn remove(
        &self,
        subscription: &RealtimeSubscription,
    ) -> Result<usize, SupaliteError> {
        let mut tracked = self.tracked.lock().await;

        if !subscription.is_closed() {
            subscription.unsubscribe().await?;
        }

        let was_tracked = tracked.remove(&subscription.id()).is_some();
        let remaining = tracked.len();

        if was_tracked && remaining == 0 {
            debug!("Last subscription removed, closing shared socket");
            if let Err(e) = self.registry.disconnect().await {
                return Err(SupaliteError::PartialTeardown {
                    open_subscriptions: 0,
                    reason: e.to_string(),
                });
            }
        }

        Ok(remaining)
    }

    /// A snapshot of the tracked subscriptions, in insertion-id order.
    pub async fn snapshot(&self) -> Vec<RealtimeSubscription> {
        self.tracked.lock().await.values().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.tracked.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.tracked.lock().await.is_empty()
    }
}
