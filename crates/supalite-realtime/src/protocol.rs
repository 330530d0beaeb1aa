use std::sync::atomic::{AtomicU64, Ordering};

use serde_json::json;

use crate::types::SocketMessage;

pub(crate) const PHX_JOIN: &str = "phx_join";
pub(crate) const PHX_REPLY: &str = "phx_reply";
pub(crate) const PHX_LEAVE: &str = "phx_leave";
pub(crate) const PHX_CLOSE: &str = "phx_close";
pub(crate) const PHX_ERROR: &str = "phx_error";
pub(crate) const HEARTBEAT: &str = "heartbeat";
pub(crate) const HEARTBEAT_TOPIC: &str = "phoenix";

/// Atomic counter for unique message reference IDs.
pub(crate) struct RefCounter {
    counter: AtomicU64,
}

impl RefCounter {
    pub fn new() -> Self {
        Self {
            counter: AtomicU64::new(1),
        }
    }

    pub fn next(&self) -> String {
        self.counter.fetch_add(1, Ordering::Relaxed).to_string()
    }
}

/// Build a phx_join for a channel. The join's own ref doubles as the
/// channel's join_ref.
pub(crate) fn join(topic: &str, msg_ref: String) -> SocketMessage {
    SocketMessage {
        topic: topic.to_string(),
        event: PHX_JOIN.to_string(),
        payload: json!({}),
        msg_ref: Some(msg_ref.clone()),
        join_ref: Some(msg_ref),
    }
}

/// Build a phx_leave for a joined channel.
pub(crate) fn leave(topic: &str, join_ref: &str, msg_ref: String) -> SocketMessage {
    SocketMessage {
        topic: topic.to_string(),
        event: PHX_LEAVE.to_string(),
        payload: json!({}),
        msg_ref: Some(msg_ref),
        join_ref: Some(join_ref.to_string()),
    }
}

/// Build a heartbeat (sent on the reserved "phoenix" topic).
pub(crate) fn heartbeat(msg_ref: String) -> SocketMessage {
    SocketMessage {
        topic: HEARTBEAT_TOPIC.to_string(),
        event: HEARTBEAT.to_string(),
        payload: json!({}),
        msg_ref: Some(msg_ref),
        join_ref: None,
    }
}
