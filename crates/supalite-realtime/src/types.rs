use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ── Socket protocol ───────────────────────────────────────────────────────────

/// A Phoenix-style socket message (protocol v1.0.0 framing).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SocketMessage {
    pub topic: String,
    pub event: String,
    pub payload: Value,
    #[serde(rename = "ref")]
    pub msg_ref: Option<String>,
    #[serde(default)]
    pub join_ref: Option<String>,
}

// ── Channel state ─────────────────────────────────────────────────────────────

/// The lifecycle state of a subscription's channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    /// Created but never joined, or returned here after a failed join.
    Unjoined,
    Joining,
    Joined,
    /// Left, errored, or torn down with the connection. Terminal.
    Closed,
}

impl fmt::Display for ChannelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unjoined => write!(f, "unjoined"),
            Self::Joining => write!(f, "joining"),
            Self::Joined => write!(f, "joined"),
            Self::Closed => write!(f, "closed"),
        }
    }
}

// ── Change events ─────────────────────────────────────────────────────────────

/// Row-level change event types. `All` is the wildcard: as a binding it
/// is the catch-all for events no other binding matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeEvent {
    #[serde(rename = "*")]
    All,
    #[serde(rename = "INSERT")]
    Insert,
    #[serde(rename = "UPDATE")]
    Update,
    #[serde(rename = "DELETE")]
    Delete,
}

impl fmt::Display for ChangeEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => write!(f, "*"),
            Self::Insert => write!(f, "INSERT"),
            Self::Update => write!(f, "UPDATE"),
            Self::Delete => write!(f, "DELETE"),
        }
    }
}

/// Returned when an event-type string is not one of
/// `INSERT`/`UPDATE`/`DELETE`/`*`.
#[derive(Debug, thiserror::Error)]
#[error("unknown change event: {0}")]
pub struct ParseEventError(String);

impl FromStr for ChangeEvent {
    type Err = ParseEventError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "*" => Ok(Self::All),
            "INSERT" => Ok(Self::Insert),
            "UPDATE" => Ok(Self::Update),
            "DELETE" => Ok(Self::Delete),
            other => Err(ParseEventError(other.to_string())),
        }
    }
}

/// Payload delivered with a row-level change event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangePayload {
    pub schema: String,
    pub table: String,
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default)]
    pub commit_timestamp: Option<String>,
    #[serde(default)]
    pub columns: Vec<ColumnInfo>,
    /// The new row. Present for INSERT and UPDATE events.
    #[serde(default)]
    pub record: Option<Value>,
    /// The previous row. Present for UPDATE and DELETE events.
    #[serde(default)]
    pub old_record: Option<Value>,
}

/// Column metadata carried in a change payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: String,
}

// ── Client config ─────────────────────────────────────────────────────────────

/// Configuration for the realtime registry.
#[derive(Debug, Clone)]
pub struct RealtimeConfig {
    /// The derived realtime endpoint (`.../realtime/v1`), ws/wss or
    /// http/https scheme.
    pub url: String,
    /// The project API key, appended to the websocket URL.
    pub api_key: String,
    /// Heartbeat interval (default: 25s).
    pub heartbeat_interval: Duration,
    /// Timeout for join/leave acknowledgements (default: 10s).
    pub join_timeout: Duration,
}

impl RealtimeConfig {
    pub fn new(url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            api_key: api_key.into(),
            heartbeat_interval: Duration::from_secs(25),
            join_timeout: Duration::from_secs(10),
        }
    }
}
