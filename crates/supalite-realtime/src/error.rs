use std::time::Duration;

use supalite_core::SupaliteError;

#[derive(Debug, thiserror::Error)]
pub enum RealtimeError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Not connected")]
    NotConnected,

    #[error("Channel ack timed out after {0:?}")]
    AckTimeout(Duration),

    #[error("Channel join rejected: {0}")]
    JoinRejected(String),

    #[error("Connection closed")]
    ConnectionClosed,
}

impl From<RealtimeError> for SupaliteError {
    fn from(e: RealtimeError) -> Self {
        match e {
            RealtimeError::InvalidConfig(msg) => SupaliteError::Configuration(msg),
            RealtimeError::UrlParse(err) => SupaliteError::Configuration(err.to_string()),
            RealtimeError::Serialization(err) => SupaliteError::Serialization(err),
            other => SupaliteError::Transport(other.to_string()),
        }
    }
}
