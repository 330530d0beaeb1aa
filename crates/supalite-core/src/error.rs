/// All errors surfaced by the supalite crates.
///
/// Subsystem errors (`AuthError`, `QueryError`, `RealtimeError`) convert
/// into this umbrella via `From` impls defined in their own crates.
#[derive(Debug, thiserror::Error)]
pub enum SupaliteError {
    /// Missing or invalid URL/key at construction. Fatal; raised
    /// synchronously before any network activity.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Malformed table name or unknown event type. Fails the specific
    /// call; the caller can correct and retry.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A query-builder verb was used where it has no meaning, e.g. on
    /// the wildcard table.
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// The backend rejected a REST/RPC call.
    #[error("REST error ({status}): {message}")]
    Rest {
        status: u16,
        message: String,
        code: Option<String>,
    },

    /// Network failure on a REST/RPC call or a channel join/leave.
    /// Never retried automatically.
    #[error("Transport error: {0}")]
    Transport(String),

    /// A channel unsubscribe succeeded but the connection-wide
    /// disconnect failed (or vice versa). Carries the correct remaining
    /// subscription count.
    #[error("Partial teardown ({open_subscriptions} open subscriptions): {reason}")]
    PartialTeardown {
        open_subscriptions: usize,
        reason: String,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl SupaliteError {
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }

    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::InvalidArgument(_))
    }

    pub fn is_invalid_operation(&self) -> bool {
        matches!(self, Self::InvalidOperation(_))
    }

    pub fn is_rest(&self) -> bool {
        matches!(self, Self::Rest { .. })
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    pub fn is_partial_teardown(&self) -> bool {
        matches!(self, Self::PartialTeardown { .. })
    }
}

/// Result alias using SupaliteError.
pub type SupaliteResult<T> = Result<T, SupaliteError>;
