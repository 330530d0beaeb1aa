//! Realtime change subscriptions over a shared websocket.
//!
//! One [`RealtimeClient`] per project maintains at most one socket,
//! multiplexing Phoenix-style channels. Build subscriptions with
//! [`RealtimeClient::channel`], register callbacks with
//! [`ChannelBuilder::on`], and activate them with
//! [`ChannelBuilder::subscribe`].

pub mod channel;
pub mod client;
pub mod error;
pub(crate) mod protocol;
pub mod types;

pub use channel::{ChangeCallback, ChannelBuilder, RealtimeSubscription};
pub use client::RealtimeClient;
pub use error::RealtimeError;
pub use types::{
    ChangeEvent, ChangePayload, ChannelState, ColumnInfo, ParseEventError, RealtimeConfig,
    SocketMessage,
};
