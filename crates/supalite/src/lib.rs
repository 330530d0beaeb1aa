//! A unified client for Supabase-style backends: PostgREST queries,
//! RPC, auth session storage, and realtime change subscriptions behind
//! one entry point.
//!
//! # Usage
//!
//! ```ignore
//! use supalite::SupaliteClient;
//!
//! let client = SupaliteClient::new("https://example.supabase.co", "anon-key")?;
//!
//! // Query a table.
//! let todos = client
//!     .from::<Todo>("todos")
//!     .select("*")
//!     .order("inserted_at.desc")
//!     .execute()
//!     .await?;
//!
//! // Listen for inserts.
//! let subscription = client
//!     .from::<Todo>("todos")
//!     .on("INSERT", |change| println!("new row: {:?}", change.record))
//!     .subscribe()
//!     .await?;
//!
//! // Tear it down; the socket closes with the last subscription.
//! client.remove_subscription(&subscription).await?;
//! ```

pub mod client;
pub mod subscriptions;
pub mod table;

pub use client::SupaliteClient;
pub use subscriptions::SubscriptionManager;
pub use table::{SubscriptionBuilder, TableHandle};

// Re-exports from the subsystem crates
pub use supalite_auth::{AuthClient, AuthOptions, Session, User};
pub use supalite_core::{
    ClientOptions, CredentialProvider, Credentials, Endpoints, RestResponse, StaticCredentials,
    SupaliteError, SupaliteResult,
};
pub use supalite_query::{QueryBuilder, RequestBuilder, RpcBuilder};
pub use supalite_realtime::{
    ChangeEvent, ChangePayload, ChannelState, ColumnInfo, RealtimeSubscription,
};

/// Commonly used types in one import.
pub mod prelude {
    pub use crate::{
        ChangeEvent, ChangePayload, ClientOptions, RestResponse, Session, SupaliteClient,
        SupaliteError, SupaliteResult,
    };
}
