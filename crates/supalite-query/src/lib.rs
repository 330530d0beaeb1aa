//! PostgREST-convention request builders and executor for supalite.
//!
//! This crate is the Query Builder Factory: given the derived REST
//! endpoint, the active schema, default headers, and a credential
//! provider, it mints cheap per-table builders whose requests read a
//! fresh credential snapshot immediately before every send.
//!
//! The filter grammar is deliberately not modeled: filters are raw
//! PostgREST filter strings passed through verbatim.
//!
//! # Usage
//!
//! ```ignore
//! let rest = RestClient::new(rest_url, "public", headers, credentials);
//! let rows: RestResponse<Todo> = rest
//!     .from("todos")
//!     .select("*")
//!     .filter("done", "eq.false")
//!     .order("inserted_at.desc")
//!     .execute()
//!     .await?;
//! ```

pub mod builder;
pub mod client;
pub mod error;
mod execute;
pub mod rpc;

// Re-exports for convenient access
pub use builder::{QueryBuilder, RequestBuilder};
pub use client::RestClient;
pub use error::QueryError;
pub use rpc::RpcBuilder;
