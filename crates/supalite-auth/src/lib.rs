//! Session store and credential provider for supalite.
//!
//! This crate holds the current auth session and exposes it through the
//! [`supalite_core::CredentialProvider`] seam. The auth protocol itself
//! (sign-in, token refresh) belongs to an external engine; this crate
//! only stores the session it produces and threads the engine's
//! configuration flags through.

pub mod client;
pub mod error;
pub mod types;

// Re-exports for convenient access
pub use client::{AuthClient, AuthOptions};
pub use error::AuthError;
pub use types::{Session, User};
