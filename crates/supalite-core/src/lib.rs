//! Shared foundation for the supalite client crates.
//!
//! Holds the pieces every subsystem needs: client options and endpoint
//! derivation, the error taxonomy, the credential-snapshot seam, and the
//! REST response envelope.

pub mod config;
pub mod credentials;
pub mod error;
pub mod response;

// Re-exports for convenient access
pub use config::{default_headers, ClientOptions, Endpoints};
pub use credentials::{CredentialProvider, Credentials, StaticCredentials};
pub use error::{SupaliteError, SupaliteResult};
pub use response::RestResponse;
