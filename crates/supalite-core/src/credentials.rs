use std::sync::Arc;

/// An ephemeral credential snapshot computed fresh for every outgoing
/// REST/RPC call. Never cached inside a table handle; a token refresh
/// between two calls must be visible in the second call's headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub api_key: String,
    pub bearer_token: String,
}

impl Credentials {
    /// Anonymous credentials: the bearer token falls back to the API key.
    pub fn anonymous(api_key: impl Into<String>) -> Self {
        let api_key = api_key.into();
        Self {
            bearer_token: api_key.clone(),
            api_key,
        }
    }

    /// The `apikey` and `Authorization` header pair for a request.
    pub fn header_pairs(&self) -> [(&'static str, String); 2] {
        [
            ("apikey", self.api_key.clone()),
            ("Authorization", format!("Bearer {}", self.bearer_token)),
        ]
    }
}

/// Supplies the current bearer token for authenticated requests.
///
/// Implementations must be cheap and non-blocking; the query executor
/// calls this immediately before every send.
pub trait CredentialProvider: Send + Sync {
    fn credentials(&self) -> Credentials;
}

impl<P: CredentialProvider + ?Sized> CredentialProvider for Arc<P> {
    fn credentials(&self) -> Credentials {
        (**self).credentials()
    }
}

/// A provider with no session: always anonymous.
#[derive(Debug, Clone)]
pub struct StaticCredentials {
    api_key: String,
}

impl StaticCredentials {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
        }
    }
}

impl CredentialProvider for StaticCredentials {
    fn credentials(&self) -> Credentials {
        Credentials::anonymous(self.api_key.clone())
    }
}
