use std::sync::{Arc, RwLock};

use tracing::debug;
use url::Url;

use supalite_core::{CredentialProvider, Credentials};

use crate::error::AuthError;
use crate::types::Session;

/// Configuration carried for the external session engine.
///
/// The engine (token refresh, session persistence, URL detection) is an
/// external collaborator; these flags are stored so it can read them.
#[derive(Debug, Clone)]
pub struct AuthOptions {
    pub auto_refresh_token: bool,
    pub persist_session: bool,
    pub detect_session_in_url: bool,
}

impl Default for AuthOptions {
    fn default() -> Self {
        Self {
            auto_refresh_token: true,
            persist_session: true,
            detect_session_in_url: true,
        }
    }
}

struct AuthClientInner {
    auth_url: Url,
    api_key: String,
    options: AuthOptions,
    session: RwLock<Option<Session>>,
}

/// Session store for one client, and the [`CredentialProvider`] every
/// outgoing request reads its bearer token from.
///
/// Wraps `Arc<Inner>`: cheaply cloneable, `Send + Sync`.
#[derive(Clone)]
pub struct AuthClient {
    inner: Arc<AuthClientInner>,
}

impl AuthClient {
    /// Create a new auth client for the derived auth endpoint.
    pub fn new(auth_url: Url, api_key: &str, options: AuthOptions) -> Result<Self, AuthError> {
        if api_key.trim().is_empty() {
            return Err(AuthError::InvalidConfig(
                "API key must not be empty".to_string(),
            ));
        }

        Ok(Self {
            inner: Arc::new(AuthClientInner {
                auth_url,
                api_key: api_key.to_string(),
                options,
                session: RwLock::new(None),
            }),
        })
    }

    /// The auth endpoint this client was configured with.
    pub fn auth_url(&self) -> &Url {
        &self.inner.auth_url
    }

    pub fn options(&self) -> &AuthOptions {
        &self.inner.options
    }

    /// Install a session, replacing any previous one.
    pub fn set_session(&self, session: Session) {
        debug!(
            expires_at = ?session.expires_at,
            "Installing auth session"
        );
        let mut slot = self
            .inner
            .session
            .write()
            .unwrap_or_else(|p| p.into_inner());
        *slot = Some(session);
    }

    /// Drop the current session; subsequent requests fall back to the
    /// anonymous API key.
    pub fn clear_session(&self) {
        debug!("Clearing auth session");
        let mut slot = self
            .inner
            .session
            .write()
            .unwrap_or_else(|p| p.into_inner());
        *slot = None;
    }

    /// A clone-out snapshot of the current session, if any.
    pub fn current_session(&self) -> Option<Session> {
        self.inner
            .session
            .read()
            .unwrap_or_else(|p| p.into_inner())
            .clone()
    }

    /// The current access token, if a session is installed.
    pub fn access_token(&self) -> Option<String> {
        self.inner
            .session
            .read()
            .unwrap_or_else(|p| p.into_inner())
            .as_ref()
            .map(|s| s.access_token.clone())
    }
}

impl CredentialProvider for AuthClient {
    /// Bearer = the current session's access token if one is set,
    /// otherwise the static API key. Recomputed on every call so token
    /// refreshes are honored without caller involvement.
    fn credentials(&self) -> Credentials {
        let bearer = self
            .access_token()
            .unwrap_or_else(|| self.inner.api_key.clone());
        Credentials {
            api_key: self.inner.api_key.clone(),
            bearer_token: bearer,
        }
    }
}
