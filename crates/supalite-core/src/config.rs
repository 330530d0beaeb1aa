use std::collections::HashMap;

use url::Url;

use crate::error::SupaliteError;

/// The minimal default header set sent with every request.
pub fn default_headers() -> HashMap<String, String> {
    let mut headers = HashMap::new();
    headers.insert(
        "X-Client-Info".to_string(),
        format!("supalite-rust/{}", env!("CARGO_PKG_VERSION")),
    );
    headers
}

/// Client-wide configuration options.
///
/// The session flags (`auto_refresh_token`, `persist_session`,
/// `detect_session_in_url`) are carried for the external session engine;
/// this crate only threads them through.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// The Postgres schema your tables belong to.
    pub schema: String,
    /// Automatically refresh the token for logged-in users.
    pub auto_refresh_token: bool,
    /// Persist a logged-in session to storage.
    pub persist_session: bool,
    /// Detect a session from the URL (OAuth login callbacks).
    pub detect_session_in_url: bool,
    /// Extra headers sent with each network request. Merged over the
    /// defaults; caller-supplied values win.
    pub headers: HashMap<String, String>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            schema: "public".to_string(),
            auto_refresh_token: true,
            persist_session: true,
            detect_session_in_url: true,
            headers: default_headers(),
        }
    }
}

impl ClientOptions {
    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = schema.into();
        self
    }

    pub fn with_auto_refresh_token(mut self, enabled: bool) -> Self {
        self.auto_refresh_token = enabled;
        self
    }

    pub fn with_persist_session(mut self, enabled: bool) -> Self {
        self.persist_session = enabled;
        self
    }

    pub fn with_detect_session_in_url(mut self, enabled: bool) -> Self {
        self.detect_session_in_url = enabled;
        self
    }

    /// Add a single default header. Overrides any existing value.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Merge a header map over the current set; supplied values win.
    pub fn with_headers(mut self, headers: HashMap<String, String>) -> Self {
        self.headers.extend(headers);
        self
    }
}

/// The three service endpoints derived from one project URL.
#[derive(Debug, Clone)]
pub struct Endpoints {
    /// `<base>/rest/v1`
    pub rest: Url,
    /// `<base>/auth/v1`
    pub auth: Url,
    /// `<base>/realtime/v1`, with the HTTP scheme swapped for the
    /// websocket scheme.
    pub realtime: Url,
}

impl Endpoints {
    /// Derive the REST, auth, and realtime endpoints from a project URL.
    ///
    /// The base must be a non-empty `http`/`https` URL; anything else is
    /// a configuration error.
    pub fn derive(base_url: &str) -> Result<Self, SupaliteError> {
        let base = base_url.trim().trim_end_matches('/');
        if base.is_empty() {
            return Err(SupaliteError::configuration("project URL is required"));
        }

        let parsed = Url::parse(base)
            .map_err(|e| SupaliteError::Configuration(format!("invalid project URL: {}", e)))?;

        let ws_scheme = match parsed.scheme() {
            "http" => "ws",
            "https" => "wss",
            other => {
                return Err(SupaliteError::Configuration(format!(
                    "unsupported URL scheme: {}",
                    other
                )));
            }
        };

        let rest = Url::parse(&format!("{}/rest/v1", base))
            .map_err(|e| SupaliteError::Configuration(e.to_string()))?;
        let auth = Url::parse(&format!("{}/auth/v1", base))
            .map_err(|e| SupaliteError::Configuration(e.to_string()))?;

        let mut realtime = Url::parse(&format!("{}/realtime/v1", base))
            .map_err(|e| SupaliteError::Configuration(e.to_string()))?;
        realtime
            .set_scheme(ws_scheme)
            .map_err(|_| SupaliteError::configuration("failed to set websocket scheme"))?;

        Ok(Self {
            rest,
            auth,
            realtime,
        })
    }
}
