use std::marker::PhantomData;
use std::sync::Arc;

use serde_json::Value as JsonValue;
use url::Url;

use supalite_auth::{AuthClient, AuthOptions};
use supalite_core::{ClientOptions, CredentialProvider, Endpoints, SupaliteError};
use supalite_query::{RestClient, RpcBuilder};
use supalite_realtime::{RealtimeClient, RealtimeConfig, RealtimeSubscription};

use crate::subscriptions::SubscriptionManager;
use crate::table::TableHandle;

pub(crate) struct ClientInner {
    pub(crate) endpoints: Endpoints,
    pub(crate) options: ClientOptions,
    pub(crate) auth: AuthClient,
    pub(crate) rest: RestClient,
    pub(crate) realtime: RealtimeClient,
    pub(crate) subscriptions: SubscriptionManager,
}

/// The unified entry point: one project URL and API key yield REST
/// queries, RPC, auth session storage, and realtime subscriptions that
/// all share credentials and configuration.
///
/// Wraps `Arc<Inner>`: cheaply cloneable, `Send + Sync`. Construction
/// is synchronous and performs no I/O; the realtime socket opens lazily
/// on the first `subscribe()`.
#[derive(Clone)]
pub struct SupaliteClient {
    pub(crate) inner: Arc<ClientInner>,
}

impl std::fmt::Debug for SupaliteClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupaliteClient")
            .field("endpoints", &self.inner.endpoints)
            .field("schema", &self.inner.options.schema)
            .finish_non_exhaustive()
    }
}

impl SupaliteClient {
    /// Create a client with default options (`public` schema).
    pub fn new(url: &str, api_key: &str) -> Result<Self, SupaliteError> {
        Self::with_options(url, api_key, ClientOptions::default())
    }

    /// Create a client with explicit options. The URL and key are
    /// validated here; a blank key or malformed URL fails before any
    /// network use.
    pub fn with_options(
        url: &str,
        api_key: &str,
        options: ClientOptions,
    ) -> Result<Self, SupaliteError> {
        if api_key.trim().is_empty() {
            return Err(SupaliteError::configuration("API key is required"));
        }
        let endpoints = Endpoints::derive(url)?;

        let auth = AuthClient::new(
            endpoints.auth.clone(),
            api_key,
            AuthOptions {
                auto_refresh_token: options.auto_refresh_token,
                persist_session: options.persist_session,
                detect_session_in_url: options.detect_session_in_url,
            },
        )?;

        let credentials: Arc<dyn CredentialProvider> = Arc::new(auth.clone());
        let rest = RestClient::new(
            endpoints.rest.clone(),
            options.schema.clone(),
            options.headers.clone(),
            credentials,
        );

        let realtime = RealtimeClient::with_config(RealtimeConfig::new(
            endpoints.realtime.as_str(),
            api_key,
        ))?;
        let subscriptions = SubscriptionManager::new(realtime.clone());

        Ok(Self {
            inner: Arc::new(ClientInner {
                endpoints,
                options,
                auth,
                rest,
                realtime,
                subscriptions,
            }),
        })
    }

    /// A handle to `table`: the starting point for queries and change
    /// subscriptions. Handles are cheap and carry no per-table state.
    pub fn from<T>(&self, table: &str) -> TableHandle<T> {
        TableHandle {
            client: self.clone(),
            table: table.to_string(),
            _row: PhantomData,
        }
    }

    /// Call a stored procedure via `POST <rest>/rpc/<function>`.
    pub fn rpc(&self, function: &str, params: JsonValue) -> RpcBuilder {
        self.inner.rest.rpc(function, params)
    }

    /// The session store shared by every request this client sends.
    pub fn auth(&self) -> &AuthClient {
        &self.inner.auth
    }

    /// Remove a subscription: leave its channel, untrack it, and, when
    /// it was the last one, close the shared socket. Returns the number
    /// of subscriptions still open.
    pub async fn remove_subscription(
        &self,
        subscription: &RealtimeSubscription,
    ) -> Result<usize, SupaliteError> {
        self.inner.subscriptions.remove(subscription).await
    }

    /// A snapshot of the currently tracked subscriptions.
    pub async fn get_subscriptions(&self) -> Vec<RealtimeSubscription> {
        self.inner.subscriptions.snapshot().await
    }

    pub fn schema(&self) -> &str {
        &self.inner.options.schema
    }

    pub fn rest_url(&self) -> &Url {
        &self.inner.endpoints.rest
    }

    pub fn auth_url(&self) -> &Url {
        &self.inner.endpoints.auth
    }

    pub fn realtime_url(&self) -> &Url {
        &self.inner.endpoints.realtime
    }
}
