use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;

use serde_json::Value as JsonValue;
use url::Url;

use supalite_core::CredentialProvider;

use crate::builder::QueryBuilder;
use crate::rpc::RpcBuilder;

/// Factory for per-table query builders.
///
/// Builders minted from this factory are stateless and cheap; nothing is
/// cached per table. Credentials are read from the provider at send
/// time, never at builder-creation time.
#[derive(Clone)]
pub struct RestClient {
    pub(crate) http: reqwest::Client,
    pub(crate) rest_url: Url,
    pub(crate) schema: String,
    pub(crate) default_headers: HashMap<String, String>,
    pub(crate) credentials: Arc<dyn CredentialProvider>,
}

impl RestClient {
    /// Create a new factory for the derived REST endpoint.
    pub fn new(
        rest_url: Url,
        schema: impl Into<String>,
        default_headers: HashMap<String, String>,
        credentials: Arc<dyn CredentialProvider>,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            rest_url,
            schema: schema.into(),
            default_headers,
            credentials,
        }
    }

    /// The REST endpoint this factory targets.
    pub fn rest_url(&self) -> &Url {
        &self.rest_url
    }

    /// The active schema.
    pub fn schema(&self) -> &str {
        &self.schema
    }

    /// Start a query against `table`.
    pub fn from<T>(&self, table: &str) -> QueryBuilder<T> {
        QueryBuilder {
            client: self.clone(),
            table: table.to_string(),
            _row: PhantomData,
        }
    }

    /// Call a stored procedure via `POST <rest>/rpc/<function>`.
    pub fn rpc(&self, function: &str, params: JsonValue) -> RpcBuilder {
        RpcBuilder::new(self.clone(), function, params)
    }
}
