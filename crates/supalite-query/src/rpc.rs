use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;

use supalite_core::RestResponse;

use crate::client::RestClient;
use crate::error::QueryError;
use crate::execute;

/// A stored-procedure call: `POST <rest>/rpc/<function>` with JSON
/// params. Uses the same header, profile, and credential rules as the
/// table verbs.
pub struct RpcBuilder {
    client: RestClient,
    function: String,
    params: JsonValue,
    headers: Vec<(String, String)>,
    single: bool,
}

impl RpcBuilder {
    pub(crate) fn new(client: RestClient, function: &str, params: JsonValue) -> Self {
        Self {
            client,
            function: function.to_string(),
            params,
            headers: Vec::new(),
            single: false,
        }
    }

    /// Add a request header, overriding defaults of the same name.
    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    /// Request a single object response.
    pub fn single(mut self) -> Self {
        self.single = true;
        self
    }

    /// Execute the call and parse the result rows.
    pub async fn execute<T: DeserializeOwned>(self) -> Result<RestResponse<T>, QueryError> {
        if self.function.trim().is_empty() {
            return Err(QueryError::InvalidTable(
                "function name must not be empty".to_string(),
            ));
        }
        let url = execute::endpoint_url(
            &self.client.rest_url,
            &format!("rpc/{}", self.function),
        )?;
        execute::send(
            &self.client,
            Method::POST,
            url,
            &[],
            &self.headers,
            &[],
            Some(self.params),
            self.single,
        )
        .await
    }
}
