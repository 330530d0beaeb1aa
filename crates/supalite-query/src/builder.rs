use std::marker::PhantomData;

use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;

use supalite_core::RestResponse;

use crate::client::RestClient;
use crate::error::QueryError;

/// A fresh per-table builder. Choosing a verb turns it into a
/// [`RequestBuilder`] preconfigured with the PostgREST conventions for
/// that verb.
pub struct QueryBuilder<T> {
    pub(crate) client: RestClient,
    pub(crate) table: String,
    pub(crate) _row: PhantomData<fn() -> T>,
}

impl<T> QueryBuilder<T> {
    /// Select rows. `columns` is a PostgREST column list; pass `"*"` for
    /// all columns.
    pub fn select(self, columns: &str) -> RequestBuilder<T> {
        let mut req = RequestBuilder::new(self.client, self.table, Method::GET);
        req.query.push(("select".to_string(), columns.to_string()));
        req
    }

    /// Insert rows. `body` is a row object or an array of row objects.
    pub fn insert(self, body: JsonValue) -> RequestBuilder<T> {
        let mut req = RequestBuilder::new(self.client, self.table, Method::POST);
        req.body = Some(body);
        req.prefer.push("return=representation");
        req
    }

    /// Update rows matching the builder's filters.
    pub fn update(self, body: JsonValue) -> RequestBuilder<T> {
        let mut req = RequestBuilder::new(self.client, self.table, Method::PATCH);
        req.body = Some(body);
        req.prefer.push("return=representation");
        req
    }

    /// Delete rows matching the builder's filters.
    pub fn delete(self) -> RequestBuilder<T> {
        let mut req = RequestBuilder::new(self.client, self.table, Method::DELETE);
        req.prefer.push("return=representation");
        req
    }
}

/// A fully-specified request awaiting modifiers and the terminal
/// `execute()`. Modifiers consume `self`; the builder is immutable from
/// the caller's point of view.
pub struct RequestBuilder<T> {
    pub(crate) client: RestClient,
    pub(crate) table: String,
    pub(crate) method: Method,
    pub(crate) body: Option<JsonValue>,
    pub(crate) query: Vec<(String, String)>,
    pub(crate) headers: Vec<(String, String)>,
    pub(crate) prefer: Vec<&'static str>,
    pub(crate) single: bool,
    pub(crate) _row: PhantomData<fn() -> T>,
}

impl<T> RequestBuilder<T> {
    fn new(client: RestClient, table: String, method: Method) -> Self {
        Self {
            client,
            table,
            method,
            body: None,
            query: Vec::new(),
            headers: Vec::new(),
            prefer: Vec::new(),
            single: false,
            _row: PhantomData,
        }
    }

    /// Raw PostgREST filter pass-through, e.g. `filter("id", "eq.1")`.
    /// The filter grammar is not interpreted here.
    pub fn filter(mut self, column: &str, spec: &str) -> Self {
        self.query.push((column.to_string(), spec.to_string()));
        self
    }

    /// Ordering spec, e.g. `"inserted_at.desc"`.
    pub fn order(mut self, spec: &str) -> Self {
        self.query.push(("order".to_string(), spec.to_string()));
        self
    }

    pub fn limit(mut self, n: u64) -> Self {
        self.query.push(("limit".to_string(), n.to_string()));
        self
    }

    pub fn offset(mut self, n: u64) -> Self {
        self.query.push(("offset".to_string(), n.to_string()));
        self
    }

    /// Request a single object response
    /// (`Accept: application/vnd.pgrst.object+json`).
    pub fn single(mut self) -> Self {
        self.single = true;
        self
    }

    /// Request an exact row count (`Prefer: count=exact`); the count is
    /// reported via the response's `count` field.
    pub fn count(mut self) -> Self {
        self.prefer.push("count=exact");
        self
    }

    /// Add a request header, overriding defaults of the same name.
    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }
}

impl<T: DeserializeOwned> RequestBuilder<T> {
    /// Validate, take a fresh credential snapshot, send, and parse.
    pub async fn execute(self) -> Result<RestResponse<T>, QueryError> {
        crate::execute::execute_table_request(self).await
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;

    use supalite_core::StaticCredentials;
    use url::Url;

    use super::*;

    fn client() -> RestClient {
        RestClient::new(
            Url::parse("https://x.test/rest/v1").unwrap(),
            "public",
            HashMap::new(),
            Arc::new(StaticCredentials::new("k1")),
        )
    }

    #[test]
    fn select_sets_columns_param() {
        let req: RequestBuilder<JsonValue> = client().from("todos").select("*");
        assert_eq!(req.method, Method::GET);
        assert_eq!(req.query, vec![("select".to_string(), "*".to_string())]);
        assert!(req.prefer.is_empty());
    }

    #[test]
    fn insert_is_post_with_representation() {
        let req: RequestBuilder<JsonValue> =
            client().from("todos").insert(serde_json::json!({"task": "x"}));
        assert_eq!(req.method, Method::POST);
        assert!(req.body.is_some());
        assert_eq!(req.prefer, vec!["return=representation"]);
    }

    #[test]
    fn update_is_patch_delete_is_delete() {
        let req: RequestBuilder<JsonValue> =
            client().from("todos").update(serde_json::json!({"done": true}));
        assert_eq!(req.method, Method::PATCH);

        let req: RequestBuilder<JsonValue> = client().from("todos").delete();
        assert_eq!(req.method, Method::DELETE);
        assert!(req.body.is_none());
    }

    #[test]
    fn modifiers_accumulate_in_order() {
        let req: RequestBuilder<JsonValue> = client()
            .from("todos")
            .select("id,task")
            .filter("id", "eq.1")
            .order("id.asc")
            .limit(10)
            .offset(5);
        assert_eq!(
            req.query,
            vec![
                ("select".to_string(), "id,task".to_string()),
                ("id".to_string(), "eq.1".to_string()),
                ("order".to_string(), "id.asc".to_string()),
                ("limit".to_string(), "10".to_string()),
                ("offset".to_string(), "5".to_string()),
            ]
        );
    }

    #[test]
    fn count_and_single_flags() {
        let req: RequestBuilder<JsonValue> = client().from("todos").select("*").count().single();
        assert!(req.single);
        assert_eq!(req.prefer, vec!["count=exact"]);
    }
}
