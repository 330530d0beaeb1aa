use std::marker::PhantomData;
use std::sync::Arc;

use serde_json::Value as JsonValue;

use supalite_core::SupaliteError;
use supalite_query::RequestBuilder;
use supalite_realtime::{
    ChangeCallback, ChangeEvent, ChangePayload, ParseEventError, RealtimeSubscription,
};

use crate::client::SupaliteClient;

/// A per-table handle minted by [`SupaliteClient::from`].
///
/// Every call mints a fresh builder; nothing is cached on the handle.
/// The same handle serves both queries (`select`/`insert`/`update`/
/// `delete`) and change subscriptions (`on(...).subscribe()`).
pub struct TableHandle<T> {
    pub(crate) client: SupaliteClient,
    pub(crate) table: String,
    pub(crate) _row: PhantomData<fn() -> T>,
}

impl<T> TableHandle<T> {
    pub fn select(&self, columns: &str) -> RequestBuilder<T> {
        self.client.inner.rest.from(&self.table).select(columns)
    }

    pub fn insert(&self, body: JsonValue) -> RequestBuilder<T> {
        self.client.inner.rest.from(&self.table).insert(body)
    }

    pub fn update(&self, body: JsonValue) -> RequestBuilder<T> {
        self.client.inner.rest.from(&self.table).update(body)
    }

    pub fn delete(&self) -> RequestBuilder<T> {
        self.client.inner.rest.from(&self.table).delete()
    }

    /// Start a change subscription on this table with no bindings yet.
    /// Subscribing without any `on` registrations is legal; the channel
    /// is joined and events are simply dropped.
    pub fn changes(&self) -> SubscriptionBuilder {
        SubscriptionBuilder {
            client: self.client.clone(),
            table: self.table.clone(),
            bindings: Vec::new(),
        }
    }

    /// Start a change subscription on this table. `event` is `"INSERT"`,
    /// `"UPDATE"`, `"DELETE"`, or `"*"`; an unknown name fails at
    /// `subscribe()` before anything connects. Chain further `on` calls
    /// to register more callbacks, then finish with
    /// [`SubscriptionBuilder::subscribe`].
    pub fn on<F>(&self, event: impl Into<String>, callback: F) -> SubscriptionBuilder
    where
        F: Fn(ChangePayload) + Send + Sync + 'static,
    {
        self.changes().on(event, callback)
    }
}

/// Accumulates `(event, callback)` bindings for one subscription.
///
/// Bindings fire in registration order; a `"*"` binding is the
/// catch-all for events no exact binding matched. The terminal
/// `subscribe()` validates, joins the channel, and registers the
/// subscription with the lifecycle manager.
pub struct SubscriptionBuilder {
    client: SupaliteClient,
    table: String,
    bindings: Vec<(String, ChangeCallback)>,
}

impl SubscriptionBuilder {
    /// Register another callback on the same subscription.
    pub fn on<F>(mut self, event: impl Into<String>, callback: F) -> Self
    where
        F: Fn(ChangePayload) + Send + Sync + 'static,
    {
        self.bindings.push((event.into(), Arc::new(callback)));
        self
    }

    /// Validate the table name and events, ensure the shared socket is
    /// open, join the channel, and track the result. The table `"*"`
    /// subscribes to the whole schema; any other name containing `*` is
    /// invalid, as is an empty name.
    pub async fn subscribe(self) -> Result<RealtimeSubscription, SupaliteError> {
        let channel_name = channel_name(self.client.schema(), &self.table)?;

        let mut builder = self.client.inner.realtime.channel(&channel_name);
        for (event, callback) in self.bindings {
            let parsed: ChangeEvent = event
                .parse()
                .map_err(|e: ParseEventError| SupaliteError::InvalidArgument(e.to_string()))?;
            builder = builder.on(parsed, move |payload| callback(payload));
        }

        let subscription = builder.subscribe().await?;
        self.client
            .inner
            .subscriptions
            .track(subscription.clone())
            .await;
        Ok(subscription)
    }
}

/// The channel name for a table subscription: `<schema>` for the
/// schema-wide wildcard, `<schema>:<table>` otherwise.
fn channel_name(schema: &str, table: &str) -> Result<String, SupaliteError> {
    if table.is_empty() {
        return Err(SupaliteError::InvalidArgument(
            "table name must not be empty".to_string(),
        ));
    }
    if table == "*" {
        return Ok(schema.to_string());
    }
    if table.contains('*') {
        return Err(SupaliteError::InvalidArgument(format!(
            "invalid table name: {:?}",
            table
        )));
    }
    Ok(format!("{}:{}", schema, table))
}
