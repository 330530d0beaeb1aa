//! The shared send path for table requests and RPC calls.
//!
//! Every request assembles its header set here, immediately before the
//! network call: the credential snapshot is taken per call so a token
//! refresh between two calls is reflected in the second call's
//! `Authorization` header.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use tracing::debug;
use url::Url;

use supalite_core::{CredentialProvider, RestResponse};

use crate::builder::RequestBuilder;
use crate::client::RestClient;
use crate::error::QueryError;

/// Table names must be non-empty, and the wildcard table is reserved for
/// subscriptions.
pub(crate) fn validate_table(table: &str) -> Result<(), QueryError> {
    if table.trim().is_empty() {
        return Err(QueryError::InvalidTable(
            "table name must not be empty".to_string(),
        ));
    }
    if table.contains('*') {
        return Err(QueryError::WildcardTable);
    }
    Ok(())
}

pub(crate) fn endpoint_url(rest_url: &Url, segment: &str) -> Result<Url, QueryError> {
    let joined = format!("{}/{}", rest_url.as_str().trim_end_matches('/'), segment);
    Ok(Url::parse(&joined)?)
}

pub(crate) async fn execute_table_request<T: DeserializeOwned>(
    req: RequestBuilder<T>,
) -> Result<RestResponse<T>, QueryError> {
    validate_table(&req.table)?;
    let url = endpoint_url(&req.client.rest_url, &req.table)?;
    send(
        &req.client,
        req.method,
        url,
        &req.query,
        &req.headers,
        &req.prefer,
        req.body,
        req.single,
    )
    .await
}

#[allow(clippy::too_many_arguments)]
pub(crate) async fn send<T: DeserializeOwned>(
    client: &RestClient,
    method: Method,
    url: Url,
    query: &[(String, String)],
    extra_headers: &[(String, String)],
    prefer: &[&'static str],
    body: Option<JsonValue>,
    single: bool,
) -> Result<RestResponse<T>, QueryError> {
    let mut headers = HeaderMap::new();
    for (name, value) in &client.default_headers {
        insert_header(&mut headers, name, value)?;
    }

    // Fresh credential snapshot, once per call.
    for (name, value) in client.credentials.credentials().header_pairs() {
        insert_header(&mut headers, name, &value)?;
    }

    // Non-public schemas are addressed via profile headers.
    if client.schema != "public" {
        let profile = if method == Method::GET || method == Method::HEAD {
            "Accept-Profile"
        } else {
            "Content-Profile"
        };
        insert_header(&mut headers, profile, &client.schema)?;
    }

    if single {
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.pgrst.object+json"),
        );
    } else {
        headers
            .entry(ACCEPT)
            .or_insert(HeaderValue::from_static("application/json"));
    }

    if !prefer.is_empty() {
        insert_header(&mut headers, "Prefer", &prefer.join(","))?;
    }

    // Caller-supplied headers win over everything above.
    for (name, value) in extra_headers {
        insert_header(&mut headers, name, value)?;
    }

    debug!(method = %method, url = %url, "Executing REST request");

    let mut request = client
        .http
        .request(method, url)
        .headers(headers)
        .query(query);
    if let Some(body) = &body {
        request = request
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .json(body);
    }

    let response = request.send().await?;
    let status = response.status().as_u16();
    let count = parse_count(response.headers());
    let body_text = response.text().await?;

    if status >= 400 {
        return Err(parse_error_body(status, &body_text));
    }

    if status == 204 || body_text.is_empty() {
        return Ok(RestResponse::new(Vec::new(), count, status));
    }

    let data = if single {
        vec![serde_json::from_str::<T>(&body_text)?]
    } else {
        match serde_json::from_str::<Vec<T>>(&body_text) {
            Ok(rows) => rows,
            // Scalar RPC results and single-object representations
            // arrive as a bare value rather than an array.
            Err(_) => vec![serde_json::from_str::<T>(&body_text)?],
        }
    };

    Ok(RestResponse::new(data, count, status))
}

fn insert_header(headers: &mut HeaderMap, name: &str, value: &str) -> Result<(), QueryError> {
    let name = HeaderName::from_bytes(name.as_bytes())
        .map_err(|e| QueryError::InvalidHeader(format!("{}: {}", name, e)))?;
    let value = HeaderValue::from_str(value)
        .map_err(|e| QueryError::InvalidHeader(format!("{}: {}", name, e)))?;
    headers.insert(name, value);
    Ok(())
}

/// PostgREST reports the exact count in `Content-Range: 0-9/100`.
fn parse_count(headers: &HeaderMap) -> Option<i64> {
    headers
        .get("content-range")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.rsplit('/').next())
        .filter(|total| *total != "*")
        .and_then(|total| total.parse::<i64>().ok())
}

/// PostgREST error bodies look like `{message, code, details, hint}`.
fn parse_error_body(status: u16, body: &str) -> QueryError {
    if let Ok(error_obj) = serde_json::from_str::<JsonValue>(body) {
        let message = error_obj
            .get("message")
            .and_then(|v| v.as_str())
            .unwrap_or("Unknown error")
            .to_string();
        let code = error_obj
            .get("code")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string());
        QueryError::Api {
            status,
            message,
            code,
        }
    } else {
        QueryError::Api {
            status,
            message: body.to_string(),
            code: None,
        }
    }
}
