//! End-to-end tests for the query crate against an in-process HTTP
//! server. Every test is self-contained; no live backend is needed.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value as JsonValue};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use url::Url;

use supalite_auth::{AuthClient, AuthOptions};
use supalite_core::StaticCredentials;
use supalite_query::{QueryError, RestClient};

// ── In-process HTTP server ────────────────────────────────────────────────────

#[derive(Debug)]
struct ReceivedRequest {
    method: String,
    path: String,
    headers: HashMap<String, String>,
    body: String,
}

#[derive(Clone)]
struct MockResponse {
    status: u16,
    body: String,
    headers: Vec<(String, String)>,
}

impl MockResponse {
    fn ok(body: &str) -> Self {
        Self {
            status: 200,
            body: body.to_string(),
            headers: Vec::new(),
        }
    }

    fn with_status(status: u16, body: &str) -> Self {
        Self {
            status,
            body: body.to_string(),
            headers: Vec::new(),
        }
    }

    fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }
}

/// Serve one scripted response per connection, recording each request.
async fn spawn_server(
    responses: Vec<MockResponse>,
) -> (SocketAddr, mpsc::UnboundedReceiver<ReceivedRequest>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        for response in responses {
            let (stream, _) = match listener.accept().await {
                Ok(conn) => conn,
                Err(_) => return,
            };
            handle_connection(stream, response, tx.clone()).await;
        }
    });

    (addr, rx)
}

async fn handle_connection(
    mut stream: TcpStream,
    response: MockResponse,
    tx: mpsc::UnboundedSender<ReceivedRequest>,
) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    let (head, body_start) = loop {
        let n = stream.read(&mut chunk).await.unwrap();
        if n == 0 {
            return;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = find_header_end(&buf) {
            break (String::from_utf8_lossy(&buf[..pos]).into_owned(), pos + 4);
        }
    };

    let mut lines = head.lines();
    let request_line = lines.next().unwrap_or_default();
    let mut parts = request_line.split_whitespace();
    let method = parts.next().unwrap_or_default().to_string();
    let path = parts.next().unwrap_or_default().to_string();

    let mut headers = HashMap::new();
    for line in lines {
        if let Some((name, value)) = line.split_once(':') {
            headers.insert(name.trim().to_lowercase(), value.trim().to_string());
        }
    }

    let content_length: usize = headers
        .get("content-length")
        .and_then(|v| v.parse().ok())
        .unwrap_or(0);
    let mut body = buf[body_start..].to_vec();
    while body.len() < content_length {
        let n = stream.read(&mut chunk).await.unwrap();
        if n == 0 {
            break;
        }
        body.extend_from_slice(&chunk[..n]);
    }

    let _ = tx.send(ReceivedRequest {
        method,
        path,
        headers,
        body: String::from_utf8_lossy(&body).into_owned(),
    });

    let mut extra = String::new();
    for (name, value) in &response.headers {
        extra.push_str(&format!("{}: {}\r\n", name, value));
    }
    let raw = format!(
        "HTTP/1.1 {} Mock\r\nContent-Type: application/json\r\n{}Content-Length: {}\r\nConnection: close\r\n\r\n{}",
        response.status,
        extra,
        response.body.len(),
        response.body
    );
    let _ = stream.write_all(raw.as_bytes()).await;
    let _ = stream.shutdown().await;
}

fn find_header_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|w| w == b"\r\n\r\n")
}

fn rest_client(addr: SocketAddr, key: &str) -> RestClient {
    RestClient::new(
        Url::parse(&format!("http://{}/rest/v1", addr)).unwrap(),
        "public",
        HashMap::new(),
        Arc::new(StaticCredentials::new(key)),
    )
}

async fn next_request(rx: &mut mpsc::UnboundedReceiver<ReceivedRequest>) -> ReceivedRequest {
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("timed out waiting for request")
        .expect("server dropped")
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn select_targets_table_with_credentials() {
    let (addr, mut rx) = spawn_server(vec![MockResponse::ok("[]")]).await;

    let response = rest_client(addr, "k1")
        .from::<JsonValue>("todos")
        .select("*")
        .execute()
        .await
        .unwrap();
    assert!(response.is_empty());
    assert_eq!(response.status, 200);

    let req = next_request(&mut rx).await;
    assert_eq!(req.method, "GET");
    assert!(req.path.starts_with("/rest/v1/todos"));
    assert!(req.path.contains("select=*"));
    assert_eq!(req.headers["apikey"], "k1");
    assert_eq!(req.headers["authorization"], "Bearer k1");
}

#[tokio::test]
async fn credential_snapshot_is_taken_per_call() {
    let (addr, mut rx) =
        spawn_server(vec![MockResponse::ok("[]"), MockResponse::ok("[]")]).await;

    let auth = AuthClient::new(
        Url::parse("http://x.test/auth/v1").unwrap(),
        "k1",
        AuthOptions::default(),
    )
    .unwrap();
    let rest = RestClient::new(
        Url::parse(&format!("http://{}/rest/v1", addr)).unwrap(),
        "public",
        HashMap::new(),
        Arc::new(auth.clone()),
    );

    rest.from::<JsonValue>("todos")
        .select("*")
        .execute()
        .await
        .unwrap();

    // Simulated refresh between the two calls.
    auth.set_session(serde_json::from_value(json!({ "access_token": "t2" })).unwrap());

    rest.from::<JsonValue>("todos")
        .select("*")
        .execute()
        .await
        .unwrap();

    let first = next_request(&mut rx).await;
    let second = next_request(&mut rx).await;
    assert_eq!(first.headers["authorization"], "Bearer k1");
    assert_eq!(second.headers["authorization"], "Bearer t2");
    assert_eq!(first.headers["apikey"], "k1");
    assert_eq!(second.headers["apikey"], "k1");
}

#[tokio::test]
async fn insert_posts_json_with_representation() {
    let (addr, mut rx) =
        spawn_server(vec![MockResponse::with_status(201, r#"[{"id":1,"task":"x"}]"#)]).await;

    let response = rest_client(addr, "k1")
        .from::<JsonValue>("todos")
        .insert(json!({"task": "x"}))
        .execute()
        .await
        .unwrap();
    assert_eq!(response.len(), 1);
    assert_eq!(response.status, 201);

    let req = next_request(&mut rx).await;
    assert_eq!(req.method, "POST");
    assert!(req.headers["prefer"].contains("return=representation"));
    assert!(req.headers["content-type"].contains("application/json"));
    assert_eq!(req.body, r#"{"task":"x"}"#);
}

#[tokio::test]
async fn backend_error_surfaces_as_api_error() {
    let (addr, _rx) = spawn_server(vec![MockResponse::with_status(
        404,
        r#"{"message":"relation \"public.missing\" does not exist","code":"42P01"}"#,
    )])
    .await;

    let err = rest_client(addr, "k1")
        .from::<JsonValue>("missing")
        .select("*")
        .execute()
        .await
        .unwrap_err();
    match err {
        QueryError::Api {
            status,
            message,
            code,
        } => {
            assert_eq!(status, 404);
            assert!(message.contains("does not exist"));
            assert_eq!(code.as_deref(), Some("42P01"));
        }
        other => panic!("expected Api error, got {:?}", other),
    }
}

#[tokio::test]
async fn exact_count_parses_from_content_range() {
    let (addr, mut rx) = spawn_server(vec![
        MockResponse::ok(r#"[{"id":1},{"id":2}]"#).with_header("Content-Range", "0-1/42")
    ])
    .await;

    let response = rest_client(addr, "k1")
        .from::<JsonValue>("todos")
        .select("*")
        .count()
        .execute()
        .await
        .unwrap();
    assert_eq!(response.len(), 2);
    assert_eq!(response.count, Some(42));

    let req = next_request(&mut rx).await;
    assert!(req.headers["prefer"].contains("count=exact"));
}

#[tokio::test]
async fn non_public_schema_sends_profile_headers() {
    let (addr, mut rx) =
        spawn_server(vec![MockResponse::ok("[]"), MockResponse::ok("[]")]).await;

    let rest = RestClient::new(
        Url::parse(&format!("http://{}/rest/v1", addr)).unwrap(),
        "storage",
        HashMap::new(),
        Arc::new(StaticCredentials::new("k1")),
    );

    rest.from::<JsonValue>("objects")
        .select("*")
        .execute()
        .await
        .unwrap();
    rest.from::<JsonValue>("objects")
        .update(json!({"name": "renamed"}))
        .execute()
        .await
        .unwrap();

    let read = next_request(&mut rx).await;
    assert_eq!(read.headers["accept-profile"], "storage");

    let write = next_request(&mut rx).await;
    assert_eq!(write.headers["content-profile"], "storage");
}

#[tokio::test]
async fn single_requests_object_representation() {
    let (addr, mut rx) = spawn_server(vec![MockResponse::ok(r#"{"id":7,"task":"one"}"#)]).await;

    let row = rest_client(addr, "k1")
        .from::<JsonValue>("todos")
        .select("*")
        .filter("id", "eq.7")
        .single()
        .execute()
        .await
        .unwrap()
        .into_single()
        .unwrap();
    assert_eq!(row["id"], 7);

    let req = next_request(&mut rx).await;
    assert_eq!(req.headers["accept"], "application/vnd.pgrst.object+json");
    assert!(req.path.contains("id=eq.7"));
}

#[tokio::test]
async fn rpc_posts_params_to_function_endpoint() {
    let (addr, mut rx) = spawn_server(vec![MockResponse::ok("3")]).await;

    let response = rest_client(addr, "k1")
        .rpc("add_one", json!({"n": 2}))
        .execute::<JsonValue>()
        .await
        .unwrap();
    assert_eq!(response.data[0], 3);

    let req = next_request(&mut rx).await;
    assert_eq!(req.method, "POST");
    assert!(req.path.starts_with("/rest/v1/rpc/add_one"));
    assert_eq!(req.body, r#"{"n":2}"#);
    assert_eq!(req.headers["apikey"], "k1");
}

#[tokio::test]
async fn wildcard_table_fails_before_any_network() {
    // Unroutable address: validation must reject the call first.
    let rest = RestClient::new(
        Url::parse("http://127.0.0.1:9/rest/v1").unwrap(),
        "public",
        HashMap::new(),
        Arc::new(StaticCredentials::new("k1")),
    );

    let err = rest
        .from::<JsonValue>("*")
        .select("*")
        .execute()
        .await
        .unwrap_err();
    assert!(matches!(err, QueryError::WildcardTable));

    let err = rest
        .from::<JsonValue>("   ")
        .delete()
        .execute()
        .await
        .unwrap_err();
    assert!(matches!(err, QueryError::InvalidTable(_)));
}
