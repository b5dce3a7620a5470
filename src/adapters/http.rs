//! HTTP adapter
//!
//! Routes:
//! - `GET /health`
//! - `GET /providers` - provider status JSON
//! - `GET /usage` - usage summary JSON
//! - `POST /mcp` - one JSON-RPC message per request body
//!
//! When an auth token is configured every route requires
//! `Authorization: Bearer <token>`.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::{Request, State};
use axum::http::{header, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use tokio::net::TcpListener;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tracing::{error, info};

use crate::error::Error;
use crate::mcp::{McpServer, PROVIDERS_URI, USAGE_URI};
use crate::Result;
use super::Transport;

/// Largest accepted request body.
const MAX_BODY_BYTES: usize = 1024 * 1024;

#[derive(Clone)]
struct AppState {
    server: Arc<McpServer>,
    auth_token: Option<Arc<str>>,
}

/// HTTP transport.
pub struct HttpTransport {
    server: Arc<McpServer>,
    port: u16,
    auth_token: Option<String>,
    request_timeout: Duration,
}

impl HttpTransport {
    /// `request_timeout` bounds a whole request, body upload included.
    pub fn new(
        server: Arc<McpServer>,
        port: u16,
        auth_token: Option<String>,
        request_timeout: Duration,
    ) -> Self {
        Self {
            server,
            port,
            auth_token: auth_token.filter(|t| !t.is_empty()),
            request_timeout,
        }
    }

    pub fn router(&self) -> Router {
        let state = AppState {
            server: self.server.clone(),
            auth_token: self.auth_token.as_deref().map(Arc::from),
        };

        Router::new()
            .route("/health", get(health))
            .route("/providers", get(providers))
            .route("/usage", get(usage))
            .route("/mcp", post(mcp))
            .fallback(not_found)
            .layer(middleware::from_fn_with_state(state.clone(), require_bearer))
            .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
            .layer(TimeoutLayer::new(self.request_timeout))
            .with_state(state)
    }

    /// Serve on an already bound listener.
    pub async fn serve_on(&self, listener: TcpListener) -> Result<()> {
        axum::serve(listener, self.router()).await?;
        Ok(())
    }
}

impl Transport for HttpTransport {
    fn name(&self) -> &str {
        "http"
    }

    async fn serve(&self) -> Result<()> {
        let addr = format!("0.0.0.0:{}", self.port);
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| Error::Other(format!("Failed to start HTTP server on {}: {}", addr, e)))?;

        info!("HTTP server listening on port {}", self.port);
        info!("Health: http://localhost:{}/health", self.port);
        info!("Providers: http://localhost:{}/providers", self.port);
        info!("Usage: http://localhost:{}/usage", self.port);
        info!("MCP: POST http://localhost:{}/mcp", self.port);
        if self.auth_token.is_some() {
            info!("Auth enabled: Bearer token required");
        }

        self.serve_on(listener).await
    }
}

async fn require_bearer(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let Some(expected) = state.auth_token.as_deref() else {
        return next.run(request).await;
    };

    let authorized = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .is_some_and(|token| token.trim() == expected);

    if authorized {
        next.run(request).await
    } else {
        error_response(StatusCode::UNAUTHORIZED, "Unauthorized")
    }
}

async fn health() -> Response {
    Json(json!({ "status": "ok", "server": "ai-factory" })).into_response()
}

async fn providers(State(state): State<AppState>) -> Response {
    resource(&state.server, PROVIDERS_URI)
}

async fn usage(State(state): State<AppState>) -> Response {
    resource(&state.server, USAGE_URI)
}

/// Notifications get `204 No Content` with no body headers.
async fn mcp(State(state): State<AppState>, body: Bytes) -> Response {
    match state.server.handle_bytes(&body).await {
        Some(reply) => ([(header::CONTENT_TYPE, "application/json")], reply).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    }
}

async fn not_found() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

fn resource(server: &McpServer, uri: &str) -> Response {
    match server.resource_json(uri) {
        Some(body) => Json(body).into_response(),
        None => {
            error!("Failed to render {}", uri);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Resource unavailable")
        }
    }
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::brain::FileBrain;
    use crate::gateway::Gateway;
    use crate::providers::{FakeProvider, ProviderRegistry};
    use axum::body::Body;
    use axum::http::{HeaderMap, Method};
    use serde_json::Value;
    use std::net::SocketAddr;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;
    use tower::ServiceExt;

    fn transport(auth_token: Option<&str>, provider: FakeProvider, timeout: Duration) -> HttpTransport {
        let mut registry = ProviderRegistry::new();
        registry.register(provider);
        let server = McpServer::new(Arc::new(Gateway::new(
            registry,
            Box::new(FileBrain::disabled()),
            None,
        )));
        HttpTransport::new(Arc::new(server), 0, auth_token.map(str::to_string), timeout)
    }

    fn app(auth_token: Option<&str>) -> Router {
        transport(
            auth_token,
            FakeProvider::new("fake", vec!["from http"]),
            Duration::from_secs(5),
        )
        .router()
    }

    async fn send(
        app: Router,
        method: Method,
        uri: &str,
        auth: Option<&str>,
        body: impl Into<Body>,
    ) -> (StatusCode, HeaderMap, Vec<u8>) {
        let mut builder = axum::http::Request::builder().method(method).uri(uri);
        if let Some(token) = auth {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let response = app.oneshot(builder.body(body.into()).unwrap()).await.unwrap();

        let status = response.status();
        let headers = response.headers().clone();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, headers, body.to_vec())
    }

    fn json_body(body: &[u8]) -> Value {
        serde_json::from_slice(body).unwrap()
    }

    async fn spawn_server(transport: HttpTransport) -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { transport.serve_on(listener).await });
        addr
    }

    /// Write a raw request on a fresh connection and read until the server closes.
    async fn raw_exchange(addr: SocketAddr, request: &[u8]) -> String {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream.write_all(request).await.unwrap();
        let mut reply = Vec::new();
        stream.read_to_end(&mut reply).await.unwrap();
        String::from_utf8_lossy(&reply).into_owned()
    }

    fn reply_json(reply: &str) -> Value {
        let (_, body) = reply.split_once("\r\n\r\n").unwrap();
        serde_json::from_str(body).unwrap()
    }

    #[tokio::test]
    async fn test_auth_required_when_configured() {
        let (status, _, body) = send(app(Some("secret")), Method::GET, "/health", None, "").await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json_body(&body), json!({"error": "Unauthorized"}));

        let (status, _, _) = send(app(Some("secret")), Method::GET, "/health", Some("nope"), "").await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _, body) =
            send(app(Some("secret")), Method::GET, "/health", Some("secret"), "").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json_body(&body)["status"], "ok");

        let (status, _, _) = send(app(None), Method::GET, "/health", None, "").await;
        assert_eq!(status, StatusCode::OK);

        // An empty token turns auth off
        let (status, _, _) = send(app(Some("")), Method::GET, "/usage", None, "").await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_status_routes() {
        let (_, _, body) = send(app(None), Method::GET, "/providers", None, "").await;
        assert_eq!(json_body(&body)[0]["name"], "fake");

        let (_, _, body) = send(app(None), Method::GET, "/usage", None, "").await;
        assert_eq!(json_body(&body)["totalRequests"], 0);

        let (status, _, body) = send(app(None), Method::GET, "/nope", None, "").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json_body(&body), json!({"error": "Not found"}));

        let (status, _, _) = send(app(None), Method::GET, "/mcp", None, "").await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_mcp_route() {
        let app = app(None);
        let call = r#"{"jsonrpc":"2.0","id":"a","method":"tools/call","params":{"name":"ai_chat","arguments":{"provider":"fake","prompt":"hi"}}}"#;

        let (status, headers, body) = send(app.clone(), Method::POST, "/mcp", None, call).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers[header::CONTENT_TYPE], "application/json");
        let body = json_body(&body);
        assert_eq!(body["id"], "a");
        assert_eq!(body["result"]["content"][0]["text"], "from http");

        let (_, _, usage) = send(app.clone(), Method::GET, "/usage", None, "").await;
        assert_eq!(json_body(&usage)["totalRequests"], 1);
    }

    #[tokio::test]
    async fn test_notification_gets_bare_no_content() {
        let note = r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#;
        let (status, headers, body) = send(app(None), Method::POST, "/mcp", None, note).await;

        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(body.is_empty());
        assert!(headers.get(header::CONTENT_TYPE).is_none());
        assert!(headers.get(header::CONTENT_LENGTH).is_none());
    }

    #[tokio::test]
    async fn test_oversized_body_rejected() {
        let body = vec![b' '; MAX_BODY_BYTES + 1];
        let (status, _, _) = send(app(None), Method::POST, "/mcp", None, body).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_slow_request_times_out() {
        let slow = FakeProvider::new("fake", vec!["late"]).with_delay(Duration::from_millis(500));
        let app = transport(None, slow, Duration::from_millis(50)).router();
        let call = r#"{"jsonrpc":"2.0","id":1,"method":"tools/call","params":{"name":"ai_chat","arguments":{"provider":"fake","prompt":"hi"}}}"#;

        let (status, _, _) = send(app, Method::POST, "/mcp", None, call).await;
        assert_eq!(status, StatusCode::REQUEST_TIMEOUT);
    }

    #[tokio::test]
    async fn test_serve_over_socket() {
        let addr = spawn_server(transport(None, FakeProvider::new("fake", vec![]), Duration::from_secs(5))).await;

        let reply = raw_exchange(
            addr,
            b"GET /health HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
        )
        .await;

        assert!(reply.starts_with("HTTP/1.1 200 OK\r\n"), "{reply}");
        assert_eq!(reply_json(&reply), json!({"status": "ok", "server": "ai-factory"}));
    }

    #[tokio::test]
    async fn test_chunked_body_over_socket() {
        let addr = spawn_server(transport(None, FakeProvider::new("fake", vec![]), Duration::from_secs(5))).await;

        let ping = r#"{"jsonrpc":"2.0","id":7,"method":"ping"}"#;
        let (head, tail) = ping.split_at(10);
        let request = format!(
            "POST /mcp HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\nTransfer-Encoding: chunked\r\n\r\n{:x}\r\n{}\r\n{:x}\r\n{}\r\n0\r\n\r\n",
            head.len(),
            head,
            tail.len(),
            tail
        );

        let reply = raw_exchange(addr, request.as_bytes()).await;

        assert!(reply.starts_with("HTTP/1.1 200 OK\r\n"), "{reply}");
        assert_eq!(reply_json(&reply), json!({"jsonrpc": "2.0", "result": {}, "id": 7}));
    }

    #[tokio::test]
    async fn test_bad_content_length_does_not_stop_server() {
        let addr = spawn_server(transport(None, FakeProvider::new("fake", vec![]), Duration::from_secs(5))).await;

        let reply = raw_exchange(
            addr,
            b"POST /mcp HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\nContent-Length: 18446744073709551615\r\n\r\n{}",
        )
        .await;
        assert!(reply.starts_with("HTTP/1.1 4"), "{reply}");

        let reply = raw_exchange(
            addr,
            b"POST /mcp HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\nContent-Length: 2000000\r\n\r\n{}",
        )
        .await;
        assert!(reply.starts_with("HTTP/1.1 413"), "{reply}");

        let reply = raw_exchange(
            addr,
            b"GET /health HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
        )
        .await;
        assert!(reply.starts_with("HTTP/1.1 200 OK\r\n"), "{reply}");
    }
}
