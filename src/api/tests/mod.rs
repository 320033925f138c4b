use super::*;
use crate::test_helpers::{StubBehavior, StubBuilder, test_config};
use axum::body::{Body, Bytes};
use axum::extract::Request;
use axum::http::{HeaderMap, Method, StatusCode, header};
use std::time::Duration;
use tempfile::{TempDir, tempdir};
use tower::ServiceExt;


const SWORD_AND_WELL: &str = "items:\n  normal: [Sword]\nlocations:\n  town: [Well]\n";

/// Router wired to a stub builder, with every path inside a temp dir
struct TestApp {
    router: Router,
    config: Arc<Config>,
    builder: StubBuilder,
    _dir: TempDir,
}

impl TestApp {
    fn new() -> Self {
        Self::with(|_, _| {}, StubBehavior::Succeed, Duration::ZERO)
    }

    fn with_behavior(behavior: StubBehavior) -> Self {
        Self::with(|_, _| {}, behavior, Duration::ZERO)
    }

    fn with_config(adjust: impl FnOnce(&mut Config, &std::path::Path)) -> Self {
        Self::with(adjust, StubBehavior::Succeed, Duration::ZERO)
    }

    fn with(
        adjust: impl FnOnce(&mut Config, &std::path::Path),
        behavior: StubBehavior,
        delay: Duration,
    ) -> Self {
        let dir = tempdir().unwrap();
        let mut config = test_config(dir.path());
        adjust(&mut config, dir.path());

        let builder = StubBuilder::new(&config.paths)
            .with_behavior(behavior)
            .with_delay(delay);
        let pipeline = Arc::new(BuildPipeline::new(
            config.paths.clone(),
            config.builder.world_name.clone(),
            Arc::new(builder.clone()),
        ));
        let config = Arc::new(config);

        Self {
            router: create_router(config.clone(), pipeline),
            config,
            builder,
            _dir: dir,
        }
    }

    async fn send(&self, request: Request) -> (StatusCode, HeaderMap, Bytes) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, headers, body)
    }

    async fn post_json(&self, json: serde_json::Value) -> (StatusCode, serde_json::Value) {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/apworld/build")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap();
        let (status, _, body) = self.send(request).await;
        (status, serde_json::from_slice(&body).unwrap())
    }

    async fn post_raw(&self, body: impl Into<Body>) -> (StatusCode, serde_json::Value) {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/apworld/build")
            .header(header::CONTENT_TYPE, "application/x-yaml")
            .body(body.into())
            .unwrap();
        let (status, _, body) = self.send(request).await;
        (status, serde_json::from_slice(&body).unwrap())
    }

    async fn get(&self, uri: &str) -> (StatusCode, HeaderMap, Bytes) {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        self.send(request).await
    }
}

#[tokio::test]
async fn unknown_route_is_json_not_found() {
    let app = TestApp::new();
    let (status, headers, body) = app.get("/nope").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json, serde_json::json!({"error": "Not found"}));
}

#[tokio::test]
async fn wrong_method_on_known_route_is_not_found() {
    let app = TestApp::new();

    let (status, _, body) = app.get("/apworld/build").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["error"], "Not found");

    let request = Request::builder()
        .method(Method::POST)
        .uri("/apworld/download")
        .body(Body::from("x"))
        .unwrap();
    let (status, _, _) = app.send(request).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn only_one_trailing_slash_is_accepted() {
    let app = TestApp::new();
    let (status, _, _) = app.get("/apworld/download//").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn options_is_a_preflight_everywhere() {
    let app = TestApp::new();
    for uri in ["/apworld/build", "/apworld/download/", "/anything"] {
        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri(uri)
            .header(header::ORIGIN, "https://example.org")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .body(Body::empty())
            .unwrap();
        let (status, headers, body) = app.send(request).await;

        assert_eq!(status, StatusCode::NO_CONTENT, "{uri}");
        assert!(body.is_empty());
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert_eq!(
            headers[header::ACCESS_CONTROL_ALLOW_METHODS],
            "POST, GET, OPTIONS"
        );
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_HEADERS], "Content-Type");
    }
    assert_eq!(app.builder.calls(), 0);
}

#[tokio::test]
async fn panic_response_carries_panic_message() {
    let response = panic_response(Box::new("boom"));
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json, serde_json::json!({"error": "boom"}));
}

#[tokio::test]
async fn server_serves_until_shutdown() {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let app = TestApp::new();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();

    let server = tokio::spawn(serve(listener, app.router.clone(), async move {
        let _ = stop_rx.await;
    }));

    let mut stream = tokio::net::TcpStream::connect(address).await.unwrap();
    stream
        .write_all(b"GET /apworld/download HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
        .await
        .unwrap();
    let mut response = String::new();
    stream.read_to_string(&mut response).await.unwrap();
    assert!(response.starts_with("HTTP/1.1 404"), "{response}");
    assert!(response.contains("Artifact not found"));

    stop_tx.send(()).unwrap();
    tokio::time::timeout(Duration::from_secs(5), server)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
}

#[tokio::test]
async fn binding_an_address_in_use_fails() {
    let taken = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let dir = tempdir().unwrap();
    let mut config = test_config(dir.path());
    config.api.bind_address = taken.local_addr().unwrap();
    let pipeline = Arc::new(BuildPipeline::new(
        config.paths.clone(),
        config.builder.world_name.clone(),
        Arc::new(StubBuilder::new(&config.paths)),
    ));

    let err = start_api_server(Arc::new(config), pipeline, std::future::pending())
        .await
        .unwrap_err();
    assert!(
        matches!(err, crate::Error::Io(ref e) if e.kind() == std::io::ErrorKind::AddrInUse),
        "{err:?}"
    );
}
