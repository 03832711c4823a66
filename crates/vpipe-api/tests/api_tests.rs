//! Router-level tests with fake tools and an in-memory store.

use std::sync::Arc;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use vpipe_api::{create_router, ApiConfig, AppState};
use vpipe_media::testing::ScriptedRunner;
use vpipe_media::{FetchConfig, Fetcher};
use vpipe_pipeline::{Pipeline, PipelineConfig};
use vpipe_storage::memory::MemoryStore;
use vpipe_storage::Uploader;

struct TestApp {
    server: MockServer,
    _work: TempDir,
    store: Arc<MemoryStore>,
    runner: Arc<ScriptedRunner>,
    router: Router,
}

impl TestApp {
    async fn new() -> Self {
        let server = MockServer::start().await;

        let mut video = b"\x00\x00\x00\x18ftypisom".to_vec();
        video.resize(4096, 0);
        Mock::given(method("GET"))
            .and(path("/clip.mp4"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(video, "video/mp4"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/page.html"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw("<html>sign in</html>".repeat(300), "text/html"),
            )
            .mount(&server)
            .await;

        let work = TempDir::new().unwrap();
        let store = Arc::new(MemoryStore::default());
        let runner = Arc::new(ScriptedRunner::new());

        let config = PipelineConfig {
            work_dir: work.path().to_path_buf(),
            min_source_bytes: 1024,
            ..Default::default()
        };
        let fetcher = Fetcher::new(FetchConfig {
            timeout: Duration::from_secs(5),
            min_bytes: 1024,
            ..Default::default()
        })
        .unwrap();
        let uploader = Uploader::new(store.clone(), false, Duration::from_secs(60));
        let pipeline = Pipeline::new(config, runner.clone(), fetcher)
            .with_uploader(uploader, "VideosFinales/");

        let state = AppState::with_pipeline(ApiConfig::default(), pipeline);
        let router = create_router(state, None);

        Self {
            server,
            _work: work,
            store,
            runner,
            router,
        }
    }

    fn url(&self, name: &str) -> String {
        format!("{}/{}", self.server.uri(), name)
    }

    async fn post(&self, uri: &str, body: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }
}

#[tokio::test]
async fn test_health() {
    let app = TestApp::new().await;
    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let (status, body) = app.send(request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let app = TestApp::new().await;
    let request = Request::builder()
        .uri("/healthz")
        .header("X-Request-ID", "abc-123")
        .body(Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();

    assert_eq!(response.headers()["X-Request-ID"], "abc-123");
    assert_eq!(response.headers()["X-Content-Type-Options"], "nosniff");
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let app = TestApp::new().await;
    let (status, body) = app.post("/api/jobs", "{not json").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["ok"], false);
    assert_eq!(body["kind"], "invalid_request");
}

#[tokio::test]
async fn test_invalid_url_names_index() {
    let app = TestApp::new().await;
    let payload = json!({
        "mode": "concat",
        "sources": [app.url("clip.mp4"), "ftp://nope/clip.mp4"],
    });
    let (status, body) = app.post("/api/jobs", &payload.to_string()).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "invalid_request");
    assert!(body["detail"].as_str().unwrap().contains("sources[1]"));
    assert!(body.get("job_id").is_none());
    assert!(app.runner.calls().is_empty());
}

#[tokio::test]
async fn test_html_source_is_unprocessable() {
    let app = TestApp::new().await;
    let payload = json!({ "mode": "split", "sources": [app.url("page.html")] });
    let (status, body) = app.post("/api/jobs", &payload.to_string()).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["kind"], "invalid_content");
    assert!(body["job_id"].is_string());
    assert!(app.runner.calls().is_empty());
    assert!(app.store.is_empty());
}

#[tokio::test]
async fn test_split_job_reports_artifacts() {
    let app = TestApp::new().await;
    let payload = json!({
        "mode": "split",
        "sources": [app.url("clip.mp4")],
        "dest_prefix": "u1/",
    });
    let (status, body) = app.post("/api/jobs", &payload.to_string()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);
    assert_eq!(body["stage"], "done");
    let artifacts = body["artifacts"].as_array().unwrap();
    assert_eq!(artifacts.len(), 2);
    assert_eq!(artifacts[0]["name"], "clip_clip1.mp4");
    assert_eq!(artifacts[1]["name"], "clip_clip1.mp3");
    assert_eq!(artifacts[0]["key"], "videogeneral/u1/clip_clip1.mp4");
    assert!(artifacts[0]["public_url"].is_string());
}

#[tokio::test]
async fn test_concat_legacy_payload() {
    let app = TestApp::new().await;
    let payload = json!({
        "clips": [app.url("clip.mp4"), app.url("clip.mp4")],
        "output": "merged",
        "destPrefix": "/user42",
    });
    let (status, body) = app.post("/concat", &payload.to_string()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);
    assert_eq!(body["output_name"], "merged.mp4");
    assert_eq!(body["key"], "videogeneral/user42/merged.mp4");
    assert!(body["publicUrl"].is_string());
    assert_eq!(body["work_id"].as_str().unwrap().len(), 8);
    assert!(app.store.get("user42/merged.mp4").is_some());
}

#[tokio::test]
async fn test_concat_without_clips_is_bad_request() {
    let app = TestApp::new().await;
    let (status, body) = app.post("/concat", r#"{"output":"x.mp4"}"#).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "clips (array) required");
}

#[tokio::test]
async fn test_procesar_missing_fields() {
    let app = TestApp::new().await;
    let (status, body) = app.post("/procesar", r#"{"url_video":"https://x.example.com/a.mp4"}"#).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "invalid_request");
}

#[tokio::test]
async fn test_procesar_stores_under_user_prefix() {
    let app = TestApp::new().await;
    let payload = json!({ "url_video": app.url("clip.mp4"), "user_id": "user 7" });
    let (status, body) = app.post("/procesar", &payload.to_string()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["urls"].as_array().unwrap().len(), 2);
    assert!(app.store.get("user7/clip_clip1.mp4").is_some());
    assert!(app.store.get("user7/clip_clip1.mp3").is_some());
}
