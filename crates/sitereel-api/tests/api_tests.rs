//! Router integration tests with stubbed pipeline collaborators.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;

use sitereel_api::{create_router, ApiConfig, AppState};
use sitereel_engine::{
    EngineConfig, EngineResult, Orchestrator, RendererProvider, Summarizer, SynthesisOutput,
    SynthesisParams, SynthesisService,
};
use sitereel_models::ContentBundle;
use sitereel_scrape::testing::StaticRenderer;
use sitereel_scrape::PageRenderer;

const PAGE: &str = "<html><head><title>Acme</title></head>\
    <body><h1>Widgets</h1><p>We sell widgets.</p></body></html>";

struct StaticProvider;

#[async_trait]
impl RendererProvider for StaticProvider {
    async fn create(&self) -> EngineResult<Box<dyn PageRenderer>> {
        Ok(Box::new(StaticRenderer::new(PAGE)))
    }
}

struct StubSummarizer;

#[async_trait]
impl Summarizer for StubSummarizer {
    async fn summarize(&self, _: &ContentBundle, _: usize) -> EngineResult<String> {
        Ok("a website that sells widgets".to_string())
    }
}

struct StubSynthesis;

#[async_trait]
impl SynthesisService for StubSynthesis {
    async fn synthesize(&self, _: &str, _: &SynthesisParams) -> EngineResult<SynthesisOutput> {
        Ok(SynthesisOutput::Bytes(b"video bytes".to_vec()))
    }
}

fn test_app(output_dir: &std::path::Path) -> Router {
    let engine_config = EngineConfig {
        output_dir: output_dir.to_path_buf(),
        image_dir: output_dir.join("images"),
        synthesis_retry_delay: Duration::from_millis(1),
        ..Default::default()
    };
    let orchestrator = Arc::new(Orchestrator::new(
        engine_config,
        Arc::new(StaticProvider),
        Arc::new(StubSummarizer),
        Arc::new(StubSynthesis),
    ));
    let config = ApiConfig {
        wait_budget: Duration::from_secs(5),
        wait_interval: Duration::from_millis(10),
        ..Default::default()
    };
    create_router(AppState::with_orchestrator(config, orchestrator))
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn post_json(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_health() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(dir.path());

    let response = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["status"], "ok");
}

#[tokio::test]
async fn test_async_submission_then_wait_for_completion() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(dir.path());

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/videos",
            r#"{"url": "https://acme.test"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    let body = json_body(response).await;
    assert_eq!(body["status"], "processing");
    let job_id = body["job_id"].as_str().unwrap().to_string();
    let filename = body["filename"].as_str().unwrap().to_string();
    assert!(filename.ends_with(".mp4"));

    let response = app
        .clone()
        .oneshot(get(&format!("/api/jobs/{job_id}?wait=true")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["status"], "completed");
    assert!(body.get("error").is_none());

    // The artifact is downloadable under the filename reported at submit.
    let response = app
        .oneshot(get(&format!("/api/videos/{filename}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "video/mp4"
    );
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"video bytes");
}

#[tokio::test]
async fn test_sync_submission_returns_completed_job() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(dir.path());

    let response = app
        .oneshot(post_json(
            "/api/videos",
            r#"{"url": "https://acme.test", "mode": "sync"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["status"], "completed");
}

#[tokio::test]
async fn test_invalid_url_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(dir.path());

    let response = app
        .clone()
        .oneshot(post_json("/api/videos", r#"{"url": "not a url"}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .oneshot(post_json("/api/videos", r#"{"url": "ftp://acme.test"}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_out_of_range_max_chars_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(dir.path());

    let response = app
        .oneshot(post_json(
            "/api/videos",
            r#"{"url": "https://acme.test", "max_chars": 5}"#,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_mode_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(dir.path());

    let response = app
        .oneshot(post_json(
            "/api/videos",
            r#"{"url": "https://acme.test", "mode": "later"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_job_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(dir.path());

    let response = app
        .oneshot(get("/api/jobs/no-such-job"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(json_body(response).await["detail"], "Not found: job not found");
}

#[tokio::test]
async fn test_download_rejects_traversal() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(dir.path());

    let response = app.oneshot(get("/api/videos/..")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_download_missing_artifact_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(dir.path());

    let response = app.oneshot(get("/api/videos/nope.mp4")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
