//! Router-level tests for the research API
//!
//! Both providers are disabled so every idea comes from the static template
//! and no request leaves the process.

use std::path::Path;
use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use research_sdk::{FileConfigProvider, ResearchConfig, ResearchEngine, StaticConfigProvider};
use research_service::ResearchService;

fn offline_config(report_dir: &Path) -> ResearchConfig {
    let mut config = ResearchConfig::default();
    config.openai.enabled = false;
    config.grok.provider.enabled = false;
    config.logging.report_dir = report_dir.to_path_buf();
    config
}

fn router(config: ResearchConfig) -> Router {
    let engine = ResearchEngine::new(Arc::new(StaticConfigProvider::new(config)));
    Arc::new(ResearchService::new(engine)).create_router()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn report_files(dir: &Path) -> Vec<std::path::PathBuf> {
    match std::fs::read_dir(dir) {
        Ok(entries) => entries.map(|e| e.unwrap().path()).collect(),
        Err(_) => Vec::new(),
    }
}

#[tokio::test]
async fn test_idea_served_from_fallback_and_reported() {
    let temp = tempfile::tempdir().unwrap();
    let reports = temp.path().join("Report");
    let app = router(offline_config(&reports));

    let (status, body) = send(
        app,
        post_json(
            "/api/research/idea",
            json!({"risk": 3, "budget_sol": 0.25, "universe": ["JUP"], "provider_preference": "auto"}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);
    assert_eq!(body["source"], "fallback");
    assert_eq!(body["error"], Value::Null);
    assert_eq!(body["payload"]["risk"], 3);
    assert_eq!(body["payload"]["budget"], 0.25);
    assert_eq!(body["payload"]["ttl_minutes"], 90);
    assert!(body["payload"]["idea_id"].as_str().unwrap().starts_with("FALLBACK"));

    let files = report_files(&reports);
    assert_eq!(files.len(), 1);
    let name = files[0].file_name().unwrap().to_string_lossy().to_string();
    assert!(name.starts_with("research_") && name.ends_with(".txt"), "{}", name);
    let written: Value = serde_json::from_str(&std::fs::read_to_string(&files[0]).unwrap()).unwrap();
    assert_eq!(written["payload"], body["payload"]);
}

#[tokio::test]
async fn test_reports_can_be_disabled() {
    let temp = tempfile::tempdir().unwrap();
    let reports = temp.path().join("Report");
    let mut config = offline_config(&reports);
    config.logging.write_idea_reports = false;

    let (status, _) = send(router(config), post_json("/api/research/idea", json!({"risk": 1, "budget": 0.1}))).await;

    assert_eq!(status, StatusCode::OK);
    assert!(report_files(&reports).is_empty());
}

#[tokio::test]
async fn test_invalid_idea_is_unprocessable() {
    let temp = tempfile::tempdir().unwrap();
    let app = router(offline_config(temp.path()));

    let (status, body) = send(app, post_json("/api/research/idea", json!({"risk": 7, "budget": 0.1}))).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "validation_error");
    assert_eq!(body["code"], 422);
    assert!(!body["details"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let temp = tempfile::tempdir().unwrap();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/research/idea")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"risk\": 2,"))
        .unwrap();

    let (status, body) = send(router(offline_config(temp.path())), request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_format");
}

#[tokio::test]
async fn test_wrong_content_type() {
    let temp = tempfile::tempdir().unwrap();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/research/idea")
        .header(header::CONTENT_TYPE, "text/plain")
        .body(Body::from(json!({"risk": 2, "budget": 0.1}).to_string()))
        .unwrap();

    let (status, body) = send(router(offline_config(temp.path())), request).await;

    assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert_eq!(body["error"], "unsupported_media_type");
}

#[tokio::test]
async fn test_oversized_body_is_rejected() {
    let temp = tempfile::tempdir().unwrap();
    let constraints = "x".repeat(research_service::validation::MAX_PAYLOAD_SIZE + 1);

    let body = json!({"risk": 2, "budget": 0.1, "constraints": constraints}).to_string();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/research/idea")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::CONTENT_LENGTH, body.len())
        .body(Body::from(body))
        .unwrap();

    let response = router(offline_config(temp.path())).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn test_broken_configuration_still_answers() {
    let temp = tempfile::tempdir().unwrap();
    let config_path = temp.path().join("research.toml");
    std::fs::write(&config_path, "[providers.openai\nenabled = ").unwrap();

    let engine = ResearchEngine::new(Arc::new(FileConfigProvider::new(&config_path)));
    let app = Arc::new(ResearchService::new(engine)).create_router();

    let (status, body) = send(app, post_json("/api/research/idea", json!({"risk": 4, "budget": 1.5}))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], false);
    assert_eq!(body["source"], "fallback");
    assert!(body["error"].as_str().is_some());
    assert_eq!(body["payload"]["risk"], 4);
}

#[tokio::test]
async fn test_health() {
    let temp = tempfile::tempdir().unwrap();

    let (status, body) = send(router(offline_config(temp.path())), get("/api/research/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);
    assert_eq!(body["providers"]["openai"]["enabled"], false);
    assert_eq!(body["providers"]["grok"]["enabled"], false);
    assert_eq!(body["providers"]["openai"]["model"], "gpt-4o-mini");
    assert_eq!(body["timeout_s"], 30.0);
    assert!(body["uptime_s"].is_u64());
}

#[tokio::test]
async fn test_root_lists_endpoints() {
    let temp = tempfile::tempdir().unwrap();

    let (status, body) = send(router(offline_config(temp.path())), get("/")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["service"], "Research Service");
    let endpoints = body["endpoints"].as_array().unwrap();
    assert!(endpoints.contains(&json!("POST /api/research/idea")));
}

#[tokio::test]
async fn test_probe() {
    let temp = tempfile::tempdir().unwrap();

    let (status, body) = send(router(offline_config(temp.path())), get("/api/research/test/openai")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], false);
    assert_eq!(body["provider"], "openai");
    assert_eq!(body["error"], "OpenAI provider disabled");

    let (status, body) = send(router(offline_config(temp.path())), get("/api/research/test/claude")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn test_analyze_requires_report() {
    let temp = tempfile::tempdir().unwrap();

    let (status, body) = send(
        router(offline_config(temp.path())),
        post_json("/api/research/analyze", json!({"report": "   "})),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "validation_error");
}

#[tokio::test]
async fn test_analyze_with_disabled_grok_reports_failure() {
    let temp = tempfile::tempdir().unwrap();

    let (status, body) = send(
        router(offline_config(temp.path())),
        post_json("/api/research/analyze", json!({"report": "Buy SOL on breakout"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], false);
    assert_eq!(body["source"], "grok");
    assert!(body["error"].as_str().unwrap().contains("disabled"));
}

#[tokio::test]
async fn test_out_of_range_timeout_still_answers() {
    let temp = tempfile::tempdir().unwrap();
    let config_path = temp.path().join("research.toml");
    std::fs::write(&config_path, "[providers.openai]\ntimeout_seconds = 1e20\n").unwrap();

    let engine = ResearchEngine::new(Arc::new(FileConfigProvider::new(&config_path)));
    let app = Arc::new(ResearchService::new(engine)).create_router();

    let (status, body) = send(app, post_json("/api/research/idea", json!({"risk": 2, "budget": 0.1}))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], false);
    assert_eq!(body["source"], "fallback");
    assert!(body["error"].as_str().unwrap().contains("timeout_seconds"));
}
