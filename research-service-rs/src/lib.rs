//! HTTP surface of the research engine
//!
//! Routes live under `/api/research/`. POST bodies must be JSON and are
//! checked against the schemas in [`validation`] before reaching the engine.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Bytes,
    extract::{Path, Request, State},
    http::{Method, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use research_sdk::{HealthReport, IdeaRequest, ResearchEngine, ServiceError};

pub mod logging;
pub mod report;
pub mod validation;

use report::ReportWriter;
use validation::{
    parse_request, payload_limit_config, validate_content_type, ValidationErrorResponse,
    ANALYZE_REQUEST_SCHEMA, IDEA_REQUEST_SCHEMA,
};

const API_PREFIX: &str = "/api/research/";

#[derive(Debug, Deserialize)]
struct AnalyzeRequest {
    report: String,
    #[serde(default)]
    instructions: Option<String>,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    #[serde(flatten)]
    health: HealthReport,
    uptime_s: u64,
}

/// Map engine errors onto HTTP responses
fn error_response(err: ServiceError) -> Response {
    let status = match err.root() {
        ServiceError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let body = ValidationErrorResponse {
        error: err.kind().to_string(),
        message: err.to_string(),
        code: status.as_u16(),
        details: None,
    };
    (status, Json(body)).into_response()
}

/// Research API service
pub struct ResearchService {
    engine: ResearchEngine,
    started: Instant,
}

impl ResearchService {
    pub fn new(engine: ResearchEngine) -> Self {
        Self {
            engine,
            started: Instant::now(),
        }
    }

    /// Create the router with all routes and middleware
    pub fn create_router(self: Arc<Self>) -> Router {
        Router::new()
            .route("/", get(Self::root_handler))
            .route("/api/research/health", get(Self::health_handler))
            .route("/api/research/idea", post(Self::idea_handler))
            .route("/api/research/test/:provider", get(Self::probe_handler))
            .route("/api/research/analyze", post(Self::analyze_handler))
            .layer(middleware::from_fn(Self::content_type_middleware))
            .layer(payload_limit_config())
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
            .with_state(self)
    }

    /// Reject API POSTs that are not JSON
    async fn content_type_middleware(request: Request, next: Next) -> Response {
        if request.method() == Method::POST && request.uri().path().starts_with(API_PREFIX) {
            if let Err(err) = validate_content_type(request.headers(), "application/json") {
                return err.to_response().into_response();
            }
        }
        next.run(request).await
    }

    async fn root_handler() -> impl IntoResponse {
        Json(serde_json::json!({
            "service": "Research Service",
            "version": env!("CARGO_PKG_VERSION"),
            "endpoints": [
                "GET /api/research/health",
                "POST /api/research/idea",
                "GET /api/research/test/{provider}",
                "POST /api/research/analyze"
            ]
        }))
    }

    async fn health_handler(State(state): State<Arc<Self>>) -> impl IntoResponse {
        Json(HealthResponse {
            health: state.engine.health(),
            uptime_s: state.started.elapsed().as_secs(),
        })
    }

    async fn idea_handler(State(state): State<Arc<Self>>, body: Bytes) -> Response {
        let request: IdeaRequest = match parse_request(&body, &IDEA_REQUEST_SCHEMA) {
            Ok(request) => request,
            Err(err) => return err.to_response().into_response(),
        };

        let snapshot = state.engine.load_config();
        let logging = snapshot.as_ref().ok().map(|config| config.logging.clone());

        let response = match state.engine.submit_with_snapshot(&request, snapshot).await {
            Ok(response) => response,
            Err(err) => return error_response(err),
        };
        info!(
            source = %response.source,
            retries = ?response.retries,
            "Idea served"
        );

        if let Some(logging) = logging.filter(|l| l.write_idea_reports && response.ok) {
            let writer = ReportWriter::new(logging.report_dir);
            match writer.write(&response, Utc::now()).await {
                Ok(path) => info!(path = %path.display(), "Idea report written"),
                Err(err) => warn!("Idea report not written: {}", err),
            }
        }

        Json(response).into_response()
    }

    async fn probe_handler(State(state): State<Arc<Self>>, Path(provider): Path<String>) -> Response {
        match state.engine.probe_provider(&provider).await {
            Ok(report) => Json(report).into_response(),
            Err(err) => error_response(err),
        }
    }

    async fn analyze_handler(State(state): State<Arc<Self>>, body: Bytes) -> Response {
        let request: AnalyzeRequest = match parse_request(&body, &ANALYZE_REQUEST_SCHEMA) {
            Ok(request) => request,
            Err(err) => return err.to_response().into_response(),
        };

        let instructions = request.instructions.as_deref().unwrap_or_default();
        match state.engine.analyze_report(&request.report, instructions).await {
            Ok(analysis) => Json(analysis).into_response(),
            Err(err) => error_response(err),
        }
    }
}
