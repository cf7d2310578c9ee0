//! HTTP surface for ReLiveAI regret analysis
//!
//! Exposes the stateless analysis endpoint, the provider diagnostic, a health
//! check and a root descriptor on top of a [`RegretAnalyzer`].

use std::sync::Arc;
use std::time::Instant;

use analysis_sdk::services::gateway::{ANALYZE_PATH, TEST_CONNECTION_PATH};
use analysis_sdk::{ErrorCategory, RegretAnalyzer, ServiceError, UserFacingError};
use axum::body::Bytes;
use axum::extract::State;
use axum::http::header::{HeaderName, AUTHORIZATION, CONTENT_TYPE};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub mod validation;

use validation::{parse_analyze_request, payload_limit_config};

pub const SERVICE_NAME: &str = "analysis-gateway";

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub healthy: bool,
    pub service_name: String,
    pub uptime_seconds: i64,
    pub status: String,
}

/// Error body returned by the analysis endpoint
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    fn status_for(category: ErrorCategory) -> StatusCode {
        match category {
            ErrorCategory::InvalidInput => StatusCode::BAD_REQUEST,
            ErrorCategory::ProviderOverloaded => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<&ServiceError> for ErrorResponse {
    fn from(err: &ServiceError) -> Self {
        let user = UserFacingError::from(err);
        Self {
            error: user.message,
            details: user.details,
        }
    }
}

fn error_response(err: &ServiceError) -> Response {
    let status = ErrorResponse::status_for(err.category());
    (status, Json(ErrorResponse::from(err))).into_response()
}

/// Core gateway state
pub struct AnalysisGateway {
    analyzer: RegretAnalyzer,
    started_at: Instant,
}

impl AnalysisGateway {
    pub fn new(analyzer: RegretAnalyzer) -> Self {
        Self {
            analyzer,
            started_at: Instant::now(),
        }
    }

    /// Create the Axum router with all routes and middleware
    pub fn create_router(self: Arc<Self>) -> Router {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers([
                AUTHORIZATION,
                CONTENT_TYPE,
                HeaderName::from_static("x-client-info"),
                HeaderName::from_static("apikey"),
            ]);

        Router::new()
            .route("/", get(Self::root_handler))
            .route("/health", get(Self::health_handler))
            .route(ANALYZE_PATH, post(Self::analyze_handler))
            .route(
                TEST_CONNECTION_PATH,
                get(Self::test_connection_handler).post(Self::test_connection_handler),
            )
            .layer(payload_limit_config())
            .layer(TraceLayer::new_for_http())
            .layer(cors)
            .with_state(self)
    }

    async fn root_handler() -> impl IntoResponse {
        Json(serde_json::json!({
            "service": "ReLiveAI Analysis Gateway",
            "version": env!("CARGO_PKG_VERSION"),
            "endpoints": [
                "GET /health",
                format!("POST {}", ANALYZE_PATH),
                format!("GET|POST {}", TEST_CONNECTION_PATH),
            ]
        }))
    }

    async fn health_handler(State(state): State<Arc<Self>>) -> impl IntoResponse {
        let configured = state.analyzer.is_configured();

        Json(HealthResponse {
            healthy: true,
            service_name: SERVICE_NAME.to_string(),
            uptime_seconds: state.started_at.elapsed().as_secs() as i64,
            status: if configured { "SERVING" } else { "DEGRADED" }.to_string(),
        })
    }

    async fn analyze_handler(State(state): State<Arc<Self>>, body: Bytes) -> Response {
        let request = match parse_analyze_request(&body) {
            Ok(request) => request,
            Err(err) => {
                tracing::warn!("Rejected analyze request: {}", err);
                return err.to_response().into_response();
            }
        };

        // Dropping the handler future (client gone) cancels the upstream chain.
        let cancel = CancellationToken::new();
        let _guard = cancel.clone().drop_guard();

        let text = request.text.unwrap_or_default();
        match state.analyzer.analyze(&text, &cancel).await {
            Ok(outcome) => {
                tracing::info!(
                    label = %outcome.result.label,
                    degraded = outcome.is_degraded(),
                    "Analysis served"
                );
                (StatusCode::OK, Json(outcome.result)).into_response()
            }
            Err(err) => {
                tracing::error!(category = ?err.category(), "Analysis failed: {}", err);
                error_response(&err)
            }
        }
    }

    async fn test_connection_handler(State(state): State<Arc<Self>>) -> Response {
        let report = state.analyzer.test_connection().await;
        let status = if report.success {
            StatusCode::OK
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        (status, Json(report)).into_response()
    }
}
