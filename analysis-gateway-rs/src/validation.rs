//! Request validation for the analysis gateway
//!
//! Bodies are decoded here rather than through axum's `Json` extractor so that
//! every malformed request, whatever its content type, gets the same `400`
//! answer shape as an empty narrative.

use axum::body::Bytes;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

/// Maximum request payload size (64 KiB)
pub const MAX_PAYLOAD_SIZE: usize = 64 * 1024;

/// Body of `POST /api/v1/analyze-regret`
#[derive(Debug, Clone, Deserialize)]
pub struct AnalyzeRequest {
    #[serde(default)]
    pub text: Option<String>,
}

/// Error response for validation failures
#[derive(Debug, Serialize)]
pub struct ValidationErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Validation error for API requests
#[derive(Debug, thiserror::Error)]
pub enum ApiValidationError {
    #[error("Invalid request format: {0}")]
    InvalidFormat(String),

    #[error("Request payload too large: {0}")]
    PayloadTooLarge(String),
}

impl ApiValidationError {
    /// Convert to HTTP status code and error response
    pub fn to_response(&self) -> (StatusCode, Json<ValidationErrorResponse>) {
        let status = match self {
            Self::InvalidFormat(_) => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
        };

        (status, Json(ValidationErrorResponse {
            error: self.to_string(),
            details: None,
        }))
    }
}

/// Decode an analyze request body
///
/// A missing or `null` `text` field decodes to `None`; the analyzer decides
/// what an empty narrative means.
pub fn parse_analyze_request(body: &Bytes) -> Result<AnalyzeRequest, ApiValidationError> {
    if body.len() > MAX_PAYLOAD_SIZE {
        return Err(ApiValidationError::PayloadTooLarge(format!(
            "Payload size ({} bytes) exceeds maximum allowed size ({} bytes)",
            body.len(),
            MAX_PAYLOAD_SIZE
        )));
    }

    serde_json::from_slice::<AnalyzeRequest>(body)
        .map_err(|e| ApiValidationError::InvalidFormat(format!("Invalid JSON: {}", e)))
}

/// Generate middleware config for payload limits
pub fn payload_limit_config() -> tower_http::limit::RequestBodyLimitLayer {
    tower_http::limit::RequestBodyLimitLayer::new(MAX_PAYLOAD_SIZE)
}
