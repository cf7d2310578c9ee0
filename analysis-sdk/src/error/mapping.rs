//! Error mapping for HTTP responses
//!
//! Converts provider and analysis-endpoint error responses into
//! [`ServiceError`] values the pipeline knows how to react to.

use reqwest::StatusCode;
use serde_json::Value;

use super::{ErrorContext, ServiceError};

/// Map an error response from an OpenAI-compatible chat completion API
///
/// OpenAI nests the message under `error.message`; Gemini's compatibility
/// layer may wrap the same object in a one-element array.
pub fn map_provider_error(status: StatusCode, body: &str, context: ErrorContext) -> ServiceError {
    let mut context = context.status_code(status.as_u16());
    let json = serde_json::from_str::<Value>(body).ok();
    let error = json.as_ref().map(|json| match json {
        Value::Array(items) => items.first().unwrap_or(json),
        _ => json,
    });
    let error = error.and_then(|e| e.get("error")).or(error);

    if let Some(error) = error {
        if let Some(error_type) = error.get("type").and_then(|t| t.as_str()) {
            context.add("error_type", error_type);
        }
        match error.get("code") {
            Some(Value::String(code)) => context.error_code = Some(code.clone()),
            Some(Value::Number(code)) => context.error_code = Some(code.to_string()),
            _ => {}
        }
    }

    let message = error
        .and_then(|e| match e {
            Value::String(message) => Some(message.as_str()),
            _ => e.get("message").and_then(|m| m.as_str()),
        })
        .map(str::to_string)
        .unwrap_or_else(|| summarize_body(status, body));

    classify(status, message).with_context(context)
}

/// Map an error response from the stateless analysis endpoint
///
/// The endpoint answers `{error, details}`; the status code carries the
/// category.
pub fn map_gateway_error(status: StatusCode, body: &str) -> ServiceError {
    let json = serde_json::from_str::<Value>(body).ok();
    let error = json
        .as_ref()
        .and_then(|j| j.get("error"))
        .and_then(|e| e.as_str())
        .map(str::to_string)
        .unwrap_or_else(|| summarize_body(status, body));
    let details = json
        .as_ref()
        .and_then(|j| j.get("details"))
        .and_then(|d| d.as_str());

    let message = match details {
        Some(details) => format!("{} - {}", error, details),
        None => error,
    };

    let service_error = match status.as_u16() {
        400 | 413 | 415 | 422 => ServiceError::validation(message),
        401 | 403 => ServiceError::authentication(message),
        429 => ServiceError::rate_limit(message),
        503 => ServiceError::overloaded(message),
        _ => ServiceError::upstream(format!("API Error: {}", message)),
    };

    service_error.with_context(ErrorContext::for_service("analysis_gateway").status_code(status.as_u16()))
}

fn classify(status: StatusCode, message: String) -> ServiceError {
    let lowered = message.to_lowercase();

    match status.as_u16() {
        401 | 403 => ServiceError::authentication(message),
        429 => ServiceError::rate_limit(message),
        _ if is_transient_status(status) || mentions_overload(&lowered) => {
            ServiceError::overloaded(message)
        }
        400 if lowered.contains("api key") => ServiceError::authentication(message),
        408 => ServiceError::timeout(message),
        _ => ServiceError::upstream(message),
    }
}

fn mentions_overload(message: &str) -> bool {
    message.contains("overloaded") || message.contains("high demand")
}

fn summarize_body(status: StatusCode, body: &str) -> String {
    let body = body.trim();
    if body.is_empty() {
        status.to_string()
    } else {
        format!("{}: {}", status, crate::util::truncate_string(body, 100))
    }
}

/// Helper function to classify HTTP errors by category, for logging
pub fn classify_http_error(status: StatusCode) -> &'static str {
    match status.as_u16() {
        400 => "bad_request",
        401 | 403 => "authentication",
        404 => "not_found",
        408 => "timeout",
        429 => "rate_limit",
        500..=599 => "server",
        _ => "unknown",
    }
}

/// Statuses that mean the provider is temporarily unable to serve
pub fn is_transient_status(status: StatusCode) -> bool {
    matches!(status.as_u16(), 429 | 500 | 502 | 503 | 504 | 529)
}
