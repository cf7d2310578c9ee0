//! Error handling for the analysis pipeline
//!
//! Every failure in the pipeline is a [`ServiceError`]. Errors are classified by
//! how the pipeline reacts to them:
//! - transient provider failures (rate limited, overloaded) are retried
//! - malformed responses move on to the next model
//! - everything else stops the request
//!
//! Each error also normalizes to an [`ErrorCategory`] and a [`UserFacingError`]
//! that front-ends can show without further interpretation.

use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

pub mod mapping;

/// Result type for analysis operations
pub type Result<T> = std::result::Result<T, ServiceError>;

/// Main error type for the analysis pipeline
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Request input rejected before any network call
    #[error("Validation error: {0}")]
    Validation(String),

    /// Missing credential, empty model list or bad settings
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Provider rejected the credential
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// Provider rate limited the request
    #[error("Rate limit exceeded: {0}")]
    RateLimit(String),

    /// Provider is overloaded or temporarily unavailable
    #[error("Provider overloaded: {0}")]
    Overloaded(String),

    /// Provider rejected the request itself (bad request, unknown model)
    #[error("Upstream request error: {0}")]
    Upstream(String),

    /// Response text was not valid JSON or violated the result contract
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Network or connection errors
    #[error("Network error: {0}")]
    Network(String),

    /// Timeout errors
    #[error("Timeout error: {0}")]
    Timeout(String),

    /// The caller abandoned the request
    #[error("Request cancelled: {0}")]
    Cancelled(String),

    /// Unexpected or internal errors
    #[error("Internal error: {0}")]
    Internal(String),

    /// Errors with additional context
    #[error("{inner}")]
    WithContext {
        inner: Box<ServiceError>,
        context: ErrorContext,
    },
}

impl ServiceError {
    pub fn validation(message: impl Into<String>) -> Self {
        ServiceError::Validation(message.into())
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        ServiceError::Configuration(message.into())
    }

    pub fn authentication(message: impl Into<String>) -> Self {
        ServiceError::Authentication(message.into())
    }

    pub fn rate_limit(message: impl Into<String>) -> Self {
        ServiceError::RateLimit(message.into())
    }

    pub fn overloaded(message: impl Into<String>) -> Self {
        ServiceError::Overloaded(message.into())
    }

    pub fn upstream(message: impl Into<String>) -> Self {
        ServiceError::Upstream(message.into())
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        ServiceError::MalformedResponse(message.into())
    }

    pub fn network(message: impl Into<String>) -> Self {
        ServiceError::Network(message.into())
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        ServiceError::Timeout(message.into())
    }

    pub fn cancelled(message: impl Into<String>) -> Self {
        ServiceError::Cancelled(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ServiceError::Internal(message.into())
    }

    /// Add context to an existing error
    ///
    /// An error that already carries context keeps it; the new values are
    /// merged in rather than nesting a second wrapper.
    pub fn with_context(self, context: ErrorContext) -> Self {
        match self {
            ServiceError::WithContext {
                inner,
                context: mut existing,
            } => {
                existing.merge(context);
                ServiceError::WithContext {
                    inner,
                    context: existing,
                }
            }
            other => ServiceError::WithContext {
                inner: Box::new(other),
                context,
            },
        }
    }

    /// Add a single context key/value to an existing error
    pub fn with_context_value(self, key: impl Into<String>, value: impl fmt::Display) -> Self {
        let mut context = ErrorContext::new();
        context.add(key, value);
        self.with_context(context)
    }

    /// The error with any context wrappers removed
    pub fn root(&self) -> &ServiceError {
        match self {
            ServiceError::WithContext { inner, .. } => inner.root(),
            other => other,
        }
    }

    /// Context attached to this error, if any
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            ServiceError::WithContext { context, .. } => Some(context),
            _ => None,
        }
    }

    /// HTTP status code reported by the provider, if any
    pub fn status_code(&self) -> Option<u16> {
        self.context().and_then(|c| c.status_code)
    }

    /// Model that produced the error, if known
    pub fn model(&self) -> Option<&str> {
        self.context().and_then(|c| c.model.as_deref())
    }

    /// Number of attempts made before this error surfaced
    pub fn attempts(&self) -> Option<u32> {
        self.context()
            .and_then(|c| c.data.get("attempts"))
            .and_then(|v| v.parse().ok())
    }

    /// Transient failures are worth retrying against the same model
    pub fn is_transient(&self) -> bool {
        matches!(
            self.root(),
            ServiceError::RateLimit(_) | ServiceError::Overloaded(_)
        )
    }

    /// Failures after which the next model in the priority list may be tried
    pub fn allows_fallback(&self) -> bool {
        self.is_transient() || matches!(self.root(), ServiceError::MalformedResponse(_))
    }

    /// Normalized category used for user-facing messages and HTTP statuses
    pub fn category(&self) -> ErrorCategory {
        match self.root() {
            ServiceError::Validation(_) => ErrorCategory::InvalidInput,
            ServiceError::Configuration(_) => ErrorCategory::Configuration,
            ServiceError::Authentication(_) => ErrorCategory::InvalidCredential,
            ServiceError::RateLimit(_) | ServiceError::Overloaded(_) => {
                ErrorCategory::ProviderOverloaded
            }
            ServiceError::MalformedResponse(_) => ErrorCategory::MalformedResponse,
            ServiceError::Cancelled(_) => ErrorCategory::Cancelled,
            _ => ErrorCategory::Unknown,
        }
    }

    /// Message without the variant prefix, as reported by the failing layer
    pub fn detail(&self) -> &str {
        match self.root() {
            ServiceError::Validation(m)
            | ServiceError::Configuration(m)
            | ServiceError::Authentication(m)
            | ServiceError::RateLimit(m)
            | ServiceError::Overloaded(m)
            | ServiceError::Upstream(m)
            | ServiceError::MalformedResponse(m)
            | ServiceError::Network(m)
            | ServiceError::Timeout(m)
            | ServiceError::Cancelled(m)
            | ServiceError::Internal(m) => m,
            ServiceError::WithContext { .. } => "",
        }
    }
}

/// Error context information
#[derive(Debug, Clone)]
pub struct ErrorContext {
    /// Service that generated the error
    pub service: String,

    /// When the error was observed
    pub timestamp: Option<chrono::DateTime<chrono::Utc>>,

    /// Model the failing call was made against
    pub model: Option<String>,

    /// HTTP status code if applicable
    pub status_code: Option<u16>,

    /// Provider-specific error code
    pub error_code: Option<String>,

    /// Additional context data
    pub data: HashMap<String, String>,
}

impl Default for ErrorContext {
    fn default() -> Self {
        Self {
            service: "unknown".to_string(),
            timestamp: Some(chrono::Utc::now()),
            model: None,
            status_code: None,
            error_code: None,
            data: HashMap::new(),
        }
    }
}

impl ErrorContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new error context for a specific service
    pub fn for_service(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            ..Self::default()
        }
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn status_code(mut self, code: u16) -> Self {
        self.status_code = Some(code);
        self
    }

    /// Add a context value
    pub fn add<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: fmt::Display,
    {
        self.data.insert(key.into(), value.to_string());
    }

    fn merge(&mut self, other: ErrorContext) {
        if self.service == "unknown" {
            self.service = other.service;
        }
        self.model = self.model.take().or(other.model);
        self.status_code = self.status_code.or(other.status_code);
        self.error_code = self.error_code.take().or(other.error_code);
        self.data.extend(other.data);
    }
}

/// Normalized failure category shown to users
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    InvalidInput,
    Configuration,
    InvalidCredential,
    ProviderOverloaded,
    MalformedResponse,
    Cancelled,
    InProgress,
    Unknown,
}

impl ErrorCategory {
    /// Short message suitable for display
    pub fn user_message(&self) -> &'static str {
        match self {
            ErrorCategory::InvalidInput => "Text input is required",
            ErrorCategory::Configuration => {
                "The analysis service is not configured. Please check the provider API key."
            }
            ErrorCategory::InvalidCredential => {
                "Invalid API key. Please check your provider API key."
            }
            ErrorCategory::ProviderOverloaded => {
                "The AI service is currently experiencing high traffic. Please try again in a few moments."
            }
            ErrorCategory::MalformedResponse => "Failed to parse AI response. Please try again.",
            ErrorCategory::Cancelled => "The analysis was cancelled.",
            ErrorCategory::InProgress => "An analysis is already in progress.",
            ErrorCategory::Unknown => "Failed to analyze your decision. Please try again.",
        }
    }
}

/// Error ready to be shown to a user (toast title, message, optional detail)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserFacingError {
    pub category: ErrorCategory,
    pub title: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl UserFacingError {
    pub fn new(category: ErrorCategory, message: impl Into<String>) -> Self {
        Self {
            category,
            title: "Analysis Failed".to_string(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

impl fmt::Display for UserFacingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.details {
            Some(details) => write!(f, "{}: {} - {}", self.title, self.message, details),
            None => write!(f, "{}: {}", self.title, self.message),
        }
    }
}

impl From<&ServiceError> for UserFacingError {
    fn from(err: &ServiceError) -> Self {
        let category = err.category();
        let user_error = UserFacingError::new(category, category.user_message());
        match category {
            ErrorCategory::InvalidInput | ErrorCategory::Cancelled => user_error,
            _ => user_error.with_details(err.detail()),
        }
    }
}

/// Convert reqwest errors to ServiceError
impl From<reqwest::Error> for ServiceError {
    fn from(err: reqwest::Error) -> Self {
        let context = ErrorContext::for_service("http_client");

        let service_error = if err.is_timeout() {
            ServiceError::timeout(format!("Request timed out: {}", err))
        } else if err.is_connect() {
            ServiceError::network(format!("Connection error: {}", err))
        } else if err.is_decode() {
            ServiceError::malformed(format!("Response decode error: {}", err))
        } else if err.is_builder() {
            ServiceError::configuration(format!("Invalid request: {}", err))
        } else {
            ServiceError::network(format!("HTTP client error: {}", err))
        };

        match err.status() {
            Some(status) => service_error.with_context(context.status_code(status.as_u16())),
            None => service_error.with_context(context),
        }
    }
}

/// Convert serde_json errors to ServiceError
impl From<serde_json::Error> for ServiceError {
    fn from(err: serde_json::Error) -> Self {
        ServiceError::malformed(format!("JSON error: {}", err))
            .with_context(ErrorContext::for_service("json"))
    }
}
