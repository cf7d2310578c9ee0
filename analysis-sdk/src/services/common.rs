//! Common utilities for HTTP clients

use std::fmt;
use std::time::Duration;

use reqwest::{header, Client};

use crate::error::{ErrorContext, Result, ServiceError};

/// UserAgent structure for identifying the client to upstream services
#[derive(Debug, Clone)]
pub struct UserAgent {
    pub app_name: String,
    pub version: String,
    pub extra: Option<String>,
}

impl Default for UserAgent {
    fn default() -> Self {
        Self {
            app_name: "ReLiveAI".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            extra: Some("analysis-sdk".to_string()),
        }
    }
}

impl UserAgent {
    pub fn with_extra(extra: impl Into<String>) -> Self {
        Self {
            extra: Some(extra.into()),
            ..Self::default()
        }
    }
}

impl fmt::Display for UserAgent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.app_name, self.version)?;

        if let Some(ref extra) = self.extra {
            write!(f, " ({})", extra)?;
        }

        Ok(())
    }
}

/// Build a standard HTTP client with default settings
pub fn build_http_client(user_agent: Option<UserAgent>, timeout: Option<Duration>) -> Result<Client> {
    let mut headers = header::HeaderMap::new();
    let ua = user_agent.unwrap_or_default().to_string();

    headers.insert(
        header::USER_AGENT,
        header::HeaderValue::from_str(&ua)
            .map_err(|e| ServiceError::configuration(format!("Invalid user agent: {}", e)))?,
    );

    Client::builder()
        .default_headers(headers)
        .timeout(timeout.unwrap_or_else(|| Duration::from_secs(60)))
        .build()
        .map_err(|e| ServiceError::configuration(format!("Failed to build HTTP client: {}", e)))
}

/// Turn a non-success provider response into a classified error
pub async fn parse_error_response(context: ErrorContext, response: reqwest::Response) -> ServiceError {
    let status = response.status();

    let body = match response.text().await {
        Ok(body) => body,
        Err(e) => format!("Failed to read error response: {}", e),
    };

    log::debug!(
        "{} returned {} ({}): {}",
        context.service,
        status,
        crate::error::mapping::classify_http_error(status),
        crate::util::truncate_string(&crate::util::sanitize_for_logging(&body), 200)
    );

    crate::error::mapping::map_provider_error(status, &body, context)
}
