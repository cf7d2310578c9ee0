//! Client for the stateless analysis endpoint
//!
//! Calls `POST {base}/api/v1/analyze-regret` and
//! `POST {base}/api/v1/test-connection` on a running analysis gateway.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use super::common::{build_http_client, UserAgent};
use crate::analysis::{contract, AnalysisOutcome, Analyzer, ConnectionReport, ServedBy};
use crate::error::{mapping::map_gateway_error, ErrorContext, Result, ServiceError};

pub const ANALYZE_PATH: &str = "/api/v1/analyze-regret";
pub const TEST_CONNECTION_PATH: &str = "/api/v1/test-connection";

#[derive(Debug, Serialize)]
struct AnalyzeBody<'a> {
    text: &'a str,
}

#[derive(Debug, Clone)]
pub struct GatewayClient {
    http_client: Client,
    base_url: String,
}

impl GatewayClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        url::Url::parse(&base_url).map_err(|e| {
            ServiceError::configuration(format!("Invalid gateway URL {}: {}", base_url, e))
        })?;

        let http_client = build_http_client(Some(UserAgent::with_extra("gateway-client")), Some(timeout))?;
        Ok(Self { http_client, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn request_analysis(&self, text: &str) -> Result<AnalysisOutcome> {
        let url = format!("{}{}", self.base_url, ANALYZE_PATH);
        log::debug!("POST {}", url);

        let response = self
            .http_client
            .post(&url)
            .json(&AnalyzeBody { text })
            .send()
            .await
            .map_err(|e| ServiceError::from(e).with_context(ErrorContext::for_service("analysis_gateway")))?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(map_gateway_error(status, &body));
        }

        let value: Value = serde_json::from_str(&body)
            .map_err(|e| ServiceError::malformed(format!("Invalid response from analysis service: {}", e)))?;

        if let Some(error) = value.get("error").and_then(|e| e.as_str()) {
            let details = value.get("details").and_then(|d| d.as_str());
            return Err(ServiceError::upstream(match details {
                Some(details) => format!("API Error: {} - {}", error, details),
                None => format!("API Error: {}", error),
            }));
        }

        if value.get("label").is_none() {
            return Err(ServiceError::malformed("Invalid response from analysis service"));
        }

        let result = contract::validate(value)?;
        Ok(AnalysisOutcome {
            result,
            served_by: ServedBy::Endpoint(self.base_url.clone()),
        })
    }
}

#[async_trait]
impl Analyzer for GatewayClient {
    async fn analyze(&self, text: &str, cancel: &CancellationToken) -> Result<AnalysisOutcome> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ServiceError::validation("Text input is required"));
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ServiceError::cancelled("request abandoned by caller")),
            result = self.request_analysis(text) => result,
        }
    }

    async fn test_connection(&self) -> ConnectionReport {
        let url = format!("{}{}", self.base_url, TEST_CONNECTION_PATH);

        let response = match self.http_client.post(&url).send().await {
            Ok(response) => response,
            Err(e) => return ConnectionReport::failure(format!("Gateway unreachable: {}", e)),
        };

        match response.json::<ConnectionReport>().await {
            Ok(report) => report,
            Err(e) => ConnectionReport::failure(format!("Invalid diagnostic response: {}", e)),
        }
    }
}
