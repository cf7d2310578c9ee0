//! Analysis request orchestration
//!
//! [`RegretAnalyzer`] composes the prompt template, the model fallback
//! sequencer, the retry policy, fence stripping and the response contract into
//! a single `analyze` call.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use super::contract::{self, AnalysisResult};
use super::{canned, prompt, Analyzer};
use crate::config::{AnalysisConfig, ProviderConfig, ServiceConfig};
use crate::error::{Result, ServiceError};
use crate::resilience::{FallbackOutcome, FallbackSequencer};
use crate::services::openai::OpenAIClient;
use crate::services::{CompletionProvider, CompletionRequest};
use crate::util::{generate_request_id, truncate_string};

/// Where a result came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", content = "id", rename_all = "snake_case")]
pub enum ServedBy {
    /// A provider model produced the result
    Model(String),
    /// The canned result, served because every model was exhausted
    Fallback,
    /// A remote analysis endpoint produced the result
    Endpoint(String),
}

/// Successful outcome of an analysis request
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisOutcome {
    pub result: AnalysisResult,
    pub served_by: ServedBy,
}

impl AnalysisOutcome {
    pub fn is_degraded(&self) -> bool {
        self.served_by == ServedBy::Fallback
    }
}

/// Result of a provider connectivity check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionReport {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
}

impl ConnectionReport {
    pub fn success(message: impl Into<String>, response: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            error: None,
            response: Some(response.into()),
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            message: None,
            error: Some(error.into()),
            response: None,
        }
    }
}

/// Runs regret analyses against a completion provider
pub struct RegretAnalyzer {
    provider: Arc<dyn CompletionProvider>,
    config: AnalysisConfig,
    sequencer: FallbackSequencer,
}

impl RegretAnalyzer {
    pub fn new(provider: Arc<dyn CompletionProvider>, config: AnalysisConfig) -> Self {
        let sequencer = FallbackSequencer::from(&config);
        Self {
            provider,
            config,
            sequencer,
        }
    }

    /// Build an analyzer backed by an OpenAI-compatible provider
    pub fn from_config(provider_config: ProviderConfig, config: AnalysisConfig) -> Result<Self> {
        config.validate()?;
        let client = OpenAIClient::new(provider_config)?;
        Ok(Self::new(Arc::new(client), config))
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn is_configured(&self) -> bool {
        self.provider.is_configured()
    }

    /// Analyze a narrative
    ///
    /// Empty input and a missing credential fail before any network call.
    /// Exhausting every model yields the canned result only when graceful
    /// degradation is enabled; other failures are always returned.
    pub async fn analyze(&self, text: &str, cancel: &CancellationToken) -> Result<AnalysisOutcome> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ServiceError::validation("Text input is required"));
        }

        if !self.provider.is_configured() {
            return Err(ServiceError::configuration(format!(
                "{} API key not configured. Please add your API key to the environment.",
                self.provider.name()
            )));
        }

        let request_id = generate_request_id();
        log::info!(
            "[{}] Analyzing regret for text: {}",
            request_id,
            truncate_string(text, 100)
        );

        let prompt = prompt::build_prompt(text);
        let provider = &self.provider;
        let outcome = self
            .sequencer
            .execute(cancel, |model| {
                let request = CompletionRequest::new(model, prompt.user.clone())
                    .system_prompt(prompt.system.clone())
                    .json_response();
                async move {
                    let raw = provider.complete(request).await?;
                    contract::parse_analysis(&raw)
                }
            })
            .await;

        match outcome {
            FallbackOutcome::Served { model, position, value } => {
                log::info!(
                    "[{}] Analysis complete: {} (model {}, priority {})",
                    request_id,
                    value.label,
                    model,
                    position + 1
                );
                Ok(AnalysisOutcome {
                    result: value,
                    served_by: ServedBy::Model(model),
                })
            }
            FallbackOutcome::Exhausted(err) if self.config.graceful_degradation => {
                log::warn!(
                    "[{}] All models failed, serving canned result: {}",
                    request_id,
                    err
                );
                Ok(AnalysisOutcome {
                    result: canned::fallback_result(),
                    served_by: ServedBy::Fallback,
                })
            }
            FallbackOutcome::Exhausted(err) | FallbackOutcome::Aborted(err) => {
                log::error!("[{}] Analysis failed: {}", request_id, err);
                Err(err)
            }
        }
    }

    /// One minimal completion against the first configured model, no retries
    pub async fn test_connection(&self) -> ConnectionReport {
        if !self.provider.is_configured() {
            return ConnectionReport::failure(format!(
                "{} API key not configured",
                self.provider.name()
            ));
        }

        let Some(model) = self.config.models.first() else {
            return ConnectionReport::failure("No models configured");
        };

        let request = CompletionRequest::new(model.as_str(), prompt::CONNECTIVITY_PROMPT).max_tokens(16);
        match self.provider.complete(request).await {
            Ok(response) => {
                log::info!("Connectivity check against {} succeeded", model);
                ConnectionReport::success(
                    format!("{} API connection working ({})", self.provider.name(), model),
                    response.trim(),
                )
            }
            Err(err) => {
                log::warn!("Connectivity check against {} failed: {}", model, err);
                ConnectionReport::failure(err.to_string())
            }
        }
    }
}

#[async_trait]
impl Analyzer for RegretAnalyzer {
    async fn analyze(&self, text: &str, cancel: &CancellationToken) -> Result<AnalysisOutcome> {
        RegretAnalyzer::analyze(self, text, cancel).await
    }

    async fn test_connection(&self) -> ConnectionReport {
        RegretAnalyzer::test_connection(self).await
    }
}
