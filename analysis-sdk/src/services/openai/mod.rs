//! OpenAI-compatible chat completion client
//!
//! Works against any endpoint exposing `POST {base_url}/chat/completions`
//! with bearer authentication: OpenAI itself, Gemini's OpenAI compatibility
//! layer, or a local proxy.

mod models;
pub use models::*;

use std::time::Duration;

use async_trait::async_trait;
use log::{debug, warn};
use reqwest::Client;

use super::common::{build_http_client, parse_error_response, UserAgent};
use super::{CompletionProvider, CompletionRequest};
use crate::config::ProviderConfig;
use crate::error::{ErrorContext, Result, ServiceError};

/// OpenAI-compatible API client
#[derive(Debug, Clone)]
pub struct OpenAIClient {
    http_client: Client,
    config: ProviderConfig,
}

impl OpenAIClient {
    /// Create a client from explicit configuration
    pub fn new(config: ProviderConfig) -> Result<Self> {
        let http_client = build_http_client(
            Some(UserAgent::with_extra("openai-compatible")),
            Some(Duration::from_secs(config.timeout_seconds)),
        )?;

        if !config.is_configured() {
            warn!("LLM API key is not configured; analysis requests will be rejected");
        }

        Ok(Self { http_client, config })
    }

    /// Create a new builder for the client
    pub fn builder() -> OpenAIClientBuilder {
        OpenAIClientBuilder::default()
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    /// Send a chat completion request
    pub async fn chat_completion(&self, request: &ChatCompletionRequest) -> Result<ChatCompletionResponse> {
        if !self.config.is_configured() {
            return Err(ServiceError::configuration("LLM API key is not configured"));
        }

        let url = format!("{}/chat/completions", self.config.base_url);
        debug!("POST {} (model {})", url, request.model);

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| ServiceError::from(e).with_context(self.error_context(&request.model)))?;

        if !response.status().is_success() {
            return Err(parse_error_response(self.error_context(&request.model), response).await);
        }

        let body = response
            .text()
            .await
            .map_err(|e| ServiceError::from(e).with_context(self.error_context(&request.model)))?;

        serde_json::from_str::<ChatCompletionResponse>(&body).map_err(|e| {
            ServiceError::malformed(format!("Unexpected completion payload: {}", e))
                .with_context(self.error_context(&request.model))
        })
    }

    fn build_request(&self, request: CompletionRequest) -> ChatCompletionRequest {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = request.system_prompt {
            messages.push(ChatMessage::system(system));
        }
        messages.push(ChatMessage::user(request.user_prompt));

        ChatCompletionRequest {
            model: request.model,
            messages,
            temperature: Some(self.config.temperature),
            top_p: Some(self.config.top_p),
            max_tokens: Some(request.max_tokens.unwrap_or(self.config.max_tokens)),
            response_format: request.json_response.then(ResponseFormat::json_object),
        }
    }

    fn error_context(&self, model: &str) -> ErrorContext {
        ErrorContext::for_service("openai").model(model)
    }
}

#[async_trait]
impl CompletionProvider for OpenAIClient {
    fn name(&self) -> &str {
        "openai"
    }

    fn is_configured(&self) -> bool {
        self.config.is_configured()
    }

    async fn complete(&self, request: CompletionRequest) -> Result<String> {
        let request = self.build_request(request);
        let response = self.chat_completion(&request).await?;

        if let Some(usage) = &response.usage {
            debug!(
                "Model {} used {} prompt + {} completion tokens",
                response.model.as_deref().unwrap_or(&request.model),
                usage.prompt_tokens,
                usage.completion_tokens
            );
        }

        response
            .first_content()
            .map(str::to_string)
            .ok_or_else(|| {
                ServiceError::malformed("No response text from AI")
                    .with_context(self.error_context(&request.model))
            })
    }
}

/// Builder for OpenAIClient
#[derive(Debug, Default)]
pub struct OpenAIClientBuilder {
    config: ProviderConfig,
}

impl OpenAIClientBuilder {
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.config.api_key = api_key.into();
        self
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.config = self.config.with_base_url(base_url);
        self
    }

    pub fn timeout(mut self, timeout_seconds: u64) -> Self {
        self.config.timeout_seconds = timeout_seconds;
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.config.temperature = temperature;
        self
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.config.max_tokens = max_tokens;
        self
    }

    pub fn build(self) -> Result<OpenAIClient> {
        OpenAIClient::new(self.config)
    }
}
