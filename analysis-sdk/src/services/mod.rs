//! Clients for the services the pipeline talks to
//!
//! - `openai`: any OpenAI-compatible chat completion provider
//! - `gateway`: the stateless analysis endpoint served by `analysis-gateway`

pub mod common;
pub mod gateway;
pub mod openai;

use async_trait::async_trait;

use crate::error::Result;

/// One chat completion call against a specific model
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub model: String,
    pub system_prompt: Option<String>,
    pub user_prompt: String,
    /// Ask the provider for a JSON object response
    pub json_response: bool,
    /// Overrides the provider's configured token limit
    pub max_tokens: Option<u32>,
}

impl CompletionRequest {
    pub fn new(model: impl Into<String>, user_prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            system_prompt: None,
            user_prompt: user_prompt.into(),
            json_response: false,
            max_tokens: None,
        }
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    pub fn json_response(mut self) -> Self {
        self.json_response = true;
        self
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// A chat completion provider
///
/// Implementations return the raw text of the first completion choice and
/// classify failures into [`crate::ServiceError`] variants.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Provider name used in logs and error context
    fn name(&self) -> &str;

    /// Whether a credential is available
    fn is_configured(&self) -> bool;

    async fn complete(&self, request: CompletionRequest) -> Result<String>;
}
