//! # Analysis SDK
//!
//! The request pipeline behind ReLiveAI's regret analysis.
//!
//! This crate provides:
//!
//! - A prompt template and typed response contract for regret analyses
//! - An OpenAI-compatible completion provider
//! - Resilience patterns (bounded exponential backoff, model fallback)
//! - An orchestrator composing the above, with optional graceful degradation
//! - A client session surface (loading state, delayed results navigation)
//! - A client for the stateless analysis endpoint
//!
//! ## Architecture
//!
//! - `RegretAnalyzer`: validates input, runs the fallback sequence and checks
//!   the response contract
//! - `FallbackSequencer`: tries models in priority order, each through a
//!   `RetryExecutor`
//! - `CompletionProvider`: one chat completion call against one model
//! - `Analyzer`: what a session drives; implemented locally and over HTTP
//! - `ServiceError`: classified errors that normalize to `UserFacingError`

pub mod analysis;
pub use analysis::{
    AnalysisOutcome, AnalysisResult, Analyzer, ConnectionReport, RegretAnalyzer, RegretLabel,
    ServedBy,
};

pub mod services;
pub use services::{gateway::GatewayClient, openai::OpenAIClient, CompletionProvider, CompletionRequest};

pub mod error;
pub use error::{ErrorCategory, ErrorContext, Result, ServiceError, UserFacingError};

pub mod resilience;
pub use resilience::{FallbackOutcome, FallbackSequencer, RetryConfig, RetryExecutor};

pub mod config;
pub use config::{AnalysisConfig, ConfigProvider, ProviderConfig, ServiceConfig};

pub mod session;
pub use session::{AnalysisSession, Navigation, ResultsView, SessionState};

pub mod util;

#[cfg(test)]
mod tests;

/// Build an analyzer from `RELIVE_*` environment variables
pub fn analyzer_from_env() -> Result<RegretAnalyzer> {
    let provider = config::default_provider();
    let provider_config = ProviderConfig::from_provider(&provider)?;
    let analysis_config = AnalysisConfig::from_provider(&provider)?;
    RegretAnalyzer::from_config(provider_config, analysis_config)
}
