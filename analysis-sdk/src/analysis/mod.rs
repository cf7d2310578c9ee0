//! Regret analysis: prompt, response contract and the request orchestrator

pub mod canned;
pub mod contract;
pub mod fence;
pub mod orchestrator;
pub mod prompt;

pub use contract::{
    parse_analysis, validate, AnalysisResult, EmotionalTone, RegretLabel, ThreatAnalysis,
    ThreatLevel, ThreatScore,
};
pub use orchestrator::{AnalysisOutcome, ConnectionReport, RegretAnalyzer, ServedBy};
pub use prompt::EXAMPLE_NARRATIVE;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::Result;

/// Anything that can turn a narrative into a validated analysis
///
/// Implemented by the in-process [`RegretAnalyzer`] and by
/// [`crate::services::gateway::GatewayClient`], which calls a remote
/// analysis endpoint.
#[async_trait]
pub trait Analyzer: Send + Sync {
    async fn analyze(&self, text: &str, cancel: &CancellationToken) -> Result<AnalysisOutcome>;

    /// Check that the underlying provider answers
    async fn test_connection(&self) -> ConnectionReport;
}
