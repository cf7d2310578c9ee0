//! Resilience patterns for provider calls
//!
//! - Retry with exponential backoff for transient failures
//! - Model fallback across a priority list

mod fallback;
mod retry;

pub use fallback::{FallbackOutcome, FallbackSequencer};
pub use retry::{RetryConfig, RetryExecutor};

use crate::config::AnalysisConfig;

impl From<&AnalysisConfig> for FallbackSequencer {
    fn from(config: &AnalysisConfig) -> Self {
        let retry = RetryExecutor::new(RetryConfig::new(config.max_attempts, config.base_delay));
        FallbackSequencer::new(config.models.clone(), retry)
    }
}
