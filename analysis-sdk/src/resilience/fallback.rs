//! Model fallback sequencing
//!
//! Runs a unit of work against each model of a priority list until one
//! succeeds. Every model gets its own [`RetryExecutor`] run. Only failures
//! that [`ServiceError::allows_fallback`] move on to the next model; anything
//! else stops the whole sequence.

use std::future::Future;

use tokio_util::sync::CancellationToken;

use super::RetryExecutor;
use crate::error::{ErrorContext, Result, ServiceError};

/// Result of a fallback sequence
#[derive(Debug)]
pub enum FallbackOutcome<T> {
    /// A model produced a value
    Served {
        model: String,
        /// Zero-based position of the model in the priority list
        position: usize,
        value: T,
    },
    /// A terminal failure stopped the sequence before the list was exhausted
    Aborted(ServiceError),
    /// Every model failed with a fallback-eligible error; holds the last one
    Exhausted(ServiceError),
}

impl<T> FallbackOutcome<T> {
    /// Converts to a standard Result, dropping which model served the value
    pub fn into_result(self) -> Result<T> {
        match self {
            FallbackOutcome::Served { value, .. } => Ok(value),
            FallbackOutcome::Aborted(err) | FallbackOutcome::Exhausted(err) => Err(err),
        }
    }

    pub fn is_exhausted(&self) -> bool {
        matches!(self, FallbackOutcome::Exhausted(_))
    }
}

/// Tries models in priority order, each wrapped in the retry policy
#[derive(Debug, Clone)]
pub struct FallbackSequencer {
    models: Vec<String>,
    retry: RetryExecutor,
}

impl FallbackSequencer {
    pub fn new(models: Vec<String>, retry: RetryExecutor) -> Self {
        Self { models, retry }
    }

    pub fn models(&self) -> &[String] {
        &self.models
    }

    /// Run `operation` against each model until one succeeds
    pub async fn execute<F, Fut, T>(&self, cancel: &CancellationToken, mut operation: F) -> FallbackOutcome<T>
    where
        F: FnMut(String) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        if self.models.is_empty() {
            return FallbackOutcome::Aborted(ServiceError::configuration(
                "No models configured for analysis",
            ));
        }

        let mut last_error = None;

        for (position, model) in self.models.iter().enumerate() {
            log::info!("Trying model {} ({}/{})", model, position + 1, self.models.len());

            match self.retry.execute(cancel, || operation(model.clone())).await {
                Ok(value) => {
                    log::info!("Model {} served the request", model);
                    return FallbackOutcome::Served {
                        model: model.clone(),
                        position,
                        value,
                    };
                }
                Err(err) => {
                    let err = err.with_context(ErrorContext::new().model(model.as_str()));
                    if !err.allows_fallback() {
                        log::error!("Model {} failed with a terminal error: {}", model, err);
                        return FallbackOutcome::Aborted(err);
                    }
                    log::warn!("Model {} failed, falling back: {}", model, err);
                    last_error = Some(err);
                }
            }
        }

        match last_error {
            Some(err) => {
                log::error!("All {} models failed", self.models.len());
                FallbackOutcome::Exhausted(err)
            }
            None => FallbackOutcome::Aborted(ServiceError::internal(
                "Fallback sequence finished without a result",
            )),
        }
    }
}
