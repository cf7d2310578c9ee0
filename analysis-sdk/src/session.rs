//! Client invocation surface
//!
//! [`AnalysisSession`] is what a front-end drives: it turns submitted text into
//! a result or a [`UserFacingError`], publishes loading state on a watch
//! channel and, after a short delay, emits a navigation event carrying the
//! result to the results view.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;

use crate::analysis::{AnalysisResult, Analyzer, ServedBy};
use crate::error::{ErrorCategory, ServiceError, UserFacingError};

/// Observable state of a session
#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    Idle,
    Loading,
    Ready(AnalysisResult),
    Failed(UserFacingError),
}

impl SessionState {
    pub fn is_loading(&self) -> bool {
        matches!(self, SessionState::Loading)
    }
}

/// Data handed to the results view
#[derive(Debug, Clone, PartialEq)]
pub struct ResultsView {
    pub result: AnalysisResult,
    pub served_by: ServedBy,
}

/// Navigation events emitted by a session
#[derive(Debug, Clone, PartialEq)]
pub enum Navigation {
    Results(ResultsView),
}

pub struct AnalysisSession {
    analyzer: Arc<dyn Analyzer>,
    navigation_delay: Duration,
    state: watch::Sender<SessionState>,
    navigation: mpsc::UnboundedSender<Navigation>,
    in_flight: Mutex<Option<CancellationToken>>,
    pending_navigation: Mutex<Option<CancellationToken>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Owns the in-flight slot for one submission
///
/// Dropping it before `settle` (the submit future was dropped) cancels the
/// analysis, frees the slot and returns the session to `Idle`.
struct InFlight<'a> {
    session: &'a AnalysisSession,
    token: CancellationToken,
    settled: bool,
}

impl InFlight<'_> {
    fn settle(&mut self) {
        self.settled = true;
        // a cancelled token was already cleared by `cancel`
        if !self.token.is_cancelled() {
            lock(&self.session.in_flight).take();
        }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if self.settled || self.token.is_cancelled() {
            return;
        }
        log::debug!("Submission dropped while in flight");
        lock(&self.session.in_flight).take();
        self.token.cancel();
        self.session.state.send_replace(SessionState::Idle);
    }
}

impl AnalysisSession {
    /// Create a session and the receiver for its navigation events
    pub fn new(
        analyzer: Arc<dyn Analyzer>,
        navigation_delay: Duration,
    ) -> (Self, mpsc::UnboundedReceiver<Navigation>) {
        let (state, _) = watch::channel(SessionState::Idle);
        let (navigation, navigation_rx) = mpsc::unbounded_channel();

        let session = Self {
            analyzer,
            navigation_delay,
            state,
            navigation,
            in_flight: Mutex::new(None),
            pending_navigation: Mutex::new(None),
        };
        (session, navigation_rx)
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn is_busy(&self) -> bool {
        lock(&self.in_flight).is_some()
    }

    /// Submit a narrative for analysis
    ///
    /// Empty text is rejected without touching the session state. A second
    /// submission while one is in flight is rejected.
    pub async fn submit(&self, text: &str) -> Result<AnalysisResult, UserFacingError> {
        if text.trim().is_empty() {
            return Err(UserFacingError::from(&ServiceError::validation("empty input")));
        }

        let mut guard = {
            let mut in_flight = lock(&self.in_flight);
            if in_flight.is_some() {
                return Err(UserFacingError::new(
                    ErrorCategory::InProgress,
                    ErrorCategory::InProgress.user_message(),
                ));
            }
            let token = CancellationToken::new();
            *in_flight = Some(token.clone());
            InFlight {
                session: self,
                token,
                settled: false,
            }
        };
        let token = guard.token.clone();

        if let Some(previous) = lock(&self.pending_navigation).take() {
            previous.cancel();
        }
        self.state.send_replace(SessionState::Loading);

        let outcome = self.analyzer.analyze(text, &token).await;
        guard.settle();

        match outcome {
            Ok(outcome) if !token.is_cancelled() => {
                self.state.send_replace(SessionState::Ready(outcome.result.clone()));
                self.schedule_navigation(ResultsView {
                    result: outcome.result.clone(),
                    served_by: outcome.served_by,
                });
                Ok(outcome.result)
            }
            Ok(_) => Err(UserFacingError::from(&ServiceError::cancelled("navigated away"))),
            Err(err) => {
                let user_error = UserFacingError::from(&err);
                if err.category() != ErrorCategory::Cancelled {
                    log::warn!("Analysis failed: {}", err);
                    self.state.send_replace(SessionState::Failed(user_error.clone()));
                }
                Err(user_error)
            }
        }
    }

    /// Abandon the in-flight analysis and any pending navigation
    pub fn cancel(&self) {
        if let Some(token) = lock(&self.in_flight).take() {
            token.cancel();
        }
        if let Some(token) = lock(&self.pending_navigation).take() {
            token.cancel();
        }
        self.state.send_replace(SessionState::Idle);
    }

    /// Run the provider connectivity check
    pub async fn test_connection(&self) -> Result<String, UserFacingError> {
        let report = self.analyzer.test_connection().await;
        if report.success {
            Ok(report
                .message
                .unwrap_or_else(|| "Connection working".to_string()))
        } else {
            Err(UserFacingError::new(
                ErrorCategory::Unknown,
                report.error.unwrap_or_else(|| "Connection test failed".to_string()),
            )
            .with_title("API Test Failed"))
        }
    }

    fn schedule_navigation(&self, view: ResultsView) {
        let token = CancellationToken::new();
        *lock(&self.pending_navigation) = Some(token.clone());

        let navigation = self.navigation.clone();
        let delay = self.navigation_delay;
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {
                    log::debug!("Results navigation cancelled");
                }
                _ = tokio::time::sleep(delay) => {
                    let _ = navigation.send(Navigation::Results(view));
                }
            }
        });
    }
}
