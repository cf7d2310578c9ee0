//! Tests for backoff timing, cancellation and model fallback ordering

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use tokio::time::Instant;
    use tokio_util::sync::CancellationToken;

    use crate::error::{ErrorCategory, ServiceError};
    use crate::resilience::{FallbackOutcome, FallbackSequencer, RetryConfig, RetryExecutor};
    use crate::tests::support::{Reply, ScriptedProvider};
    use crate::services::{CompletionProvider, CompletionRequest};

    fn models(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|m| m.to_string()).collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_backoff_doubles_from_base_delay() {
        let retry = RetryExecutor::new(RetryConfig::new(3, Duration::from_millis(1000)));
        let attempts: Arc<Mutex<Vec<Instant>>> = Arc::new(Mutex::new(Vec::new()));

        let result: crate::Result<()> = retry
            .execute(&CancellationToken::new(), || {
                let attempts = Arc::clone(&attempts);
                async move {
                    attempts.lock().unwrap().push(Instant::now());
                    Err(ServiceError::overloaded("503 Service Unavailable"))
                }
            })
            .await;

        let err = result.unwrap_err();
        assert!(err.is_transient());
        assert_eq!(err.attempts(), Some(3));

        let attempts = attempts.lock().unwrap();
        assert_eq!(attempts.len(), 3, "no fourth attempt");

        let first_wait = attempts[1] - attempts[0];
        let second_wait = attempts[2] - attempts[1];
        assert!(first_wait >= Duration::from_millis(1000) && first_wait < Duration::from_millis(1010));
        assert!(second_wait >= Duration::from_millis(2000) && second_wait < Duration::from_millis(2010));
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limit_is_retried() {
        let provider = ScriptedProvider::new().script(
            "m",
            vec![Reply::Status(429), Reply::Text("ok".to_string())],
        );
        let retry = RetryExecutor::new(RetryConfig::default());

        let result = retry
            .execute(&CancellationToken::new(), || {
                provider.complete(CompletionRequest::new("m", "hi"))
            })
            .await;

        assert_eq!(result.unwrap(), "ok");
        assert_eq!(provider.calls().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_abandons_backoff_wait() {
        let retry = RetryExecutor::new(RetryConfig::new(3, Duration::from_millis(1000)));
        let cancel = CancellationToken::new();
        let started = Instant::now();

        let canceller = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(300)).await;
            canceller.cancel();
        });

        let result: crate::Result<()> = retry
            .execute(&cancel, || async { Err(ServiceError::overloaded("busy")) })
            .await;

        let err = result.unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Cancelled);
        assert_eq!(err.attempts(), Some(1));
        assert!(started.elapsed() < Duration::from_millis(1000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_sequencer_falls_through_to_third_model() {
        let provider = ScriptedProvider::new()
            .script("a", vec![Reply::Status(503)])
            .script("b", vec![Reply::Status(429)])
            .script("c", vec![Reply::Text("from c".to_string())]);
        let sequencer = FallbackSequencer::new(
            models(&["a", "b", "c"]),
            RetryExecutor::new(RetryConfig::new(1, Duration::from_millis(1000))),
        );

        let outcome = sequencer
            .execute(&CancellationToken::new(), |model| {
                provider.complete(CompletionRequest::new(model, "hi"))
            })
            .await;

        match outcome {
            FallbackOutcome::Served { model, position, value } => {
                assert_eq!(model, "c");
                assert_eq!(position, 2);
                assert_eq!(value, "from c");
            }
            other => panic!("expected a served outcome, got {:?}", other),
        }
        assert_eq!(provider.called_models(), vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_terminal_error_never_reaches_later_models() {
        let provider = ScriptedProvider::new()
            .script("a", vec![Reply::Status(401)])
            .script("b", vec![Reply::Text("from b".to_string())]);
        let sequencer = FallbackSequencer::new(models(&["a", "b", "c"]), RetryExecutor::new(RetryConfig::default()));

        let outcome = sequencer
            .execute(&CancellationToken::new(), |model| {
                provider.complete(CompletionRequest::new(model, "hi"))
            })
            .await;

        match outcome {
            FallbackOutcome::Aborted(err) => {
                assert_eq!(err.category(), ErrorCategory::InvalidCredential);
                assert_eq!(err.model(), Some("a"));
            }
            other => panic!("expected an aborted outcome, got {:?}", other),
        }
        assert_eq!(provider.called_models(), vec!["a"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhaustion_reports_last_error() {
        let provider = ScriptedProvider::new()
            .script("a", vec![Reply::Status(503)])
            .script("b", vec![Reply::Text("not json".to_string())]);
        let sequencer = FallbackSequencer::new(
            models(&["a", "b"]),
            RetryExecutor::new(RetryConfig::new(2, Duration::from_millis(1000))),
        );

        let outcome = sequencer
            .execute(&CancellationToken::new(), |model| {
                let call = provider.complete(CompletionRequest::new(model, "hi"));
                async move {
                    let text = call.await?;
                    serde_json::from_str::<serde_json::Value>(&text).map_err(ServiceError::from)
                }
            })
            .await;

        assert!(outcome.is_exhausted());
        let err = outcome.into_result().unwrap_err();
        assert_eq!(err.category(), ErrorCategory::MalformedResponse);
        assert_eq!(err.model(), Some("b"));
        // a retried twice, b's malformed reply is not retried
        assert_eq!(provider.called_models(), vec!["a", "a", "b"]);
    }

    #[tokio::test]
    async fn test_empty_model_list_is_configuration_error() {
        let sequencer = FallbackSequencer::new(Vec::new(), RetryExecutor::new(RetryConfig::default()));

        let outcome = sequencer
            .execute(&CancellationToken::new(), |_model| async { Ok::<_, ServiceError>(()) })
            .await;

        match outcome {
            FallbackOutcome::Aborted(err) => assert_eq!(err.category(), ErrorCategory::Configuration),
            other => panic!("expected an aborted outcome, got {:?}", other),
        }
    }
}
