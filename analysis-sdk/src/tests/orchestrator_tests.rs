//! End-to-end tests for the analysis orchestrator against a scripted provider

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use serde_json::json;
    use tokio_util::sync::CancellationToken;

    use crate::analysis::{canned, RegretAnalyzer, RegretLabel, ServedBy, EXAMPLE_NARRATIVE};
    use crate::config::AnalysisConfig;
    use crate::error::{ErrorCategory, ServiceError};
    use crate::tests::support::{fenced, job_offer_analysis, Reply, ScriptedProvider};

    fn config(models: &[&str]) -> AnalysisConfig {
        AnalysisConfig {
            models: models.iter().map(|m| m.to_string()).collect(),
            ..AnalysisConfig::default()
        }
    }

    fn analyzer(provider: &Arc<ScriptedProvider>, config: AnalysisConfig) -> RegretAnalyzer {
        RegretAnalyzer::new(provider.clone(), config)
    }

    #[tokio::test]
    async fn test_empty_input_is_rejected_before_any_call() {
        let provider = Arc::new(ScriptedProvider::new());
        let analyzer = analyzer(&provider, AnalysisConfig::default());

        for text in ["", "   ", "\n\t "] {
            let err = analyzer.analyze(text, &CancellationToken::new()).await.unwrap_err();
            assert!(matches!(err, ServiceError::Validation(_)));
            assert_eq!(err.category(), ErrorCategory::InvalidInput);
        }
        assert!(provider.calls().is_empty());
    }

    #[tokio::test]
    async fn test_missing_credential_is_rejected_before_any_call() {
        let provider = Arc::new(ScriptedProvider::unconfigured());
        let analyzer = analyzer(&provider, AnalysisConfig::default());

        let err = analyzer
            .analyze(EXAMPLE_NARRATIVE, &CancellationToken::new())
            .await
            .unwrap_err();

        assert_eq!(err.category(), ErrorCategory::Configuration);
        assert!(provider.calls().is_empty());
    }

    #[tokio::test]
    async fn test_job_offer_narrative_end_to_end() {
        let payload = job_offer_analysis();
        let provider = Arc::new(
            ScriptedProvider::new().script("gpt-4o-mini", vec![Reply::Text(fenced(&payload))]),
        );
        let analyzer = analyzer(&provider, AnalysisConfig::default());

        let outcome = analyzer
            .analyze(EXAMPLE_NARRATIVE, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(outcome.served_by, ServedBy::Model("gpt-4o-mini".to_string()));
        assert_eq!(outcome.result.label, RegretLabel::RegretByInaction);
        assert_eq!(outcome.result.intensity, 6.8);
        assert_eq!(outcome.result.affected_domain.as_deref(), Some("Career"));
        assert_eq!(outcome.result.confidence, 88.0);
        assert_eq!(outcome.result.insights.len(), 2);
        assert_eq!(
            outcome.result.threat_analysis.as_ref().map(|t| t.motivation_loss.score),
            Some(4.0)
        );

        let calls = provider.calls();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].json_response);
        assert!(calls[0].user_prompt.contains("turned down a job offer"));
        assert!(calls[0].system_prompt.as_deref().unwrap().contains("ReLiveAI"));
    }

    #[tokio::test]
    async fn test_input_is_trimmed_before_prompting() {
        let provider = Arc::new(
            ScriptedProvider::new().script("a", vec![Reply::Text(job_offer_analysis().to_string())]),
        );
        let analyzer = analyzer(&provider, config(&["a"]));

        analyzer
            .analyze("   I quit piano lessons.   \n", &CancellationToken::new())
            .await
            .unwrap();

        assert!(provider.calls()[0].user_prompt.ends_with("I quit piano lessons."));
    }

    #[tokio::test]
    async fn test_contract_violation_moves_to_next_model() {
        let mut incomplete = job_offer_analysis();
        incomplete.as_object_mut().unwrap().remove("insights");
        let provider = Arc::new(
            ScriptedProvider::new()
                .script("a", vec![Reply::Text(incomplete.to_string())])
                .script("b", vec![Reply::Text(job_offer_analysis().to_string())]),
        );
        let analyzer = analyzer(&provider, config(&["a", "b"]));

        let outcome = analyzer
            .analyze(EXAMPLE_NARRATIVE, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(outcome.served_by, ServedBy::Model("b".to_string()));
        assert_eq!(provider.called_models(), vec!["a", "b"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_all_models_overloaded_serves_canned_result_when_degrading() {
        let provider = Arc::new(
            ScriptedProvider::new()
                .script("gemini-2.5-flash", vec![Reply::Status(503)])
                .script("gemini-1.5-flash", vec![Reply::Status(503)])
                .script("gemini-pro", vec![Reply::Status(503)]),
        );
        let analyzer = analyzer(
            &provider,
            AnalysisConfig {
                graceful_degradation: true,
                ..config(&["gemini-2.5-flash", "gemini-1.5-flash", "gemini-pro"])
            },
        );

        let outcome = analyzer
            .analyze(EXAMPLE_NARRATIVE, &CancellationToken::new())
            .await
            .unwrap();

        assert!(outcome.is_degraded());
        assert_eq!(outcome.result, canned::fallback_result());
        assert_eq!(provider.calls().len(), 9);
    }

    #[tokio::test(start_paused = true)]
    async fn test_all_models_overloaded_without_degradation() {
        let provider = Arc::new(
            ScriptedProvider::new()
                .script("a", vec![Reply::Status(503)])
                .script("b", vec![Reply::Status(529)]),
        );
        let analyzer = analyzer(&provider, config(&["a", "b"]));

        let err = analyzer
            .analyze(EXAMPLE_NARRATIVE, &CancellationToken::new())
            .await
            .unwrap_err();

        assert_eq!(err.category(), ErrorCategory::ProviderOverloaded);
        assert_eq!(err.model(), Some("b"));
        assert_eq!(err.attempts(), Some(3));
        assert_eq!(provider.called_models(), vec!["a", "a", "a", "b", "b", "b"]);
    }

    #[tokio::test]
    async fn test_degradation_never_masks_terminal_errors() {
        let provider = Arc::new(
            ScriptedProvider::new()
                .script("a", vec![Reply::Status(401)])
                .script("b", vec![Reply::Text(job_offer_analysis().to_string())]),
        );
        let analyzer = analyzer(
            &provider,
            AnalysisConfig {
                graceful_degradation: true,
                ..config(&["a", "b"])
            },
        );

        let err = analyzer
            .analyze(EXAMPLE_NARRATIVE, &CancellationToken::new())
            .await
            .unwrap_err();

        assert_eq!(err.category(), ErrorCategory::InvalidCredential);
        assert_eq!(provider.called_models(), vec!["a"]);

        let err = analyzer.analyze(" ", &CancellationToken::new()).await.unwrap_err();
        assert_eq!(err.category(), ErrorCategory::InvalidInput);
    }

    #[tokio::test]
    async fn test_cancelled_request_makes_no_call() {
        let provider = Arc::new(
            ScriptedProvider::new().script("a", vec![Reply::Text(job_offer_analysis().to_string())]),
        );
        let analyzer = analyzer(&provider, config(&["a"]));
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = analyzer.analyze(EXAMPLE_NARRATIVE, &cancel).await.unwrap_err();

        assert_eq!(err.category(), ErrorCategory::Cancelled);
        assert!(provider.calls().is_empty());
    }

    #[tokio::test]
    async fn test_label_alias_and_range_violation() {
        let mut minimal = job_offer_analysis();
        minimal["label"] = json!("Minimal Regret");
        let mut out_of_range = job_offer_analysis();
        out_of_range["intensity"] = json!(11);

        let provider = Arc::new(
            ScriptedProvider::new()
                .script("a", vec![Reply::Text(out_of_range.to_string())])
                .script("b", vec![Reply::Text(minimal.to_string())]),
        );
        let analyzer = analyzer(&provider, config(&["a", "b"]));

        let outcome = analyzer
            .analyze(EXAMPLE_NARRATIVE, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(outcome.result.label, RegretLabel::NoRegret);
        assert_eq!(outcome.served_by, ServedBy::Model("b".to_string()));
    }

    #[tokio::test]
    async fn test_connection_check_uses_first_model_once() {
        let provider = Arc::new(
            ScriptedProvider::new()
                .script("a", vec![Reply::Text(" OK \n".to_string())])
                .script("b", vec![Reply::Text("OK".to_string())]),
        );
        let analyzer = analyzer(&provider, config(&["a", "b"]));

        let report = analyzer.test_connection().await;

        assert!(report.success);
        assert_eq!(report.response.as_deref(), Some("OK"));
        assert!(report.error.is_none());
        assert_eq!(provider.called_models(), vec!["a"]);
    }

    #[tokio::test]
    async fn test_connection_check_failures() {
        let unconfigured = Arc::new(ScriptedProvider::unconfigured());
        let report = analyzer(&unconfigured, AnalysisConfig::default()).test_connection().await;
        assert!(!report.success);
        assert!(report.error.unwrap().contains("not configured"));

        let overloaded = Arc::new(ScriptedProvider::new().script("a", vec![Reply::Status(503)]));
        let report = analyzer(&overloaded, config(&["a"])).test_connection().await;
        assert!(!report.success);
        assert_eq!(overloaded.calls().len(), 1, "connectivity check does not retry");
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_base_delay_comes_from_config() {
        let provider = Arc::new(ScriptedProvider::new().script(
            "a",
            vec![Reply::Status(503), Reply::Text(job_offer_analysis().to_string())],
        ));
        let analyzer = analyzer(
            &provider,
            AnalysisConfig {
                base_delay: Duration::from_millis(250),
                ..config(&["a"])
            },
        );
        let started = tokio::time::Instant::now();

        analyzer
            .analyze(EXAMPLE_NARRATIVE, &CancellationToken::new())
            .await
            .unwrap();

        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(250) && elapsed < Duration::from_millis(1000));
    }
}
