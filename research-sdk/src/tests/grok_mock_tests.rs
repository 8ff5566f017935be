//! Mock tests for the Grok client
//!
//! These tests use WireMock to simulate the xAI surface. Unmatched requests
//! get WireMock's default 404, which is exactly what an unknown endpoint or
//! model looks like upstream.

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::config::{GrokConfig, ProbePolicy, ResearchConfig};
    use crate::error::ServiceError;
    use crate::model::ProviderPreference;
    use crate::normalize::IdeaDefaults;
    use crate::providers::grok::ID_PREFIX;
    use crate::providers::{GrokClient, IdeaProvider, PromptContext};
    use crate::tests::support::research_request;

    fn test_config(base_url: &str) -> GrokConfig {
        let mut config = GrokConfig::default();
        config.provider.base_url = base_url.to_string();
        config.provider.api_key = Some("xai-mock-key".to_string());
        config.provider.timeout = Duration::from_secs(5);
        config.models = vec!["grok-4".to_string()];
        config.endpoint_paths = vec!["/v1/chat/completions".to_string(), "/chat/completions".to_string()];
        config
    }

    fn create_test_client(config: GrokConfig) -> GrokClient {
        GrokClient::new(
            config,
            PromptContext::from_config(&ResearchConfig::default()),
            IdeaDefaults::new(ID_PREFIX, 90),
        )
        .expect("Failed to build Grok client")
    }

    fn completion(content: &str) -> serde_json::Value {
        json!({
            "id": "grok-mock",
            "model": "grok-4",
            "choices": [{"index": 0, "message": {"role": "assistant", "content": content}}]
        })
    }

    #[tokio::test]
    async fn test_probe_skips_not_found_candidates() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(body_partial_json(json!({"model": "grok-4"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion("{\"asset\": \"SOL\"}")))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = create_test_client(test_config(&mock_server.uri()));
        let idea = client
            .generate_idea(&research_request(ProviderPreference::Grok))
            .await
            .unwrap();

        assert!(idea.idea_id.starts_with("GROK"));
        assert_eq!(idea.risk, 2);

        // v1/grok-3, v1/grok-4, chat/grok-3, chat/grok-4
        let requests = mock_server.received_requests().await.unwrap();
        let tried: Vec<(String, String)> = requests
            .iter()
            .map(|r| {
                let body: serde_json::Value = serde_json::from_slice(&r.body).unwrap();
                (r.url.path().to_string(), body["model"].as_str().unwrap().to_string())
            })
            .collect();
        assert_eq!(
            tried,
            vec![
                ("/v1/chat/completions".to_string(), "grok-3".to_string()),
                ("/v1/chat/completions".to_string(), "grok-4".to_string()),
                ("/chat/completions".to_string(), "grok-3".to_string()),
                ("/chat/completions".to_string(), "grok-4".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_auth_error_stops_probing() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "code": "Client specified an invalid argument",
                "error": "Incorrect API key provided"
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = create_test_client(test_config(&mock_server.uri()));
        let err = client
            .generate_idea(&research_request(ProviderPreference::Grok))
            .await
            .unwrap_err();

        assert!(matches!(err.root(), ServiceError::Authentication(_)));
        assert_eq!(mock_server.received_requests().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_any_http_error_policy_keeps_probing() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
            .expect(2)
            .mount(&mock_server)
            .await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion("{\"thesis\": \"Rotation into SOL\"}")))
            .expect(1)
            .mount(&mock_server)
            .await;

        let mut config = test_config(&mock_server.uri());
        config.probe_policy = ProbePolicy::AnyHttpError;
        let client = create_test_client(config);

        let idea = client
            .generate_idea(&research_request(ProviderPreference::Grok))
            .await
            .unwrap();
        assert_eq!(idea.thesis, "Rotation into SOL");
    }

    #[tokio::test]
    async fn test_server_error_is_terminal_by_default() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = create_test_client(test_config(&mock_server.uri()));
        let err = client
            .generate_idea(&research_request(ProviderPreference::Grok))
            .await
            .unwrap_err();

        assert!(matches!(err.root(), ServiceError::Service(_)));
        assert_eq!(err.status_code(), Some(500));
    }

    #[tokio::test]
    async fn test_exhausted_candidates() {
        let mock_server = MockServer::start().await;

        let client = create_test_client(test_config(&mock_server.uri()));
        let err = client
            .generate_idea(&research_request(ProviderPreference::Grok))
            .await
            .unwrap_err();

        assert!(matches!(err.root(), ServiceError::NotFound(_)));
        assert!(!err.is_retryable());
        assert_eq!(
            err.context().and_then(|c| c.data.get("candidates_tried")).map(String::as_str),
            Some("4")
        );
        assert_eq!(mock_server.received_requests().await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_transport_failure_is_terminal() {
        let client = create_test_client(test_config("http://127.0.0.1:1"));
        let err = client
            .generate_idea(&research_request(ProviderPreference::Grok))
            .await
            .unwrap_err();

        assert!(matches!(err.root(), ServiceError::Transport(_)));
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn test_missing_key() {
        let mut config = test_config("http://127.0.0.1:1");
        config.provider.api_key = None;
        config.provider.api_key_env = vec!["RESEARCH_TEST_XAI_KEY_NEVER_SET".to_string()];
        let client = create_test_client(config);

        let err = client
            .generate_idea(&research_request(ProviderPreference::Grok))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Missing Grok API key");
    }

    #[tokio::test]
    async fn test_analyze_report() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(body_partial_json(json!({"max_tokens": 2000})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "response": "  Tighten the stop to 1%.  "
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = create_test_client(test_config(&mock_server.uri()));
        let analysis = client
            .analyze_report("Buy SOL on breakout", "")
            .await
            .unwrap();

        assert_eq!(analysis, "Tighten the stop to 1%.");

        let requests = mock_server.received_requests().await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
        let user = body["messages"][1]["content"].as_str().unwrap();
        assert!(user.contains("Improve the report."));
        assert!(user.contains("Buy SOL on breakout"));
    }
}
