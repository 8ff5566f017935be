//! Mock tests for the social-signal search client

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::config::TwitterConfig;
    use crate::error::ServiceError;
    use crate::providers::TwitterClient;

    fn test_config(mock_server: &MockServer) -> TwitterConfig {
        TwitterConfig {
            enabled: true,
            base_url: format!("{}/2", mock_server.uri()),
            bearer_token: Some("x-bearer".to_string()),
            ..TwitterConfig::default()
        }
    }

    #[tokio::test]
    async fn test_recent_search() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/2/tweets/search/recent"))
            .and(header("authorization", "Bearer x-bearer"))
            .and(query_param("max_results", "25"))
            .and(query_param("tweet.fields", "created_at"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [
                    {"id": "1", "text": "SOL DEX volume at ATH", "created_at": "2026-01-02T03:04:05.000Z"},
                    {"id": "2", "text": "New Solana DeFi launch"}
                ],
                "meta": {"result_count": 2, "newest_id": "1"}
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = TwitterClient::new(test_config(&mock_server)).unwrap();
        let signals = client.recent_search().await.unwrap();

        assert_eq!(signals.len(), 2);
        assert_eq!(signals[0].text, "SOL DEX volume at ATH");
        assert_eq!(signals[0].created_at.as_deref(), Some("2026-01-02T03:04:05.000Z"));
        assert_eq!(signals[1].created_at, None);
    }

    #[tokio::test]
    async fn test_small_page_is_raised_to_minimum() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(query_param("max_results", "10"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"meta": {"result_count": 0}})))
            .expect(1)
            .mount(&mock_server)
            .await;

        let mut config = test_config(&mock_server);
        config.max_results = 3;
        let signals = TwitterClient::new(config).unwrap().recent_search().await.unwrap();
        assert!(signals.is_empty());
    }

    #[tokio::test]
    async fn test_error_body_is_mapped() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429).set_body_json(json!({
                "title": "Too Many Requests",
                "detail": "Too Many Requests",
                "type": "about:blank",
                "status": 429
            })))
            .mount(&mock_server)
            .await;

        let err = TwitterClient::new(test_config(&mock_server))
            .unwrap()
            .recent_search()
            .await
            .unwrap_err();
        assert!(matches!(err.root(), ServiceError::RateLimit(_)));
        assert_eq!(err.service_name(), Some("twitter"));
    }

    #[tokio::test]
    async fn test_disabled_makes_no_call() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&mock_server)
            .await;

        let config = TwitterConfig {
            enabled: false,
            ..test_config(&mock_server)
        };
        let err = TwitterClient::new(config).unwrap().recent_search().await.unwrap_err();
        assert!(matches!(err, ServiceError::ProviderDisabled(_)));
    }
}
