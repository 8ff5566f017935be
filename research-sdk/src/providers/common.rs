//! Common utilities for provider clients
//!
//! This module provides shared functionality for all provider clients.

use std::fmt;
use std::time::Duration;

use reqwest::{header, Client};
use serde_json::Value;

use crate::error::{ErrorContext, Result, ServiceError};

/// UserAgent structure for identifying the client to upstream services
#[derive(Debug, Clone)]
pub struct UserAgent {
    /// Application name
    pub app_name: String,

    /// Version string
    pub version: String,

    /// Optional extra info
    pub extra: Option<String>,
}

impl Default for UserAgent {
    fn default() -> Self {
        Self {
            app_name: "Phoenix-Research".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            extra: Some("research-sdk".to_string()),
        }
    }
}

impl UserAgent {
    /// Default agent tagged with the client name
    pub fn for_client(client: &str) -> Self {
        Self {
            extra: Some(client.to_string()),
            ..Self::default()
        }
    }
}

impl fmt::Display for UserAgent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.app_name, self.version)?;

        if let Some(ref extra) = self.extra {
            write!(f, " ({})", extra)?;
        }

        Ok(())
    }
}

/// Build an HTTP client with a hard request timeout
pub fn build_http_client(user_agent: Option<UserAgent>, timeout: Duration) -> Result<Client> {
    let mut headers = header::HeaderMap::new();
    let ua = user_agent.unwrap_or_default().to_string();

    headers.insert(
        header::USER_AGENT,
        header::HeaderValue::from_str(&ua)
            .map_err(|e| ServiceError::configuration(format!("Invalid user agent: {}", e)))?,
    );

    reqwest::Client::builder()
        .default_headers(headers)
        .timeout(timeout)
        .gzip(true)
        .build()
        .map_err(|e| ServiceError::configuration(format!("Failed to build HTTP client: {}", e)))
}

/// Create error context for HTTP requests
pub fn create_error_context(
    service_name: &str,
    status: Option<reqwest::StatusCode>,
) -> ErrorContext {
    let mut context = ErrorContext::for_service(service_name);

    if let Some(status_code) = status {
        context = context.status_code(status_code.as_u16());
    }

    context
}

/// Parse error response from HTTP response
pub async fn parse_error_response(service_name: &str, response: reqwest::Response) -> ServiceError {
    let status = response.status();
    let endpoint = response.url().to_string();
    let mut context = create_error_context(service_name, Some(status)).endpoint(endpoint);

    let body = match response.text().await {
        Ok(body) => body,
        Err(e) => format!("Failed to read error response: {}", e),
    };

    crate::error::mapping::map_http_error(status, &body, &mut context).with_context(context)
}

/// Join a base URL and a path without doubling slashes
pub fn join_url(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Pull the reply text out of a completion-style body.
///
/// Looks at `choices[0].message.content`, then `content`, then `response`.
pub fn extract_completion_text(body: &Value) -> Option<String> {
    body.pointer("/choices/0/message/content")
        .and_then(Value::as_str)
        .or_else(|| body.get("content").and_then(Value::as_str))
        .or_else(|| body.get("response").and_then(Value::as_str))
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_join_url() {
        assert_eq!(join_url("https://api.x.ai/", "/v1/chat/completions"), "https://api.x.ai/v1/chat/completions");
        assert_eq!(join_url("http://localhost:1234", "chat/completions"), "http://localhost:1234/chat/completions");
    }

    #[test]
    fn test_extract_completion_text() {
        let body = json!({"choices": [{"message": {"role": "assistant", "content": "{}"}}]});
        assert_eq!(extract_completion_text(&body).as_deref(), Some("{}"));

        assert_eq!(extract_completion_text(&json!({"content": "a"})).as_deref(), Some("a"));
        assert_eq!(extract_completion_text(&json!({"response": "b"})).as_deref(), Some("b"));
        assert_eq!(extract_completion_text(&json!({"other": 1})), None);
    }

    #[test]
    fn test_user_agent_display() {
        let ua = UserAgent::for_client("grok");
        assert!(ua.to_string().starts_with("Phoenix-Research/"));
        assert!(ua.to_string().ends_with("(grok)"));
    }
}
