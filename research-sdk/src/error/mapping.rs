//! Error mapping for upstream provider APIs
//!
//! Converts provider error responses into the normalized ServiceError type.
//! OpenAI and xAI share the `{"error": {"message", "type", "code"}}` envelope;
//! the X API reports `{"title", "detail"}` or `{"errors": [...]}`.

use reqwest::StatusCode;
use serde_json::Value;

use super::{has_capacity_marker, ErrorContext, ServiceError};
use crate::util::truncate_string;

/// Upper bound for raw bodies embedded into error messages
const MAX_BODY_IN_MESSAGE: usize = 200;

/// Map a chat-completions style error envelope (OpenAI, xAI)
pub fn map_completion_error(
    status: StatusCode,
    json: &Value,
    context: &mut ErrorContext,
) -> ServiceError {
    let error = json.get("error");

    // xAI sometimes sends {"error": "message"} and {"code": ..} at the top level
    let message = error
        .and_then(|e| e.get("message").and_then(Value::as_str).or_else(|| e.as_str()))
        .or_else(|| json.get("message").and_then(Value::as_str))
        .unwrap_or("Unknown provider error")
        .to_string();

    if let Some(error_type) = error.and_then(|e| e.get("type")).and_then(Value::as_str) {
        context.add("error_type", error_type);
    }

    let code = error
        .and_then(|e| e.get("code"))
        .or_else(|| json.get("code"))
        .and_then(|c| c.as_str().map(str::to_string).or_else(|| c.as_i64().map(|n| n.to_string())));
    if let Some(code) = code {
        context.error_code = Some(code);
    }

    if context.error_code.as_deref() == Some("insufficient_quota") {
        return ServiceError::quota_exceeded(message);
    }

    map_status(status, message)
}

/// Map an X (Twitter) API v2 error body
pub fn map_twitter_error(
    status: StatusCode,
    json: &Value,
    context: &mut ErrorContext,
) -> ServiceError {
    if let Some(title) = json.get("title").and_then(Value::as_str) {
        context.add("error_title", title);
    }

    let message = json
        .get("detail")
        .and_then(Value::as_str)
        .or_else(|| {
            json.get("errors")
                .and_then(Value::as_array)
                .and_then(|errors| errors.first())
                .and_then(|e| e.get("message"))
                .and_then(Value::as_str)
        })
        .unwrap_or("Unknown X API error")
        .to_string();

    map_status(status, message)
}

/// Map a generic HTTP error to a ServiceError
pub fn map_http_error(status: StatusCode, body: &str, context: &mut ErrorContext) -> ServiceError {
    if let Ok(json) = serde_json::from_str::<Value>(body) {
        return match context.service.as_str() {
            "openai" | "grok" => map_completion_error(status, &json, context),
            "twitter" => map_twitter_error(status, &json, context),
            _ => {
                let message = json
                    .get("message")
                    .or_else(|| json.get("error"))
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .unwrap_or_else(|| truncate_string(body, MAX_BODY_IN_MESSAGE));
                map_status(status, message)
            }
        };
    }

    let message = if body.trim().is_empty() {
        status.to_string()
    } else {
        format!("{}: {}", status, truncate_string(body.trim(), MAX_BODY_IN_MESSAGE))
    };

    map_status(status, message)
}

fn map_status(status: StatusCode, message: String) -> ServiceError {
    match status {
        StatusCode::TOO_MANY_REQUESTS => {
            if message.to_lowercase().contains("quota") {
                ServiceError::quota_exceeded(message)
            } else {
                ServiceError::rate_limit(message)
            }
        }
        StatusCode::PAYMENT_REQUIRED => ServiceError::quota_exceeded(message),
        StatusCode::UNAUTHORIZED => ServiceError::authentication(message),
        StatusCode::FORBIDDEN => ServiceError::authorization(message),
        StatusCode::NOT_FOUND => ServiceError::not_found(message),
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
            ServiceError::validation(message)
        }
        _ if has_capacity_marker(&message) => ServiceError::rate_limit(message),
        _ => ServiceError::service(message),
    }
}

/// Helper function to classify HTTP errors by category
pub fn classify_http_error(status: StatusCode) -> &'static str {
    match status.as_u16() {
        400 | 422 => "validation",
        401 => "authentication",
        402 => "quota",
        403 => "authorization",
        404 => "not_found",
        408 => "timeout",
        429 => "rate_limit",
        500..=599 => "server",
        _ => "unknown",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_openai_rate_limit() {
        let mut ctx = ErrorContext::for_service("openai");
        let body = json!({
            "error": {"message": "Rate limit reached", "type": "requests", "code": "rate_limit_exceeded"}
        })
        .to_string();

        let err = map_http_error(StatusCode::TOO_MANY_REQUESTS, &body, &mut ctx);
        assert!(matches!(err, ServiceError::RateLimit(_)));
        assert_eq!(ctx.error_code.as_deref(), Some("rate_limit_exceeded"));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_openai_insufficient_quota() {
        let mut ctx = ErrorContext::for_service("openai");
        let body = json!({
            "error": {"message": "You exceeded your current plan", "type": "insufficient_quota", "code": "insufficient_quota"}
        })
        .to_string();

        let err = map_http_error(StatusCode::TOO_MANY_REQUESTS, &body, &mut ctx);
        assert!(matches!(err, ServiceError::QuotaExceeded(_)));
    }

    #[test]
    fn test_grok_plain_error_string() {
        let mut ctx = ErrorContext::for_service("grok");
        let body = json!({"code": "Some requested entity was not found", "error": "Model not found"})
            .to_string();

        let err = map_http_error(StatusCode::NOT_FOUND, &body, &mut ctx);
        assert!(matches!(err, ServiceError::NotFound(ref m) if m == "Model not found"));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_auth_errors_are_terminal() {
        let mut ctx = ErrorContext::for_service("grok");
        let err = map_http_error(StatusCode::UNAUTHORIZED, "{\"error\":\"bad key\"}", &mut ctx);
        assert!(matches!(err, ServiceError::Authentication(_)));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_non_json_body() {
        let mut ctx = ErrorContext::for_service("openai");
        let err = map_http_error(StatusCode::BAD_GATEWAY, "<html>bad gateway</html>", &mut ctx);
        assert!(matches!(err, ServiceError::Service(ref m) if m.contains("502")));
    }

    #[test]
    fn test_twitter_detail() {
        let mut ctx = ErrorContext::for_service("twitter");
        let body = json!({"title": "Unauthorized", "detail": "Unauthorized", "status": 401}).to_string();
        let err = map_http_error(StatusCode::UNAUTHORIZED, &body, &mut ctx);
        assert!(matches!(err, ServiceError::Authentication(_)));
        assert_eq!(ctx.data.get("error_title").map(String::as_str), Some("Unauthorized"));
    }

    #[test]
    fn test_classify() {
        assert_eq!(classify_http_error(StatusCode::TOO_MANY_REQUESTS), "rate_limit");
        assert_eq!(classify_http_error(StatusCode::SERVICE_UNAVAILABLE), "server");
    }
}
