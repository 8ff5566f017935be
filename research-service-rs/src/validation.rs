//! Research API input validation
//!
//! Request bodies are checked against JSON schemas before they reach the
//! engine, so handlers only ever see well-formed requests.

use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use jsonschema::{Draft, JSONSchema};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

/// Maximum request payload size (64 KiB)
pub const MAX_PAYLOAD_SIZE: usize = 64 * 1024;

lazy_static::lazy_static! {
    /// Schema for idea requests
    pub static ref IDEA_REQUEST_SCHEMA: JSONSchema = compile(json!({
        "type": "object",
        "properties": {
            "risk": {"type": "integer", "minimum": 1, "maximum": 5},
            "budget": {"type": "number", "exclusiveMinimum": 0},
            "budget_sol": {"type": "number", "exclusiveMinimum": 0},
            "universe": {
                "type": ["array", "null"],
                "items": {"type": "string", "minLength": 1, "maxLength": 32},
                "maxItems": 50
            },
            "constraints": {"type": ["string", "null"], "maxLength": 2000},
            "provider": {"enum": ["auto", "openai", "grok", null]},
            "provider_preference": {"enum": ["auto", "openai", "grok", null]}
        },
        "required": ["risk"],
        "oneOf": [
            {"required": ["budget"], "not": {"required": ["budget_sol"]}},
            {"required": ["budget_sol"], "not": {"required": ["budget"]}}
        ],
        "additionalProperties": false
    }));

    /// Schema for report analysis requests
    pub static ref ANALYZE_REQUEST_SCHEMA: JSONSchema = compile(json!({
        "type": "object",
        "required": ["report"],
        "properties": {
            "report": {"type": "string", "minLength": 1, "maxLength": 60000},
            "instructions": {"type": ["string", "null"], "maxLength": 4000}
        },
        "additionalProperties": false
    }));
}

fn compile(schema: Value) -> JSONSchema {
    JSONSchema::options()
        .with_draft(Draft::Draft7)
        .compile(&schema)
        .expect("Invalid schema")
}

/// Error response for validation failures
#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct ValidationErrorResponse {
    pub error: String,
    pub message: String,
    pub code: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<String>>,
}

/// Validation error for API requests
#[derive(Debug, thiserror::Error)]
pub enum ApiValidationError {
    #[error("Invalid request format: {0}")]
    InvalidFormat(String),

    #[error("Content type must be {0}")]
    ContentType(String),

    #[error("Schema validation failed")]
    Schema(Vec<String>),
}

impl ApiValidationError {
    fn label(&self) -> &'static str {
        match self {
            Self::InvalidFormat(_) => "invalid_format",
            Self::ContentType(_) => "unsupported_media_type",
            Self::Schema(_) => "validation_error",
        }
    }

    /// Convert to HTTP status code and error response
    pub fn to_response(&self) -> (StatusCode, Json<ValidationErrorResponse>) {
        let status = match self {
            Self::InvalidFormat(_) => StatusCode::BAD_REQUEST,
            Self::ContentType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Self::Schema(_) => StatusCode::UNPROCESSABLE_ENTITY,
        };
        let details = match self {
            Self::Schema(details) => Some(details.clone()),
            _ => None,
        };

        (
            status,
            Json(ValidationErrorResponse {
                error: self.label().to_string(),
                message: self.to_string(),
                code: status.as_u16(),
                details,
            }),
        )
    }
}

/// Validate the Content-Type header
pub fn validate_content_type(headers: &HeaderMap, expected: &str) -> Result<(), ApiValidationError> {
    let content_type = headers
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    if !content_type.starts_with(expected) {
        return Err(ApiValidationError::ContentType(format!(
            "Expected content type '{}', got '{}'",
            expected, content_type
        )));
    }

    Ok(())
}

/// Validate JSON payload against a schema
pub fn validate_json_schema(schema: &JSONSchema, json: &Value) -> Result<(), ApiValidationError> {
    if let Err(errors) = schema.validate(json) {
        let details: Vec<String> = errors
            .map(|err| {
                let at = err.instance_path.to_string();
                if at.is_empty() {
                    err.to_string()
                } else {
                    format!("{} at {}", err, at)
                }
            })
            .collect();
        return Err(ApiValidationError::Schema(details));
    }
    Ok(())
}

/// Strip surrounding whitespace and NUL bytes from every string
pub fn sanitize_json_object(value: &mut Value) {
    match value {
        Value::String(s) => {
            let cleaned = s.trim().replace('\u{0000}', "");
            if &cleaned != s {
                *s = cleaned;
            }
        }
        Value::Array(arr) => {
            for item in arr {
                sanitize_json_object(item);
            }
        }
        Value::Object(obj) => {
            for (_, val) in obj {
                sanitize_json_object(val);
            }
        }
        _ => {}
    }
}

/// Parse, sanitize and schema-check a request body, then deserialize it
pub fn parse_request<T: DeserializeOwned>(body: &[u8], schema: &JSONSchema) -> Result<T, ApiValidationError> {
    let text = std::str::from_utf8(body)
        .map_err(|_| ApiValidationError::InvalidFormat("Request body is not valid UTF-8".to_string()))?;

    let mut value: Value = serde_json::from_str(text.trim())
        .map_err(|e| ApiValidationError::InvalidFormat(format!("Invalid JSON: {}", e)))?;

    sanitize_json_object(&mut value);
    validate_json_schema(schema, &value)?;

    serde_json::from_value(value).map_err(|e| ApiValidationError::Schema(vec![e.to_string()]))
}

/// Body size limit layer
pub fn payload_limit_config() -> tower_http::limit::RequestBodyLimitLayer {
    tower_http::limit::RequestBodyLimitLayer::new(MAX_PAYLOAD_SIZE)
}
