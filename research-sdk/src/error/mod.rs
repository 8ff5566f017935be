//! Error handling for the research SDK
//!
//! This module provides the error taxonomy shared by every provider client:
//! - Categorizes failures (disabled, credentials, transport, parsing, capacity)
//! - Separates retryable capacity errors from terminal ones
//! - Adds rich context to errors for better debugging
//! - Provides convenient Result type alias

use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

pub mod mapping;

/// Result type for research SDK operations
pub type Result<T> = std::result::Result<T, ServiceError>;

/// Main error type for the research SDK
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Provider switched off in configuration
    #[error("{0}")]
    ProviderDisabled(String),

    /// No API key or token could be resolved
    #[error("{0}")]
    MissingCredential(String),

    /// Network or connection errors
    #[error("Transport error: {0}")]
    Transport(String),

    /// Request exceeded the provider timeout
    #[error("Timeout error: {0}")]
    Timeout(String),

    /// Reply could not be interpreted as the expected structure
    #[error("Parsing error: {0}")]
    Parsing(String),

    /// Upstream rate limiting
    #[error("Rate limit exceeded: {0}")]
    RateLimit(String),

    /// Upstream quota or credit exhaustion
    #[error("Quota exceeded: {0}")]
    QuotaExceeded(String),

    /// Authentication errors
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// Authorization errors (permission issues)
    #[error("Authorization error: {0}")]
    Authorization(String),

    /// Resource not found errors
    #[error("Not found: {0}")]
    NotFound(String),

    /// Other upstream service failures
    #[error("Service error: {0}")]
    Service(String),

    /// Request validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Unexpected or internal errors
    #[error("Internal error: {0}")]
    Internal(String),

    /// Every provider in the chain failed
    #[error("All providers exhausted: {0}")]
    AllProvidersExhausted(String),

    /// Errors with additional context
    #[error("{inner}")]
    WithContext {
        inner: Box<ServiceError>,
        context: ErrorContext,
    },
}

/// Substrings in upstream messages that indicate a capacity problem
const CAPACITY_MARKERS: [&str; 5] = ["429", "rate limit", "rate_limit", "quota", "too many requests"];

/// Check whether a message carries a rate-limit or quota marker
pub fn has_capacity_marker(message: &str) -> bool {
    let lowered = message.to_lowercase();
    CAPACITY_MARKERS.iter().any(|marker| lowered.contains(marker))
}

impl ServiceError {
    /// Create a provider disabled error
    pub fn provider_disabled(message: impl Into<String>) -> Self {
        ServiceError::ProviderDisabled(message.into())
    }

    /// Create a missing credential error
    pub fn missing_credential(message: impl Into<String>) -> Self {
        ServiceError::MissingCredential(message.into())
    }

    /// Create a transport error
    pub fn transport(message: impl Into<String>) -> Self {
        ServiceError::Transport(message.into())
    }

    /// Create a timeout error
    pub fn timeout(message: impl Into<String>) -> Self {
        ServiceError::Timeout(message.into())
    }

    /// Create a parsing error
    pub fn parsing(message: impl Into<String>) -> Self {
        ServiceError::Parsing(message.into())
    }

    /// Create a rate limit error
    pub fn rate_limit(message: impl Into<String>) -> Self {
        ServiceError::RateLimit(message.into())
    }

    /// Create a quota exceeded error
    pub fn quota_exceeded(message: impl Into<String>) -> Self {
        ServiceError::QuotaExceeded(message.into())
    }

    /// Create an authentication error
    pub fn authentication(message: impl Into<String>) -> Self {
        ServiceError::Authentication(message.into())
    }

    /// Create an authorization error
    pub fn authorization(message: impl Into<String>) -> Self {
        ServiceError::Authorization(message.into())
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        ServiceError::NotFound(message.into())
    }

    /// Create a service-specific error
    pub fn service(message: impl Into<String>) -> Self {
        ServiceError::Service(message.into())
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        ServiceError::Validation(message.into())
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        ServiceError::Configuration(message.into())
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        ServiceError::Internal(message.into())
    }

    /// Create an exhausted-chain error
    pub fn all_providers_exhausted(message: impl Into<String>) -> Self {
        ServiceError::AllProvidersExhausted(message.into())
    }

    /// Add context to an existing error
    pub fn with_context(self, context: ErrorContext) -> Self {
        ServiceError::WithContext {
            inner: Box::new(self),
            context,
        }
    }

    /// Add a single context key/value to an existing error
    pub fn with_context_value(self, key: impl Into<String>, value: impl fmt::Display) -> Self {
        match self {
            ServiceError::WithContext { inner, mut context } => {
                context.add(key, value);
                ServiceError::WithContext { inner, context }
            }
            other => {
                let mut context = ErrorContext::new();
                context.add(key, value);
                other.with_context(context)
            }
        }
    }

    /// The innermost error, with context layers removed
    pub fn root(&self) -> &ServiceError {
        match self {
            ServiceError::WithContext { inner, .. } => inner.root(),
            other => other,
        }
    }

    /// Context attached to this error, if any
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            ServiceError::WithContext { context, .. } => Some(context),
            _ => None,
        }
    }

    /// Get the error code if available
    pub fn error_code(&self) -> Option<&str> {
        self.context().and_then(|c| c.error_code.as_deref())
    }

    /// Get the service name if available
    pub fn service_name(&self) -> Option<&str> {
        self.context().map(|c| c.service.as_str())
    }

    /// Get the HTTP status code if available
    pub fn status_code(&self) -> Option<u16> {
        match self {
            ServiceError::WithContext { inner, context } => {
                context.status_code.or_else(|| inner.status_code())
            }
            _ => None,
        }
    }

    /// Short label for logs and diagnostics
    pub fn kind(&self) -> &'static str {
        match self.root() {
            ServiceError::ProviderDisabled(_) => "provider_disabled",
            ServiceError::MissingCredential(_) => "missing_credential",
            ServiceError::Transport(_) => "transport",
            ServiceError::Timeout(_) => "timeout",
            ServiceError::Parsing(_) => "parse_failure",
            ServiceError::RateLimit(_) => "rate_limited",
            ServiceError::QuotaExceeded(_) => "quota_exceeded",
            ServiceError::Authentication(_) => "authentication",
            ServiceError::Authorization(_) => "authorization",
            ServiceError::NotFound(_) => "not_found",
            ServiceError::Service(_) => "service",
            ServiceError::Validation(_) => "validation",
            ServiceError::Configuration(_) => "configuration",
            ServiceError::Internal(_) => "internal",
            ServiceError::AllProvidersExhausted(_) => "all_providers_exhausted",
            ServiceError::WithContext { .. } => "unknown",
        }
    }

    /// Check if this is a retryable error.
    ///
    /// Only capacity problems are retried. Parse, credential, transport and
    /// timeout failures stay terminal even when their text mentions a quota.
    pub fn is_retryable(&self) -> bool {
        match self {
            ServiceError::RateLimit(_) | ServiceError::QuotaExceeded(_) => true,
            ServiceError::Service(msg) | ServiceError::NotFound(msg) => has_capacity_marker(msg),
            ServiceError::WithContext { inner, context } => {
                inner.is_retryable()
                    || (context.status_code == Some(429) && inner.accepts_status_hint())
            }
            _ => false,
        }
    }

    fn accepts_status_hint(&self) -> bool {
        matches!(
            self.root(),
            ServiceError::Service(_) | ServiceError::NotFound(_) | ServiceError::Validation(_)
        )
    }
}

/// Error context information
#[derive(Debug, Clone)]
pub struct ErrorContext {
    /// Service that generated the error
    pub service: String,

    /// Time the error was recorded
    pub timestamp: Option<chrono::DateTime<chrono::Utc>>,

    /// HTTP status code if applicable
    pub status_code: Option<u16>,

    /// Service-specific error code
    pub error_code: Option<String>,

    /// Endpoint that was called
    pub endpoint: Option<String>,

    /// Additional context data
    pub data: HashMap<String, String>,
}

impl Default for ErrorContext {
    fn default() -> Self {
        Self {
            service: "unknown".to_string(),
            timestamp: Some(chrono::Utc::now()),
            status_code: None,
            error_code: None,
            endpoint: None,
            data: HashMap::new(),
        }
    }
}

impl ErrorContext {
    /// Create a new error context
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new error context for a specific service
    pub fn for_service(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            ..Self::default()
        }
    }

    /// Add an HTTP status code
    pub fn status_code(mut self, code: u16) -> Self {
        self.status_code = Some(code);
        self
    }

    /// Add an error code
    pub fn error_code(mut self, code: impl Into<String>) -> Self {
        self.error_code = Some(code.into());
        self
    }

    /// Add an endpoint
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Add a context value
    pub fn add<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: fmt::Display,
    {
        self.data.insert(key.into(), value.to_string());
    }

    /// Add a context value and return self (builder pattern)
    pub fn with<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: fmt::Display,
    {
        self.add(key, value);
        self
    }
}

/// Convert reqwest errors to ServiceError
impl From<reqwest::Error> for ServiceError {
    fn from(err: reqwest::Error) -> Self {
        let mut context = ErrorContext::for_service("http_client");
        if let Some(url) = err.url() {
            context = context.endpoint(url.as_str());
        }

        let service_error = if err.is_timeout() {
            ServiceError::timeout(format!("Request timed out: {}", err))
        } else if err.is_decode() {
            ServiceError::parsing(format!("Response decode error: {}", err))
        } else if err.is_builder() {
            ServiceError::configuration(format!("Invalid request: {}", err))
        } else {
            ServiceError::transport(err.to_string())
        };

        if let Some(status) = err.status() {
            service_error.with_context(context.status_code(status.as_u16()))
        } else {
            service_error.with_context(context)
        }
    }
}

/// Convert serde_json errors to ServiceError
impl From<serde_json::Error> for ServiceError {
    fn from(err: serde_json::Error) -> Self {
        ServiceError::parsing(format!("JSON error: {}", err))
            .with_context(ErrorContext::for_service("json"))
    }
}
