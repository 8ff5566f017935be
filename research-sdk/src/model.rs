//! Request, payload and response types

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::{ResearchPolicy, RoutingConfig};
use crate::error::{Result, ServiceError};

/// Inclusive risk scale accepted on requests
pub const RISK_RANGE: std::ops::RangeInclusive<u8> = 1..=5;

/// Which provider the caller wants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ProviderPreference {
    /// Walk every enabled provider in priority order
    #[default]
    #[serde(rename = "auto")]
    Auto,
    #[serde(rename = "openai")]
    OpenAi,
    #[serde(rename = "grok")]
    Grok,
}

impl ProviderPreference {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderPreference::Auto => "auto",
            ProviderPreference::OpenAi => "openai",
            ProviderPreference::Grok => "grok",
        }
    }

    /// Provider name for explicit preferences
    pub fn provider_name(&self) -> Option<&'static str> {
        match self {
            ProviderPreference::Auto => None,
            explicit => Some(explicit.as_str()),
        }
    }
}

impl fmt::Display for ProviderPreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderPreference {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "auto" | "" => Ok(ProviderPreference::Auto),
            "openai" => Ok(ProviderPreference::OpenAi),
            "grok" | "xai" => Ok(ProviderPreference::Grok),
            other => Err(ServiceError::configuration(format!(
                "Unknown provider preference '{}'",
                other
            ))),
        }
    }
}

/// Incoming idea request as sent by callers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdeaRequest {
    pub risk: u8,
    #[serde(alias = "budget_sol")]
    pub budget: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub universe: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraints: Option<String>,
    #[serde(default, alias = "provider_preference", skip_serializing_if = "Option::is_none")]
    pub provider: Option<ProviderPreference>,
}

impl IdeaRequest {
    pub fn new(risk: u8, budget: f64) -> Self {
        Self {
            risk,
            budget,
            universe: None,
            constraints: None,
            provider: None,
        }
    }

    pub fn with_provider(mut self, provider: ProviderPreference) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn with_universe<I, S>(mut self, universe: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.universe = Some(universe.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_constraints(mut self, constraints: impl Into<String>) -> Self {
        self.constraints = Some(constraints.into());
        self
    }

    /// Check the request invariants
    pub fn validate(&self) -> Result<()> {
        if !RISK_RANGE.contains(&self.risk) {
            return Err(ServiceError::validation(format!(
                "risk must be between {} and {}, got {}",
                RISK_RANGE.start(),
                RISK_RANGE.end(),
                self.risk
            )));
        }
        if !self.budget.is_finite() || self.budget <= 0.0 {
            return Err(ServiceError::validation(format!(
                "budget must be a positive number, got {}",
                self.budget
            )));
        }
        if let Some(universe) = &self.universe {
            if universe.iter().any(|symbol| symbol.trim().is_empty()) {
                return Err(ServiceError::validation("universe must not contain empty symbols"));
            }
        }
        Ok(())
    }

    /// Validate and fill optional fields from the policy and routing defaults
    pub fn resolve(&self, policy: &ResearchPolicy, routing: &RoutingConfig) -> Result<ResearchRequest> {
        self.validate()?;

        let universe = match &self.universe {
            Some(symbols) if !symbols.is_empty() => symbols.iter().map(|s| s.trim().to_string()).collect(),
            _ if !policy.universe.is_empty() => policy.universe.clone(),
            _ => vec!["SOL".to_string()],
        };

        let constraints = self
            .constraints
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| policy.constraints.clone());

        Ok(ResearchRequest {
            risk: self.risk,
            budget: self.budget,
            universe,
            constraints,
            provider: self.provider.unwrap_or(routing.default_provider),
        })
    }
}

/// Request with every default applied; what providers receive
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResearchRequest {
    pub risk: u8,
    pub budget: f64,
    pub universe: Vec<String>,
    pub constraints: String,
    #[serde(skip)]
    pub provider: ProviderPreference,
}

impl ResearchRequest {
    /// Asset used when a reply names none
    pub fn primary_asset(&self) -> &str {
        self.universe
            .first()
            .map(String::as_str)
            .filter(|s| !s.is_empty())
            .unwrap_or("SOL")
    }
}

/// Normalized trade idea
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdeaPayload {
    pub idea_id: String,
    pub asset: String,
    pub thesis: String,
    pub entry_rule: String,
    pub exit_rule: String,
    pub risk: u8,
    #[serde(alias = "budget_sol")]
    pub budget: f64,
    pub ttl_minutes: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_catalyst: Option<String>,
}

/// Which tier produced a payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceTag {
    /// First-choice provider answered
    Provider(String),
    /// Named provider answered after an earlier provider failed
    ProviderFallback(String),
    /// Static template
    Fallback,
    /// Nothing produced a payload
    Error,
}

impl SourceTag {
    /// Name callers see: cascades collapse to the provider that answered
    pub fn visible_name(&self) -> String {
        match self {
            SourceTag::Provider(name) | SourceTag::ProviderFallback(name) => name.clone(),
            SourceTag::Fallback => "fallback".to_string(),
            SourceTag::Error => "error".to_string(),
        }
    }
}

impl fmt::Display for SourceTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceTag::Provider(name) => f.write_str(name),
            SourceTag::ProviderFallback(name) => write!(f, "{}-fallback", name),
            SourceTag::Fallback => f.write_str("fallback"),
            SourceTag::Error => f.write_str("error"),
        }
    }
}

/// Outcome of one orchestrated call
#[derive(Debug, Clone)]
pub struct AttemptResult {
    pub payload: Option<IdeaPayload>,
    pub source: SourceTag,
    /// Last upstream error, when the answering tier was not the first attempted
    pub error: Option<String>,
    /// Retries spent across every provider in the chain
    pub retries_used: u32,
    /// Providers that were tried, in order
    pub attempted: Vec<String>,
}

impl AttemptResult {
    pub fn exhausted(error: Option<String>, retries_used: u32, attempted: Vec<String>) -> Self {
        Self {
            payload: None,
            source: SourceTag::Error,
            error,
            retries_used,
            attempted,
        }
    }
}

/// One post from the social-signal search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SocialSignal {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Response of `submit_idea_request`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdeaResponse {
    pub ok: bool,
    pub source: String,
    pub timestamp: String,
    pub payload: IdeaPayload,
    pub error: Option<String>,
    pub retries: Option<u32>,
    pub duration_ms: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub twitter_signals: Option<Vec<SocialSignal>>,
}

/// Result of a single direct provider call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeReport {
    pub ok: bool,
    pub provider: String,
    pub payload: Option<IdeaPayload>,
    pub error: Option<String>,
    pub duration_ms: f64,
}

/// Result of a report analysis call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResponse {
    pub ok: bool,
    pub source: String,
    pub analysis: Option<String>,
    pub error: Option<String>,
    pub retries: u32,
}

/// Per-provider status for the health endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderHealth {
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    pub timeout_s: f64,
}

/// Configuration-level health summary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthReport {
    pub ok: bool,
    pub providers: BTreeMap<String, ProviderHealth>,
    pub timeout_s: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
