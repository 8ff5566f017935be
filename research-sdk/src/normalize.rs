//! Reply parsing and payload normalization
//!
//! Provider replies are parsed into a JSON object and back-filled into an
//! [`IdeaPayload`]. The [`ResultNormalizer`] then applies the same rules to
//! whatever the orchestrator returned, substituting the static fallback when
//! there is no payload at all. Everything here is pure given `now`.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::config::ResearchPolicy;
use crate::error::{Result, ServiceError};
use crate::fallback;
use crate::model::{AttemptResult, IdeaPayload, ResearchRequest, SourceTag};
use crate::util::{sanitize_for_logging, truncate_string};

pub const DEFAULT_THESIS: &str = "No thesis";
pub const DEFAULT_ENTRY_RULE: &str = "Market BUY";
pub const DEFAULT_EXIT_RULE: &str = "Time exit after 60 minutes";

/// Raw reply text kept in parse errors
const MAX_RAW_IN_ERROR: usize = 500;

/// Identifier stamped with the UTC time, e.g. `IDEA20260314092653`
pub fn idea_id(prefix: &str, now: DateTime<Utc>) -> String {
    format!("{}{}", prefix, now.format("%Y%m%d%H%M%S"))
}

/// Provider-specific values used when a reply leaves fields out
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdeaDefaults {
    pub id_prefix: String,
    pub ttl_minutes: u32,
}

impl IdeaDefaults {
    pub fn new(id_prefix: impl Into<String>, ttl_minutes: u32) -> Self {
        Self {
            id_prefix: id_prefix.into(),
            ttl_minutes,
        }
    }

    pub fn from_policy(id_prefix: impl Into<String>, policy: &ResearchPolicy) -> Self {
        Self::new(id_prefix, policy.ttl_minutes_default)
    }
}

/// Interpret reply text as a single JSON object.
///
/// Surrounding whitespace and Markdown code fences are ignored.
pub fn parse_idea_object(text: &str) -> Result<Map<String, Value>> {
    let body = strip_code_fence(text.trim());

    let parse_error = |reason: String| {
        ServiceError::parsing(format!(
            "JSON parse error: {}, raw response: {}",
            reason,
            truncate_string(&sanitize_for_logging(text.trim()), MAX_RAW_IN_ERROR)
        ))
    };

    match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(parse_error(format!("expected a JSON object, got {}", json_kind(&other)))),
        Err(e) => Err(parse_error(e.to_string())),
    }
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // drop the language tag line
    let rest = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest,
    };
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn text_field(raw: &Map<String, Value>, key: &str) -> Option<String> {
    match raw.get(key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    }
}

fn positive_minutes(value: Option<&Value>) -> Option<u32> {
    let minutes = match value? {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite() && *f >= 1.0).map(|f| f.round() as u64)),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    }?;
    u32::try_from(minutes).ok().filter(|m| *m > 0)
}

/// Fill missing or blank fields; risk and budget always echo the request
pub fn backfill_idea(
    raw: &Map<String, Value>,
    request: &ResearchRequest,
    defaults: &IdeaDefaults,
    now: DateTime<Utc>,
) -> IdeaPayload {
    IdeaPayload {
        idea_id: text_field(raw, "idea_id").unwrap_or_else(|| idea_id(&defaults.id_prefix, now)),
        asset: text_field(raw, "asset").unwrap_or_else(|| request.primary_asset().to_string()),
        thesis: text_field(raw, "thesis").unwrap_or_else(|| DEFAULT_THESIS.to_string()),
        entry_rule: text_field(raw, "entry_rule").unwrap_or_else(|| DEFAULT_ENTRY_RULE.to_string()),
        exit_rule: text_field(raw, "exit_rule").unwrap_or_else(|| DEFAULT_EXIT_RULE.to_string()),
        risk: request.risk,
        budget: request.budget,
        ttl_minutes: positive_minutes(raw.get("ttl_minutes")).unwrap_or(defaults.ttl_minutes),
        expected_catalyst: text_field(raw, "expected_catalyst"),
    }
}

/// Caller-facing result of one orchestrated request
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedIdea {
    pub payload: IdeaPayload,
    pub source: String,
    pub error: Option<String>,
    pub retries: u32,
}

/// Enforces payload invariants whatever tier produced the payload
#[derive(Debug, Clone)]
pub struct ResultNormalizer {
    defaults: IdeaDefaults,
}

impl ResultNormalizer {
    pub fn new(policy: &ResearchPolicy) -> Self {
        Self {
            defaults: IdeaDefaults::from_policy("IDEA", policy),
        }
    }

    /// Turn an orchestrator result into the final payload and annotations
    pub fn finalize(
        &self,
        attempt: AttemptResult,
        request: &ResearchRequest,
        now: DateTime<Utc>,
    ) -> NormalizedIdea {
        // the error annotation only matters when a later tier answered
        let first_tier_answered = match (&attempt.payload, &attempt.source) {
            (Some(_), SourceTag::Provider(_)) => true,
            (None, _) => attempt.attempted.is_empty(),
            _ => false,
        };
        let error = if first_tier_answered { None } else { attempt.error };

        match attempt.payload {
            Some(payload) => NormalizedIdea {
                payload: self.enforce(&payload, request, now),
                source: attempt.source.visible_name(),
                error,
                retries: attempt.retries_used,
            },
            None => NormalizedIdea {
                payload: fallback::static_idea(request, now),
                source: SourceTag::Fallback.visible_name(),
                error,
                retries: attempt.retries_used,
            },
        }
    }

    /// Re-apply back-fill rules to an already typed payload
    pub fn enforce(&self, payload: &IdeaPayload, request: &ResearchRequest, now: DateTime<Utc>) -> IdeaPayload {
        match serde_json::to_value(payload) {
            Ok(Value::Object(raw)) => backfill_idea(&raw, request, &self.defaults, now),
            _ => backfill_idea(&Map::new(), request, &self.defaults, now),
        }
    }
}
