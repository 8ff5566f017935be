//! xAI Grok client
//!
//! The xAI surface has moved between paths and model names, so the client
//! walks an explicit, ordered list of (endpoint, model) candidates. A 404
//! moves on to the next candidate. Other HTTP errors stop the walk unless
//! the probe policy is `any_http_error`.

use async_trait::async_trait;
use log::{debug, info};
use reqwest::{Client, StatusCode};
use serde_json::Value;

use super::common::{build_http_client, extract_completion_text, join_url, parse_error_response, UserAgent};
use super::openai::{ChatCompletionRequest, ChatMessage};
use super::{IdeaProvider, PromptContext, SYSTEM_PROMPT};
use crate::config::{GrokConfig, ProbePolicy, ProviderConfig, ResearchConfig};
use crate::error::mapping::classify_http_error;
use crate::error::{ErrorContext, Result, ServiceError};
use crate::model::{IdeaPayload, ResearchRequest};
use crate::normalize::{backfill_idea, parse_idea_object, IdeaDefaults};

/// Prefix of generated Grok idea identifiers
pub const ID_PREFIX: &str = "GROK";

const ANALYST_PROMPT: &str = "You are a senior trading research analyst. \
Review the report you are given, point out weak assumptions and missing risks, \
and return an improved version of the report. Keep it concise and factual.";

/// One endpoint/model combination
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeCandidate {
    pub endpoint: String,
    pub model: String,
}

/// Candidates in priority order: endpoint-major, configured model first
pub fn probe_candidates(config: &GrokConfig) -> Vec<ProbeCandidate> {
    let mut models: Vec<&str> = Vec::new();
    for model in std::iter::once(config.provider.model.as_str()).chain(config.models.iter().map(String::as_str)) {
        let model = model.trim();
        if !model.is_empty() && !models.contains(&model) {
            models.push(model);
        }
    }

    let mut endpoints: Vec<String> = Vec::new();
    for path in &config.endpoint_paths {
        let endpoint = join_url(&config.provider.base_url, path);
        if !endpoints.contains(&endpoint) {
            endpoints.push(endpoint);
        }
    }

    endpoints
        .iter()
        .flat_map(|endpoint| {
            models.iter().map(move |model| ProbeCandidate {
                endpoint: endpoint.clone(),
                model: model.to_string(),
            })
        })
        .collect()
}

/// Grok API client
pub struct GrokClient {
    http_client: Client,
    config: GrokConfig,
    prompt: PromptContext,
    defaults: IdeaDefaults,
}

impl GrokClient {
    pub fn new(config: GrokConfig, prompt: PromptContext, defaults: IdeaDefaults) -> Result<Self> {
        let http_client = build_http_client(Some(UserAgent::for_client("grok")), config.provider.timeout)?;

        Ok(Self {
            http_client,
            config,
            prompt,
            defaults,
        })
    }

    pub fn from_research_config(config: &ResearchConfig) -> Result<Self> {
        Self::new(
            config.grok.clone(),
            PromptContext::from_config(config),
            IdeaDefaults::from_policy(ID_PREFIX, &config.research_policy),
        )
    }

    fn credentials(&self) -> Result<String> {
        if !self.config.provider.enabled {
            return Err(ServiceError::provider_disabled("Grok provider disabled"));
        }
        self.config
            .provider
            .resolve_api_key()
            .ok_or_else(|| ServiceError::missing_credential("Missing Grok API key"))
    }

    /// Send messages through the probe list and return the reply text
    pub async fn send_chat(&self, api_key: &str, messages: Vec<ChatMessage>, max_tokens: u32) -> Result<String> {
        let candidates = probe_candidates(&self.config);
        let total = candidates.len();
        let mut last_skipped: Option<ServiceError> = None;

        for (index, candidate) in candidates.into_iter().enumerate() {
            let body = ChatCompletionRequest {
                model: candidate.model.clone(),
                messages: messages.clone(),
                temperature: Some(self.config.provider.temperature),
                max_tokens: Some(max_tokens),
            };

            let response = self
                .http_client
                .post(&candidate.endpoint)
                .bearer_auth(api_key)
                .json(&body)
                .send()
                .await?;

            let status = response.status();
            if status.is_success() {
                if index > 0 {
                    info!(
                        "Grok answered on candidate {}/{}: {} model={}",
                        index + 1,
                        total,
                        candidate.endpoint,
                        candidate.model
                    );
                }
                let value: Value = response.json().await.map_err(|e| {
                    ServiceError::parsing(format!("Invalid completion body: {}", e))
                        .with_context(ErrorContext::for_service("grok").endpoint(&candidate.endpoint))
                })?;
                return Ok(extract_completion_text(&value).unwrap_or_else(|| value.to_string()));
            }

            let err = parse_error_response("grok", response)
                .await
                .with_context_value("model", &candidate.model);

            let skip = status == StatusCode::NOT_FOUND
                || self.config.probe_policy == ProbePolicy::AnyHttpError;
            if !skip {
                return Err(err);
            }

            debug!(
                "Grok candidate {}/{} {} model={} failed ({}), trying next: {}",
                index + 1,
                total,
                candidate.endpoint,
                candidate.model,
                classify_http_error(status),
                err
            );
            last_skipped = Some(err);
        }

        Err(match last_skipped {
            Some(err) => err.with_context_value("candidates_tried", total),
            None => ServiceError::configuration("No Grok endpoint/model candidates configured"),
        })
    }

    /// Ask Grok to review and improve a research report
    pub async fn analyze_report(&self, report: &str, instructions: &str) -> Result<String> {
        let api_key = self.credentials()?;

        let instructions = if instructions.trim().is_empty() {
            "Improve the report."
        } else {
            instructions.trim()
        };
        let messages = vec![
            ChatMessage::system(ANALYST_PROMPT),
            ChatMessage::user(format!("Instructions:\n{}\n\nReport:\n{}", instructions, report)),
        ];

        let text = self
            .send_chat(&api_key, messages, self.config.analysis_max_tokens)
            .await?;
        let text = text.trim();
        if text.is_empty() {
            return Err(ServiceError::parsing("Grok returned an empty analysis"));
        }
        Ok(text.to_string())
    }
}

#[async_trait]
impl IdeaProvider for GrokClient {
    fn name(&self) -> &str {
        "grok"
    }

    fn config(&self) -> &ProviderConfig {
        &self.config.provider
    }

    async fn generate_idea(&self, request: &ResearchRequest) -> Result<IdeaPayload> {
        let api_key = self.credentials()?;

        let messages = vec![
            ChatMessage::system(SYSTEM_PROMPT),
            ChatMessage::user(self.prompt.user_message(request)?),
        ];
        let text = self
            .send_chat(&api_key, messages, self.config.provider.max_output_tokens)
            .await?;

        let raw = parse_idea_object(&text)?;
        Ok(backfill_idea(&raw, request, &self.defaults, chrono::Utc::now()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidate_order_is_fixed() {
        let mut config = GrokConfig::default();
        config.provider.base_url = "https://api.x.ai/".to_string();
        config.provider.model = "grok-4".to_string();
        config.models = vec!["grok-3".to_string(), "grok-4".to_string()];
        config.endpoint_paths = vec!["/v1/chat/completions".to_string(), "chat/completions".to_string()];

        let candidates = probe_candidates(&config);
        let pairs: Vec<(&str, &str)> = candidates
            .iter()
            .map(|c| (c.endpoint.as_str(), c.model.as_str()))
            .collect();

        assert_eq!(
            pairs,
            vec![
                ("https://api.x.ai/v1/chat/completions", "grok-4"),
                ("https://api.x.ai/v1/chat/completions", "grok-3"),
                ("https://api.x.ai/chat/completions", "grok-4"),
                ("https://api.x.ai/chat/completions", "grok-3"),
            ]
        );
        assert_eq!(candidates, probe_candidates(&config));
    }

    #[test]
    fn test_default_candidates() {
        let candidates = probe_candidates(&GrokConfig::default());
        // 3 paths x 5 distinct models
        assert_eq!(candidates.len(), 15);
        assert_eq!(candidates[0].model, "grok-3");
        assert_eq!(candidates[0].endpoint, "https://api.x.ai/v1/chat/completions");
    }
}
