//! OpenAI chat completions client
//!
//! Sends the research prompt to `{base_url}/chat/completions` and parses the
//! reply into an [`IdeaPayload`].

mod models;
pub use models::*;

use async_trait::async_trait;
use log::debug;
use reqwest::Client;

use super::common::{build_http_client, join_url, parse_error_response, UserAgent};
use super::{IdeaProvider, PromptContext, SYSTEM_PROMPT};
use crate::config::{ProviderConfig, ResearchConfig};
use crate::error::{ErrorContext, Result, ServiceError};
use crate::model::{IdeaPayload, ResearchRequest};
use crate::normalize::{backfill_idea, parse_idea_object, IdeaDefaults};

/// Prefix of generated OpenAI idea identifiers
pub const ID_PREFIX: &str = "IDEA";

/// OpenAI API client
pub struct OpenAIClient {
    /// HTTP client
    http_client: Client,

    /// Configuration
    config: ProviderConfig,

    /// Profile and policy forwarded with each request
    prompt: PromptContext,

    /// Back-fill values for incomplete replies
    defaults: IdeaDefaults,
}

impl OpenAIClient {
    /// Create a client for one configuration snapshot
    pub fn new(config: ProviderConfig, prompt: PromptContext, defaults: IdeaDefaults) -> Result<Self> {
        let http_client = build_http_client(Some(UserAgent::for_client("openai")), config.timeout)?;

        Ok(Self {
            http_client,
            config,
            prompt,
            defaults,
        })
    }

    /// Create a client from the full research configuration
    pub fn from_research_config(config: &ResearchConfig) -> Result<Self> {
        Self::new(
            config.openai.clone(),
            PromptContext::from_config(config),
            IdeaDefaults::from_policy(ID_PREFIX, &config.research_policy),
        )
    }

    fn endpoint(&self) -> String {
        join_url(&self.config.base_url, "chat/completions")
    }

    /// Send a chat completion request
    pub async fn chat_completion(
        &self,
        request: &ChatCompletionRequest,
        api_key: &str,
    ) -> Result<ChatCompletionResponse> {
        let url = self.endpoint();
        debug!("POST {} model={}", url, request.model);

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(api_key)
            .json(request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(parse_error_response("openai", response).await);
        }

        response.json::<ChatCompletionResponse>().await.map_err(|e| {
            ServiceError::parsing(format!("Invalid completion body: {}", e))
                .with_context(ErrorContext::for_service("openai").endpoint(url))
        })
    }

    fn build_request(&self, request: &ResearchRequest) -> Result<ChatCompletionRequest> {
        Ok(ChatCompletionRequest {
            model: self.config.model.clone(),
            messages: vec![
                ChatMessage::system(SYSTEM_PROMPT),
                ChatMessage::user(self.prompt.user_message(request)?),
            ],
            temperature: Some(self.config.temperature),
            max_tokens: Some(self.config.max_output_tokens),
        })
    }
}

#[async_trait]
impl IdeaProvider for OpenAIClient {
    fn name(&self) -> &str {
        "openai"
    }

    fn config(&self) -> &ProviderConfig {
        &self.config
    }

    async fn generate_idea(&self, request: &ResearchRequest) -> Result<IdeaPayload> {
        if !self.config.enabled {
            return Err(ServiceError::provider_disabled("OpenAI provider disabled"));
        }
        let api_key = self
            .config
            .resolve_api_key()
            .ok_or_else(|| ServiceError::missing_credential("Missing OpenAI API key"))?;

        let completion = self
            .chat_completion(&self.build_request(request)?, &api_key)
            .await?;

        let text = completion
            .first_content()
            .ok_or_else(|| ServiceError::parsing("OpenAI returned no completion content"))?;

        let raw = parse_idea_object(text)?;
        Ok(backfill_idea(&raw, request, &self.defaults, chrono::Utc::now()))
    }
}
