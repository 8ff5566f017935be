//! Provider client implementations
//!
//! Every text-generation provider implements [`IdeaProvider`]; the
//! orchestrator only sees that trait. The social-signal search client is
//! separate because it enriches responses instead of producing ideas.

pub mod common;
pub mod grok;
pub mod openai;
pub mod twitter;

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::config::{ProviderConfig, ResearchConfig};
use crate::error::Result;
use crate::model::{IdeaPayload, ResearchRequest};

pub use common::UserAgent;
pub use grok::GrokClient;
pub use openai::OpenAIClient;
pub use twitter::TwitterClient;

/// Fixed instruction sent ahead of every idea request
pub const SYSTEM_PROMPT: &str = "You are a trading research assistant for Solana spot markets. \
Answer with exactly one valid JSON object and nothing else, no prose and no Markdown. \
Use these keys: idea_id, asset, thesis, entry_rule, exit_rule, risk, budget, ttl_minutes, expected_catalyst. \
Spot trades only: no derivatives, no leverage, no short selling. \
Respect the requested risk level, budget, universe and constraints.";

/// A text-generation service that turns a request into a trade idea
#[async_trait]
pub trait IdeaProvider: Send + Sync {
    /// Routing name, e.g. "openai"
    fn name(&self) -> &str;

    /// Settings from the current snapshot
    fn config(&self) -> &ProviderConfig;

    fn is_enabled(&self) -> bool {
        self.config().enabled
    }

    /// One call against the provider, without retries
    async fn generate_idea(&self, request: &ResearchRequest) -> Result<IdeaPayload>;
}

/// Builds the provider chain for one configuration snapshot
pub trait ProviderFactory: Send + Sync {
    /// Providers in routing priority order
    fn create(&self, config: &ResearchConfig) -> Result<Vec<Arc<dyn IdeaProvider>>>;
}

/// Default factory creating the HTTP clients
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpProviderFactory;

impl ProviderFactory for HttpProviderFactory {
    fn create(&self, config: &ResearchConfig) -> Result<Vec<Arc<dyn IdeaProvider>>> {
        let mut providers: Vec<Arc<dyn IdeaProvider>> = Vec::new();
        for name in &config.routing.provider_order {
            match name.as_str() {
                "openai" => providers.push(Arc::new(OpenAIClient::from_research_config(config)?)),
                "grok" => providers.push(Arc::new(GrokClient::from_research_config(config)?)),
                other => log::warn!("Ignoring unknown provider '{}' in routing order", other),
            }
        }
        Ok(providers)
    }
}

/// Profile and policy forwarded with every request
#[derive(Debug, Clone)]
pub struct PromptContext {
    pub profile: Value,
    pub policy: Value,
}

impl PromptContext {
    pub fn from_config(config: &ResearchConfig) -> Self {
        Self {
            profile: config.investment_profile.clone(),
            policy: serde_json::to_value(&config.research_policy).unwrap_or(Value::Null),
        }
    }

    /// User message body: `{request, profile, policy}`
    pub fn user_message(&self, request: &ResearchRequest) -> Result<String> {
        let body = json!({
            "request": request,
            "profile": self.profile,
            "policy": self.policy,
        });
        Ok(serde_json::to_string(&body)?)
    }
}
