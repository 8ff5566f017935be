//! Shared test doubles and fixtures

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::config::{ProviderConfig, ResearchConfig};
use crate::error::{Result, ServiceError};
use crate::model::{IdeaPayload, ProviderPreference, ResearchRequest};
use crate::providers::{IdeaProvider, ProviderFactory};

type Responder = Box<dyn Fn(usize) -> Result<IdeaPayload> + Send + Sync>;

/// In-process provider counting its calls
pub struct MockProvider {
    config: ProviderConfig,
    calls: AtomicUsize,
    responder: Responder,
}

impl MockProvider {
    /// `responder` receives the zero-based call index
    pub fn new<F>(name: &str, responder: F) -> Self
    where
        F: Fn(usize) -> Result<IdeaPayload> + Send + Sync + 'static,
    {
        let mut config = ProviderConfig::openai_defaults();
        config.name = name.to_string();
        config.backoff = Duration::from_millis(1);
        config.api_key = Some("test-key".to_string());

        Self {
            config,
            calls: AtomicUsize::new(0),
            responder: Box::new(responder),
        }
    }

    pub fn succeeding(name: &str) -> Self {
        let owner = name.to_string();
        Self::new(name, move |_| Ok(sample_idea(&owner)))
    }

    pub fn failing(name: &str, make_error: fn() -> ServiceError) -> Self {
        Self::new(name, move |_| Err(make_error()))
    }

    /// Fails the first `failures` calls, then succeeds
    pub fn flaky(name: &str, failures: usize, make_error: fn() -> ServiceError) -> Self {
        let owner = name.to_string();
        Self::new(name, move |call| {
            if call < failures {
                Err(make_error())
            } else {
                Ok(sample_idea(&owner))
            }
        })
    }

    pub fn with_retries(mut self, retries: u32, backoff: Duration) -> Self {
        self.config.retries = retries;
        self.config.backoff = backoff;
        self
    }

    pub fn with_fallback(mut self, fallback_on_error: bool) -> Self {
        self.config.fallback_on_error = fallback_on_error;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.config.enabled = false;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IdeaProvider for MockProvider {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn config(&self) -> &ProviderConfig {
        &self.config
    }

    async fn generate_idea(&self, _request: &ResearchRequest) -> Result<IdeaPayload> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        (self.responder)(call)
    }
}

/// Hands out the same doubles for every snapshot
pub struct MockFactory {
    providers: Vec<Arc<MockProvider>>,
}

impl MockFactory {
    pub fn new(providers: Vec<Arc<MockProvider>>) -> Self {
        Self { providers }
    }
}

impl ProviderFactory for MockFactory {
    fn create(&self, _config: &ResearchConfig) -> Result<Vec<Arc<dyn IdeaProvider>>> {
        Ok(self
            .providers
            .iter()
            .map(|p| Arc::clone(p) as Arc<dyn IdeaProvider>)
            .collect())
    }
}

/// Upcast for orchestrator construction
pub fn chain(providers: &[Arc<MockProvider>]) -> Vec<Arc<dyn IdeaProvider>> {
    providers
        .iter()
        .map(|p| Arc::clone(p) as Arc<dyn IdeaProvider>)
        .collect()
}

pub fn sample_idea(provider: &str) -> IdeaPayload {
    IdeaPayload {
        idea_id: format!("{}-idea", provider),
        asset: "SOL".to_string(),
        thesis: format!("{} sees momentum", provider),
        entry_rule: "Market BUY".to_string(),
        exit_rule: "TP 2%".to_string(),
        risk: 2,
        budget: 0.05,
        ttl_minutes: 60,
        expected_catalyst: None,
    }
}

pub fn research_request(provider: ProviderPreference) -> ResearchRequest {
    ResearchRequest {
        risk: 2,
        budget: 0.05,
        universe: vec!["SOL".to_string()],
        constraints: "Spot only".to_string(),
        provider,
    }
}

pub fn parse_failure() -> ServiceError {
    ServiceError::parsing("JSON parse error: expected value at line 1 column 1, raw response: not json")
}

pub fn rate_limited() -> ServiceError {
    ServiceError::rate_limit("429 Too Many Requests")
}

pub fn unreachable_upstream() -> ServiceError {
    ServiceError::transport("connection refused")
}
