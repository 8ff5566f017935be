//! Provider selection and cascading fallback
//!
//! Providers are tried strictly one after another. An explicit preference
//! tries the named provider first and cascades to the remaining enabled
//! providers only when that provider has `fallback_on_error` set. `auto`
//! walks every enabled provider in priority order regardless of that flag.

use std::sync::Arc;

use log::{debug, info, warn};

use crate::error::ServiceError;
use crate::model::{AttemptResult, IdeaPayload, ResearchRequest, SourceTag};
use crate::providers::IdeaProvider;
use crate::resilience::{AttemptOutcome, RetryConfig, RetryExecutor};

/// Runs a request through the configured providers
pub struct FallbackOrchestrator {
    providers: Vec<Arc<dyn IdeaProvider>>,
}

#[derive(Default)]
struct Chain {
    attempted: Vec<String>,
    retries: u32,
    last_error: Option<String>,
}

impl Chain {
    fn succeed(self, payload: IdeaPayload, source: SourceTag) -> AttemptResult {
        info!("Idea produced by {} after {} attempt(s)", source, self.attempted.len());
        AttemptResult {
            payload: Some(payload),
            source,
            error: self.last_error,
            retries_used: self.retries,
            attempted: self.attempted,
        }
    }

    fn exhaust(self) -> AttemptResult {
        if !self.attempted.is_empty() {
            let err = ServiceError::all_providers_exhausted(self.attempted.join(", "));
            warn!("{}", err);
        }
        AttemptResult::exhausted(self.last_error, self.retries, self.attempted)
    }
}

impl FallbackOrchestrator {
    /// Providers in priority order
    pub fn new(providers: Vec<Arc<dyn IdeaProvider>>) -> Self {
        Self { providers }
    }

    pub fn providers(&self) -> &[Arc<dyn IdeaProvider>] {
        &self.providers
    }

    fn find(&self, name: &str) -> Option<&Arc<dyn IdeaProvider>> {
        self.providers.iter().find(|p| p.name() == name)
    }

    /// Produce an idea or report that every provider failed
    #[tracing::instrument(skip_all, fields(preference = %request.provider))]
    pub async fn run(&self, request: &ResearchRequest) -> AttemptResult {
        match request.provider.provider_name() {
            Some(name) => self.run_explicit(name, request).await,
            None => self.run_auto(request).await,
        }
    }

    async fn run_explicit(&self, name: &str, request: &ResearchRequest) -> AttemptResult {
        let mut chain = Chain::default();

        let Some(primary) = self.find(name) else {
            chain.attempted.push(name.to_string());
            chain.last_error = Some(format!("{}: provider is not configured", name));
            warn!("Requested provider {} is not part of the routing order", name);
            return chain.exhaust();
        };

        if let Some(payload) = self.try_provider(primary, request, &mut chain).await {
            return chain.succeed(payload, SourceTag::Provider(name.to_string()));
        }

        if !primary.config().fallback_on_error {
            info!("{} failed and has fallback_on_error disabled, not cascading", name);
            return chain.exhaust();
        }

        for provider in self.providers.iter().filter(|p| p.name() != name && p.is_enabled()) {
            if let Some(payload) = self.try_provider(provider, request, &mut chain).await {
                let source = SourceTag::ProviderFallback(provider.name().to_string());
                return chain.succeed(payload, source);
            }
        }

        chain.exhaust()
    }

    async fn run_auto(&self, request: &ResearchRequest) -> AttemptResult {
        let mut chain = Chain::default();

        for provider in self.providers.iter().filter(|p| p.is_enabled()) {
            if let Some(payload) = self.try_provider(provider, request, &mut chain).await {
                let name = provider.name().to_string();
                let source = if chain.attempted.len() == 1 {
                    SourceTag::Provider(name)
                } else {
                    SourceTag::ProviderFallback(name)
                };
                return chain.succeed(payload, source);
            }
        }

        if chain.attempted.is_empty() {
            debug!("No provider enabled, nothing attempted");
        }
        chain.exhaust()
    }

    async fn try_provider(
        &self,
        provider: &Arc<dyn IdeaProvider>,
        request: &ResearchRequest,
        chain: &mut Chain,
    ) -> Option<IdeaPayload> {
        let name = provider.name().to_string();
        chain.attempted.push(name.clone());

        let outcome = attempt(provider.as_ref(), request).await;
        chain.retries += outcome.retries_used();

        match outcome.result {
            Ok(payload) => Some(payload),
            Err(err) => {
                warn!(
                    "Provider {} failed with {} error after {} call(s): {}",
                    name,
                    err.kind(),
                    outcome.attempts,
                    err
                );
                chain.last_error = Some(format!("{}: {}", name, err));
                None
            }
        }
    }
}

/// One provider call wrapped in its retry policy; disabled providers are never called
pub async fn attempt(provider: &dyn IdeaProvider, request: &ResearchRequest) -> AttemptOutcome<IdeaPayload> {
    if !provider.is_enabled() {
        return AttemptOutcome {
            result: Err(ServiceError::provider_disabled(format!(
                "Provider {} disabled",
                provider.name()
            ))),
            attempts: 0,
        };
    }

    let executor = RetryExecutor::new(RetryConfig::from_provider(provider.config()));
    executor.execute(|| provider.generate_idea(request)).await
}
