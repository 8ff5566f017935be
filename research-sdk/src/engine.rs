//! Request entry points
//!
//! [`ResearchEngine`] resolves a configuration snapshot per call, runs the
//! orchestrator and normalizer, and assembles the caller-facing response.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use chrono::{SecondsFormat, Utc};
use log::{error, info, warn};
use tracing::Instrument;

use crate::config::{ConfigProvider, ResearchConfig, ResearchPolicy, RoutingConfig};
use crate::error::{Result, ServiceError};
use crate::fallback;
use crate::model::{
    AnalysisResponse, HealthReport, IdeaRequest, IdeaResponse, ProbeReport, ProviderHealth,
    ResearchRequest, SocialSignal,
};
use crate::normalize::{NormalizedIdea, ResultNormalizer};
use crate::orchestrator::FallbackOrchestrator;
use crate::providers::{GrokClient, HttpProviderFactory, ProviderFactory, TwitterClient};
use crate::resilience::{RetryConfig, RetryExecutor};
use crate::util::{duration_ms, generate_request_id, measure_time_async};

/// Request used by the provider probe
const PROBE_RISK: u8 = 3;
const PROBE_BUDGET: f64 = 0.1;

fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Multi-provider research engine
pub struct ResearchEngine {
    config: Arc<dyn ConfigProvider>,
    factory: Arc<dyn ProviderFactory>,
}

impl ResearchEngine {
    /// Engine using the HTTP provider clients
    pub fn new(config: Arc<dyn ConfigProvider>) -> Self {
        Self {
            config,
            factory: Arc::new(HttpProviderFactory),
        }
    }

    /// Replace the provider factory
    pub fn with_factory(mut self, factory: Arc<dyn ProviderFactory>) -> Self {
        self.factory = factory;
        self
    }

    /// Fresh configuration snapshot
    pub fn load_config(&self) -> Result<ResearchConfig> {
        self.config.load()
    }

    /// Produce an idea for a request.
    ///
    /// Fails only for requests violating the input invariants; every valid
    /// request gets a payload.
    pub async fn submit_idea_request(&self, request: IdeaRequest) -> Result<IdeaResponse> {
        request.validate()?;
        let snapshot = self.load_config();
        self.submit_with_snapshot(&request, snapshot).await
    }

    /// Like [`submit_idea_request`](Self::submit_idea_request) with a snapshot the caller already loaded
    pub async fn submit_with_snapshot(
        &self,
        request: &IdeaRequest,
        snapshot: Result<ResearchConfig>,
    ) -> Result<IdeaResponse> {
        request.validate()?;
        let started = Instant::now();

        let config = match snapshot {
            Ok(config) => config,
            Err(err) => {
                error!("Configuration unavailable, serving static fallback: {}", err);
                let resolved = request.resolve(&ResearchPolicy::default(), &RoutingConfig::default())?;
                return Ok(internal_failure(&resolved, &err, started));
            }
        };
        let resolved = request.resolve(&config.research_policy, &config.routing)?;

        let request_id = generate_request_id();
        let span = tracing::info_span!(
            "idea_request",
            request_id = %request_id,
            preference = %resolved.provider,
            risk = resolved.risk
        );

        let outcome = self.run_pipeline(&resolved, &config).instrument(span).await;

        match outcome {
            Ok((idea, twitter_signals)) => {
                info!(
                    "Idea request {} answered by {} (retries {})",
                    request_id, idea.source, idea.retries
                );
                Ok(IdeaResponse {
                    ok: true,
                    source: idea.source,
                    timestamp: timestamp(),
                    payload: idea.payload,
                    error: idea.error,
                    retries: Some(idea.retries),
                    duration_ms: Some(duration_ms(started.elapsed())),
                    twitter_signals,
                })
            }
            Err(err) => {
                error!("Idea request {} failed internally: {}", request_id, err);
                Ok(internal_failure(&resolved, &err, started))
            }
        }
    }

    async fn run_pipeline(
        &self,
        request: &ResearchRequest,
        config: &ResearchConfig,
    ) -> Result<(NormalizedIdea, Option<Vec<SocialSignal>>)> {
        let twitter_signals = if config.routing.use_twitter_signals {
            Some(collect_signals(config).await)
        } else {
            None
        };

        let providers = self.factory.create(config)?;
        let attempt = FallbackOrchestrator::new(providers).run(request).await;
        let idea = ResultNormalizer::new(&config.research_policy).finalize(attempt, request, Utc::now());

        Ok((idea, twitter_signals))
    }

    /// One direct call to a single provider, without retry or fallback
    pub async fn probe_provider(&self, name: &str) -> Result<ProbeReport> {
        let config = self.load_config()?;
        let providers = self.factory.create(&config)?;
        let provider = providers
            .iter()
            .find(|p| p.name() == name)
            .ok_or_else(|| ServiceError::not_found(format!("Unknown provider '{}'", name)))?;

        let request = IdeaRequest::new(PROBE_RISK, PROBE_BUDGET)
            .resolve(&config.research_policy, &config.routing)?;

        let (result, elapsed) = measure_time_async(|| provider.generate_idea(&request)).await;
        let report = match result {
            Ok(payload) => ProbeReport {
                ok: true,
                provider: name.to_string(),
                payload: Some(payload),
                error: None,
                duration_ms: duration_ms(elapsed),
            },
            Err(err) => {
                warn!("Probe of {} failed: {}", name, err);
                ProbeReport {
                    ok: false,
                    provider: name.to_string(),
                    payload: None,
                    error: Some(err.to_string()),
                    duration_ms: duration_ms(elapsed),
                }
            }
        };
        Ok(report)
    }

    /// Have Grok review a report, with the Grok retry policy
    pub async fn analyze_report(&self, report: &str, instructions: &str) -> Result<AnalysisResponse> {
        if report.trim().is_empty() {
            return Err(ServiceError::validation("report must not be empty"));
        }
        let config = self.load_config()?;
        let grok = GrokClient::from_research_config(&config)?;

        let executor = RetryExecutor::new(RetryConfig::from_provider(&config.grok.provider));
        let outcome = executor
            .execute(|| grok.analyze_report(report, instructions))
            .await;
        let retries = outcome.retries_used();

        Ok(match outcome.result {
            Ok(analysis) => AnalysisResponse {
                ok: true,
                source: "grok".to_string(),
                analysis: Some(analysis),
                error: None,
                retries,
            },
            Err(err) => {
                warn!("Report analysis failed: {}", err);
                AnalysisResponse {
                    ok: false,
                    source: "grok".to_string(),
                    analysis: None,
                    error: Some(err.to_string()),
                    retries,
                }
            }
        })
    }

    /// Enabled flags and timeouts from the current snapshot
    pub fn health(&self) -> HealthReport {
        let config = match self.load_config() {
            Ok(config) => config,
            Err(err) => {
                return HealthReport {
                    ok: false,
                    providers: BTreeMap::new(),
                    timeout_s: 0.0,
                    error: Some(err.to_string()),
                }
            }
        };

        let mut providers = BTreeMap::new();
        for provider in [&config.openai, &config.grok.provider] {
            providers.insert(
                provider.name.clone(),
                ProviderHealth {
                    enabled: provider.enabled,
                    model: Some(provider.model.clone()),
                    timeout_s: provider.timeout.as_secs_f64(),
                },
            );
        }
        providers.insert(
            "twitter".to_string(),
            ProviderHealth {
                enabled: config.twitter.enabled,
                model: None,
                timeout_s: config.twitter.timeout.as_secs_f64(),
            },
        );

        HealthReport {
            ok: true,
            providers,
            timeout_s: config.openai.timeout.as_secs_f64(),
            error: None,
        }
    }
}

async fn collect_signals(config: &ResearchConfig) -> Vec<SocialSignal> {
    let client = match TwitterClient::new(config.twitter.clone()) {
        Ok(client) => client,
        Err(err) => {
            warn!("Twitter client unavailable: {}", err);
            return Vec::new();
        }
    };

    match client.recent_search().await {
        Ok(signals) => signals,
        Err(err) => {
            warn!("Twitter signals unavailable ({}): {}", err.kind(), err);
            Vec::new()
        }
    }
}

fn internal_failure(request: &ResearchRequest, err: &ServiceError, started: Instant) -> IdeaResponse {
    IdeaResponse {
        ok: false,
        source: "fallback".to_string(),
        timestamp: timestamp(),
        payload: fallback::static_idea(request, Utc::now()),
        error: Some(err.to_string()),
        retries: None,
        duration_ms: Some(duration_ms(started.elapsed())),
        twitter_signals: None,
    }
}
