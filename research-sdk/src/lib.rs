//! # Research SDK
//!
//! Multi-provider trade idea generation for the Phoenix ORCH project.
//!
//! This crate provides:
//!
//! - Typed clients for the text-generation providers (OpenAI, xAI Grok)
//!   and the X recent-search social-signal feed
//! - Retry with a constant backoff for capacity errors
//! - Cascading fallback across providers, ending in a static idea
//! - Normalization of every payload, whatever tier produced it
//! - Per-request configuration snapshots loaded from TOML
//!
//! ## Architecture
//!
//! - `IdeaProvider`: the trait every text-generation client implements
//! - `FallbackOrchestrator`: selects providers and cascades between them
//! - `RetryExecutor`: retries retryable errors of a single provider call
//! - `ResultNormalizer`: enforces payload invariants and applies the fallback
//! - `ResearchEngine`: request entry point tying the pieces together
//! - `ServiceError`: error taxonomy shared by every layer

pub mod config;
pub use config::{ConfigProvider, FileConfigProvider, ResearchConfig, ServiceConfig, StaticConfigProvider};

pub mod engine;
pub use engine::ResearchEngine;

pub mod error;
pub use error::{ErrorContext, Result, ServiceError};

pub mod fallback;

pub mod model;
pub use model::{
    AnalysisResponse, HealthReport, IdeaPayload, IdeaRequest, IdeaResponse, ProbeReport,
    ProviderPreference, ResearchRequest, SocialSignal, SourceTag,
};

pub mod normalize;
pub use normalize::ResultNormalizer;

pub mod orchestrator;
pub use orchestrator::FallbackOrchestrator;

pub mod providers;
pub use providers::{GrokClient, IdeaProvider, OpenAIClient, ProviderFactory, TwitterClient};

pub mod resilience;
pub use resilience::{RetryConfig, RetryExecutor};

pub mod util;

#[cfg(test)]
mod tests;
