//! Social-signal search client (X recent search)
//!
//! Signals only enrich idea responses; callers treat any error here as
//! "no signals".

mod models;
pub use models::*;

use log::debug;
use reqwest::Client;

use super::common::{build_http_client, join_url, parse_error_response, UserAgent};
use crate::config::TwitterConfig;
use crate::error::{ErrorContext, Result, ServiceError};
use crate::model::SocialSignal;

/// Smallest page size the recent search endpoint accepts
const MIN_RESULTS: u32 = 10;

pub struct TwitterClient {
    http_client: Client,
    config: TwitterConfig,
}

impl TwitterClient {
    pub fn new(config: TwitterConfig) -> Result<Self> {
        let http_client = build_http_client(Some(UserAgent::for_client("twitter")), config.timeout)?;
        Ok(Self { http_client, config })
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Recent posts matching the configured query
    pub async fn recent_search(&self) -> Result<Vec<SocialSignal>> {
        if !self.config.enabled {
            return Err(ServiceError::provider_disabled("Twitter provider disabled"));
        }
        let token = self
            .config
            .resolve_token()
            .ok_or_else(|| ServiceError::missing_credential("Missing X bearer token"))?;

        let url = join_url(&self.config.base_url, &self.config.recent_search_endpoint);
        let max_results = self.config.max_results.clamp(MIN_RESULTS, crate::config::TWITTER_MAX_RESULTS_CAP);
        debug!("GET {} max_results={}", url, max_results);

        let response = self
            .http_client
            .get(&url)
            .bearer_auth(token)
            .query(&[
                ("query", self.config.query.clone()),
                ("max_results", max_results.to_string()),
                ("tweet.fields", "created_at".to_string()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(parse_error_response("twitter", response).await);
        }

        let body = response.json::<RecentSearchResponse>().await.map_err(|e| {
            ServiceError::parsing(format!("Invalid recent search body: {}", e))
                .with_context(ErrorContext::for_service("twitter").endpoint(url))
        })?;

        Ok(body.data.into_iter().map(SocialSignal::from).collect())
    }
}
