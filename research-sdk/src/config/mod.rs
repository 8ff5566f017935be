//! Configuration management for the research engine
//!
//! Configuration is a TOML document with the sections `providers`,
//! `investment_profile`, `research_policy`, `routing` and `logging`.
//! Every request works on an immutable [`ResearchConfig`] snapshot obtained
//! from a [`ConfigProvider`]; the file-backed provider rereads the document
//! on each call so edits apply without a restart.

use std::env;
use std::fmt::Debug;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::Serialize;
use serde_json::json;
use url::Url;

use crate::error::{Result, ServiceError};
use crate::model::ProviderPreference;

/// Provider names understood by the router
pub const KNOWN_PROVIDERS: [&str; 2] = ["openai", "grok"];

/// Supplies configuration snapshots
pub trait ConfigProvider: Send + Sync {
    /// Produce a fresh snapshot
    fn load(&self) -> Result<ResearchConfig>;
}

/// Reads the TOML config from disk on every [`ConfigProvider::load`]
#[derive(Debug, Clone)]
pub struct FileConfigProvider {
    path: PathBuf,
}

impl FileConfigProvider {
    /// Create a provider for an explicit path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Create a provider for `RESEARCH_CONFIG` or `Config/research.toml`
    pub fn from_env() -> Self {
        Self::new(config_rs::config_path())
    }

    /// Location this provider reads from
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfigProvider for FileConfigProvider {
    fn load(&self) -> Result<ResearchConfig> {
        match config_rs::load_document(&self.path) {
            Ok(Some(document)) => ResearchConfig::from_document(&document),
            Ok(None) => Ok(ResearchConfig::default()),
            Err(e) => Err(ServiceError::configuration(e.to_string())),
        }
    }
}

/// In-memory snapshot provider for tests or embedding
#[derive(Debug, Clone, Default)]
pub struct StaticConfigProvider {
    config: ResearchConfig,
}

impl StaticConfigProvider {
    pub fn new(config: ResearchConfig) -> Self {
        Self { config }
    }

    /// Parse a TOML document, applying `${VAR}` expansion like the file provider
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let document = config_rs::parse_document(text, Path::new("<inline>"))
            .map_err(|e| ServiceError::configuration(e.to_string()))?;
        Ok(Self::new(ResearchConfig::from_document(&document)?))
    }
}

impl ConfigProvider for StaticConfigProvider {
    fn load(&self) -> Result<ResearchConfig> {
        Ok(self.config.clone())
    }
}

/// Typed accessors over one TOML table
#[derive(Debug, Clone, Copy)]
pub struct ConfigSection<'a> {
    name: &'a str,
    table: Option<&'a toml::Table>,
}

impl<'a> ConfigSection<'a> {
    /// Wrap a document (or sub-table) value
    pub fn new(name: &'a str, value: Option<&'a toml::Value>) -> Self {
        Self {
            name,
            table: value.and_then(toml::Value::as_table),
        }
    }

    /// Nested table; missing tables read as empty
    pub fn section(&self, key: &'a str) -> ConfigSection<'a> {
        ConfigSection {
            name: key,
            table: self
                .table
                .and_then(|t| t.get(key))
                .and_then(toml::Value::as_table),
        }
    }

    fn raw(&self, key: &str) -> Option<&'a toml::Value> {
        self.table.and_then(|t| t.get(key))
    }

    fn invalid(&self, key: &str, expected: &str, found: &toml::Value) -> ServiceError {
        ServiceError::configuration(format!(
            "Invalid {} for key {}.{}: {}",
            expected, self.name, key, found
        ))
    }

    /// Get a string configuration value
    pub fn get_string(&self, key: &str) -> Result<Option<String>> {
        match self.raw(key) {
            None => Ok(None),
            Some(toml::Value::String(s)) => Ok(Some(s.clone())),
            Some(toml::Value::Integer(i)) => Ok(Some(i.to_string())),
            Some(toml::Value::Float(f)) => Ok(Some(f.to_string())),
            Some(toml::Value::Boolean(b)) => Ok(Some(b.to_string())),
            Some(other) => Err(self.invalid(key, "string", other)),
        }
    }

    /// Get an integer configuration value
    pub fn get_int(&self, key: &str) -> Result<Option<i64>> {
        match self.raw(key) {
            None => Ok(None),
            Some(toml::Value::Integer(i)) => Ok(Some(*i)),
            Some(toml::Value::String(s)) => s
                .trim()
                .parse::<i64>()
                .map(Some)
                .map_err(|_| self.invalid(key, "integer", &toml::Value::String(s.clone()))),
            Some(other) => Err(self.invalid(key, "integer", other)),
        }
    }

    /// Get a float configuration value
    pub fn get_float(&self, key: &str) -> Result<Option<f64>> {
        match self.raw(key) {
            None => Ok(None),
            Some(toml::Value::Float(f)) => Ok(Some(*f)),
            Some(toml::Value::Integer(i)) => Ok(Some(*i as f64)),
            Some(toml::Value::String(s)) => s
                .trim()
                .parse::<f64>()
                .map(Some)
                .map_err(|_| self.invalid(key, "float", &toml::Value::String(s.clone()))),
            Some(other) => Err(self.invalid(key, "float", other)),
        }
    }

    /// Get a boolean configuration value
    pub fn get_bool(&self, key: &str) -> Result<Option<bool>> {
        match self.raw(key) {
            None => Ok(None),
            Some(toml::Value::Boolean(b)) => Ok(Some(*b)),
            Some(toml::Value::String(s)) => match s.to_lowercase().as_str() {
                "true" | "yes" | "1" | "on" => Ok(Some(true)),
                "false" | "no" | "0" | "off" => Ok(Some(false)),
                _ => Err(self.invalid(key, "boolean", &toml::Value::String(s.clone()))),
            },
            Some(other) => Err(self.invalid(key, "boolean", other)),
        }
    }

    /// Get a list of strings
    pub fn get_list(&self, key: &str) -> Result<Option<Vec<String>>> {
        match self.raw(key) {
            None => Ok(None),
            Some(toml::Value::Array(items)) => items
                .iter()
                .map(|item| match item {
                    toml::Value::String(s) => Ok(s.clone()),
                    other => Err(self.invalid(key, "string list", other)),
                })
                .collect::<Result<Vec<_>>>()
                .map(Some),
            Some(toml::Value::String(s)) => Ok(Some(
                s.split(',')
                    .map(str::trim)
                    .filter(|item| !item.is_empty())
                    .map(str::to_string)
                    .collect(),
            )),
            Some(other) => Err(self.invalid(key, "string list", other)),
        }
    }

    pub fn get_string_or(&self, key: &str, default: &str) -> Result<String> {
        Ok(self.get_string(key)?.unwrap_or_else(|| default.to_string()))
    }

    pub fn get_int_or(&self, key: &str, default: i64) -> Result<i64> {
        Ok(self.get_int(key)?.unwrap_or(default))
    }

    pub fn get_float_or(&self, key: &str, default: f64) -> Result<f64> {
        Ok(self.get_float(key)?.unwrap_or(default))
    }

    pub fn get_bool_or(&self, key: &str, default: bool) -> Result<bool> {
        Ok(self.get_bool(key)?.unwrap_or(default))
    }

    pub fn get_list_or(&self, key: &str, default: &[&str]) -> Result<Vec<String>> {
        Ok(self
            .get_list(key)?
            .unwrap_or_else(|| default.iter().map(|s| s.to_string()).collect()))
    }

    /// Non-negative integer that must fit into u32
    pub fn get_u32_or(&self, key: &str, default: u32) -> Result<u32> {
        let value = self.get_int_or(key, i64::from(default))?;
        u32::try_from(value).map_err(|_| {
            ServiceError::configuration(format!(
                "Value for key {}.{} must be a non-negative integer, got {}",
                self.name, key, value
            ))
        })
    }

    /// Whole table converted to JSON, for pass-through sections
    pub fn to_json(&self) -> Option<serde_json::Value> {
        self.table.and_then(|t| serde_json::to_value(t).ok())
    }
}

/// Trait for service-specific configuration
pub trait ServiceConfig: Debug + Send + Sync {
    /// Validate this configuration
    fn validate(&self) -> Result<()>;

    /// Service name
    fn service_name(&self) -> &str;
}

/// Settings for one text-generation provider
#[derive(Debug, Clone, Serialize)]
pub struct ProviderConfig {
    pub name: String,
    pub enabled: bool,
    pub model: String,
    pub base_url: String,
    pub temperature: f64,
    pub max_output_tokens: u32,
    #[serde(with = "duration_secs")]
    pub timeout: Duration,
    pub retries: u32,
    #[serde(with = "duration_millis")]
    pub backoff: Duration,
    pub fallback_on_error: bool,
    #[serde(skip)]
    pub api_key: Option<String>,
    /// Environment variables consulted, in order, when `api_key` is unusable
    pub api_key_env: Vec<String>,
}

impl ProviderConfig {
    /// Built-in OpenAI defaults
    pub fn openai_defaults() -> Self {
        Self {
            name: "openai".to_string(),
            enabled: true,
            model: "gpt-4o-mini".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            temperature: 0.2,
            max_output_tokens: 600,
            timeout: Duration::from_secs(30),
            retries: 1,
            backoff: Duration::from_millis(500),
            fallback_on_error: true,
            api_key: None,
            api_key_env: vec!["OPENAI_API_KEY".to_string()],
        }
    }

    /// Built-in xAI Grok defaults
    pub fn grok_defaults() -> Self {
        Self {
            name: "grok".to_string(),
            model: "grok-3".to_string(),
            base_url: "https://api.x.ai".to_string(),
            api_key_env: vec!["XAI_API_KEY".to_string()],
            ..Self::openai_defaults()
        }
    }

    /// Overlay a `[providers.<name>]` table on top of defaults
    pub fn from_section(section: &ConfigSection<'_>, defaults: Self) -> Result<Self> {
        // the older key name is still accepted
        let fallback_on_error = match section.get_bool("fallback_on_error")? {
            Some(flag) => flag,
            None => section.get_bool_or("enable_fallback_on_error", defaults.fallback_on_error)?,
        };

        let timeout_seconds = section.get_float_or("timeout_seconds", defaults.timeout.as_secs_f64())?;
        if !timeout_seconds.is_finite() || timeout_seconds < 0.0 {
            return Err(ServiceError::configuration(format!(
                "providers.{}.timeout_seconds must be positive, got {}",
                defaults.name, timeout_seconds
            )));
        }

        let timeout = Duration::try_from_secs_f64(timeout_seconds).map_err(|_| {
            ServiceError::configuration(format!(
                "providers.{}.timeout_seconds is out of range, got {}",
                defaults.name, timeout_seconds
            ))
        })?;

        let backoff_ms = section.get_u32_or("backoff_ms", defaults.backoff.as_millis() as u32)?;

        let config = Self {
            enabled: section.get_bool_or("enabled", defaults.enabled)?,
            model: section.get_string_or("model", &defaults.model)?,
            base_url: section.get_string_or("base_url", &defaults.base_url)?,
            temperature: section.get_float_or("temperature", defaults.temperature)?,
            max_output_tokens: section.get_u32_or("max_output_tokens", defaults.max_output_tokens)?,
            timeout,
            retries: section.get_u32_or("retries", defaults.retries)?,
            backoff: Duration::from_millis(u64::from(backoff_ms)),
            fallback_on_error,
            api_key: section.get_string("api_key")?,
            api_key_env: match section.get_string("api_key_env")? {
                Some(var) => vec![var],
                None => defaults.api_key_env.clone(),
            },
            name: defaults.name,
        };

        config.validate()?;
        Ok(config)
    }

    /// Credential from config, else from the environment
    pub fn resolve_api_key(&self) -> Option<String> {
        resolve_secret(self.api_key.as_deref(), &self.api_key_env)
    }
}

impl ServiceConfig for ProviderConfig {
    fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.temperature) {
            return Err(ServiceError::configuration(format!(
                "providers.{}.temperature must be within [0, 1], got {}",
                self.name, self.temperature
            )));
        }
        if self.max_output_tokens == 0 {
            return Err(ServiceError::configuration(format!(
                "providers.{}.max_output_tokens must be positive",
                self.name
            )));
        }
        if self.timeout.is_zero() {
            return Err(ServiceError::configuration(format!(
                "providers.{}.timeout_seconds must be positive",
                self.name
            )));
        }
        if self.model.trim().is_empty() {
            return Err(ServiceError::configuration(format!(
                "providers.{}.model is required",
                self.name
            )));
        }
        validate_base_url(&self.name, &self.base_url)
    }

    fn service_name(&self) -> &str {
        &self.name
    }
}

/// How the Grok client treats non-404 HTTP errors while probing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbePolicy {
    /// Skip only on 404, stop on any other error
    NotFoundOnly,
    /// Skip on every HTTP error status
    AnyHttpError,
}

impl FromStr for ProbePolicy {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "not_found_only" | "strict" => Ok(ProbePolicy::NotFoundOnly),
            "any_http_error" | "lenient" => Ok(ProbePolicy::AnyHttpError),
            other => Err(ServiceError::configuration(format!(
                "Unknown probe_policy '{}', expected not_found_only or any_http_error",
                other
            ))),
        }
    }
}

/// Grok settings: the common provider block plus the probe surface
#[derive(Debug, Clone, Serialize)]
pub struct GrokConfig {
    #[serde(flatten)]
    pub provider: ProviderConfig,
    /// Models tried after the configured one
    pub models: Vec<String>,
    /// Paths appended to `base_url`, in priority order
    pub endpoint_paths: Vec<String>,
    pub probe_policy: ProbePolicy,
    pub analysis_max_tokens: u32,
}

impl Default for GrokConfig {
    fn default() -> Self {
        Self {
            provider: ProviderConfig::grok_defaults(),
            models: DEFAULT_GROK_MODELS.iter().map(|s| s.to_string()).collect(),
            endpoint_paths: DEFAULT_GROK_PATHS.iter().map(|s| s.to_string()).collect(),
            probe_policy: ProbePolicy::NotFoundOnly,
            analysis_max_tokens: 2000,
        }
    }
}

const DEFAULT_GROK_MODELS: [&str; 5] = ["grok-3", "grok-4", "grok-3-mini", "grok-code-fast-1", "grok-beta"];
const DEFAULT_GROK_PATHS: [&str; 3] = ["/v1/chat/completions", "/chat/completions", "/api/chat/completions"];

impl GrokConfig {
    pub fn from_section(section: &ConfigSection<'_>) -> Result<Self> {
        let config = Self {
            provider: ProviderConfig::from_section(section, ProviderConfig::grok_defaults())?,
            models: section.get_list_or("models", &DEFAULT_GROK_MODELS)?,
            endpoint_paths: section.get_list_or("endpoint_paths", &DEFAULT_GROK_PATHS)?,
            probe_policy: section.get_string_or("probe_policy", "not_found_only")?.parse()?,
            analysis_max_tokens: section.get_u32_or("analysis_max_tokens", 2000)?,
        };
        config.validate()?;
        Ok(config)
    }
}

impl ServiceConfig for GrokConfig {
    fn validate(&self) -> Result<()> {
        self.provider.validate()?;
        if self.endpoint_paths.is_empty() {
            return Err(ServiceError::configuration(
                "providers.grok.endpoint_paths must list at least one path",
            ));
        }
        if self.analysis_max_tokens == 0 {
            return Err(ServiceError::configuration(
                "providers.grok.analysis_max_tokens must be positive",
            ));
        }
        Ok(())
    }

    fn service_name(&self) -> &str {
        "grok"
    }
}

/// Social-signal search settings (X recent search)
#[derive(Debug, Clone, Serialize)]
pub struct TwitterConfig {
    pub enabled: bool,
    pub base_url: String,
    pub recent_search_endpoint: String,
    pub query: String,
    pub max_results: u32,
    #[serde(with = "duration_secs")]
    pub timeout: Duration,
    #[serde(skip)]
    pub bearer_token: Option<String>,
    pub token_env: Vec<String>,
}

/// Upper bound accepted by the recent search endpoint
pub const TWITTER_MAX_RESULTS_CAP: u32 = 100;

impl Default for TwitterConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: "https://api.twitter.com/2".to_string(),
            recent_search_endpoint: "/tweets/search/recent".to_string(),
            query: "(SOL OR Solana) (DEX OR DeFi) -is:retweet lang:en".to_string(),
            max_results: 25,
            timeout: Duration::from_secs(10),
            bearer_token: None,
            token_env: vec!["X_BEARER_TOKEN".to_string(), "TWITTER_BEARER_TOKEN".to_string()],
        }
    }
}

impl TwitterConfig {
    pub fn from_section(section: &ConfigSection<'_>) -> Result<Self> {
        let defaults = Self::default();
        let timeout_seconds = section.get_u32_or("timeout_seconds", 10)?;
        let config = Self {
            enabled: section.get_bool_or("enabled", defaults.enabled)?,
            base_url: section.get_string_or("base_url", &defaults.base_url)?,
            recent_search_endpoint: section
                .get_string_or("recent_search_endpoint", &defaults.recent_search_endpoint)?,
            query: section.get_string_or("query", &defaults.query)?,
            max_results: section
                .get_u32_or("max_results", defaults.max_results)?
                .min(TWITTER_MAX_RESULTS_CAP),
            timeout: Duration::from_secs(u64::from(timeout_seconds)),
            bearer_token: section.get_string("bearer_token")?,
            token_env: defaults.token_env,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn resolve_token(&self) -> Option<String> {
        resolve_secret(self.bearer_token.as_deref(), &self.token_env)
    }
}

impl ServiceConfig for TwitterConfig {
    fn validate(&self) -> Result<()> {
        if self.timeout.is_zero() {
            return Err(ServiceError::configuration(
                "providers.twitter.timeout_seconds must be positive",
            ));
        }
        validate_base_url("twitter", &self.base_url)
    }

    fn service_name(&self) -> &str {
        "twitter"
    }
}

/// Defaults applied to requests and generated ideas
#[derive(Debug, Clone, Serialize)]
pub struct ResearchPolicy {
    pub universe: Vec<String>,
    pub constraints: String,
    pub ttl_minutes_default: u32,
    pub stop_loss_pct: f64,
    pub take_profit_pct: f64,
}

impl Default for ResearchPolicy {
    fn default() -> Self {
        Self {
            universe: vec!["SOL".to_string()],
            constraints: "Spot only".to_string(),
            ttl_minutes_default: 90,
            stop_loss_pct: 1.5,
            take_profit_pct: 2.0,
        }
    }
}

impl ResearchPolicy {
    pub fn from_section(section: &ConfigSection<'_>) -> Result<Self> {
        let defaults = Self::default();
        let policy = Self {
            universe: section.get_list_or("universe", &["SOL"])?,
            constraints: section.get_string_or("constraints", &defaults.constraints)?,
            ttl_minutes_default: section
                .get_u32_or("ttl_minutes_default", defaults.ttl_minutes_default)?,
            stop_loss_pct: section.get_float_or("stop_loss_pct", defaults.stop_loss_pct)?,
            take_profit_pct: section.get_float_or("take_profit_pct", defaults.take_profit_pct)?,
        };
        policy.validate()?;
        Ok(policy)
    }

    /// First universe symbol, or SOL
    pub fn default_asset(&self) -> &str {
        self.universe
            .iter()
            .map(String::as_str)
            .find(|s| !s.trim().is_empty())
            .unwrap_or("SOL")
    }
}

impl ServiceConfig for ResearchPolicy {
    fn validate(&self) -> Result<()> {
        if self.ttl_minutes_default == 0 {
            return Err(ServiceError::configuration(
                "research_policy.ttl_minutes_default must be positive",
            ));
        }
        Ok(())
    }

    fn service_name(&self) -> &str {
        "research_policy"
    }
}

/// Provider routing policy
#[derive(Debug, Clone, Serialize)]
pub struct RoutingConfig {
    pub default_provider: ProviderPreference,
    /// Priority order used by `auto` and by cascades
    pub provider_order: Vec<String>,
    pub use_twitter_signals: bool,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            default_provider: ProviderPreference::Auto,
            provider_order: KNOWN_PROVIDERS.iter().map(|s| s.to_string()).collect(),
            use_twitter_signals: false,
        }
    }
}

impl RoutingConfig {
    pub fn from_section(section: &ConfigSection<'_>) -> Result<Self> {
        let defaults = Self::default();
        let default_provider = match section.get_string("default_provider")? {
            Some(raw) => raw.parse()?,
            // older configs only carry a boolean preference
            None => match section.get_bool("prefer_openai")? {
                Some(true) => ProviderPreference::OpenAi,
                _ => defaults.default_provider,
            },
        };

        let routing = Self {
            default_provider,
            provider_order: section.get_list_or("provider_order", &KNOWN_PROVIDERS)?,
            use_twitter_signals: section
                .get_bool_or("use_twitter_signals", defaults.use_twitter_signals)?,
        };
        routing.validate()?;
        Ok(routing)
    }
}

impl ServiceConfig for RoutingConfig {
    fn validate(&self) -> Result<()> {
        if let Some(unknown) = self
            .provider_order
            .iter()
            .find(|name| !KNOWN_PROVIDERS.contains(&name.as_str()))
        {
            return Err(ServiceError::configuration(format!(
                "routing.provider_order names unknown provider '{}'",
                unknown
            )));
        }
        Ok(())
    }

    fn service_name(&self) -> &str {
        "routing"
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Text,
    Json,
}

/// Logging and audit settings
#[derive(Debug, Clone, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
    pub write_idea_reports: bool,
    pub report_dir: PathBuf,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Text,
            write_idea_reports: true,
            report_dir: PathBuf::from("Report"),
        }
    }
}

impl LoggingConfig {
    pub fn from_section(section: &ConfigSection<'_>) -> Result<Self> {
        let defaults = Self::default();
        let format = match section.get_string_or("format", "text")?.to_lowercase().as_str() {
            "json" => LogFormat::Json,
            "text" | "plain" => LogFormat::Text,
            other => {
                return Err(ServiceError::configuration(format!(
                    "Unknown logging.format '{}'",
                    other
                )))
            }
        };

        Ok(Self {
            level: section.get_string_or("level", &defaults.level)?.to_lowercase(),
            format,
            write_idea_reports: section
                .get_bool_or("write_idea_reports", defaults.write_idea_reports)?,
            report_dir: section
                .get_string("report_dir")?
                .map(PathBuf::from)
                .unwrap_or(defaults.report_dir),
        })
    }
}

/// Immutable configuration snapshot for one request
#[derive(Debug, Clone, Serialize)]
pub struct ResearchConfig {
    pub openai: ProviderConfig,
    pub grok: GrokConfig,
    pub twitter: TwitterConfig,
    pub investment_profile: serde_json::Value,
    pub research_policy: ResearchPolicy,
    pub routing: RoutingConfig,
    pub logging: LoggingConfig,
}

impl Default for ResearchConfig {
    fn default() -> Self {
        Self {
            openai: ProviderConfig::openai_defaults(),
            grok: GrokConfig::default(),
            twitter: TwitterConfig::default(),
            investment_profile: default_investment_profile(),
            research_policy: ResearchPolicy::default(),
            routing: RoutingConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl ResearchConfig {
    /// Build a snapshot from an already env-expanded TOML document
    pub fn from_document(document: &toml::Value) -> Result<Self> {
        let root = ConfigSection::new("root", Some(document));
        let providers = root.section("providers");

        Ok(Self {
            openai: ProviderConfig::from_section(
                &providers.section("openai"),
                ProviderConfig::openai_defaults(),
            )?,
            grok: GrokConfig::from_section(&providers.section("grok"))?,
            twitter: TwitterConfig::from_section(&providers.section("twitter"))?,
            investment_profile: root
                .section("investment_profile")
                .to_json()
                .unwrap_or_else(default_investment_profile),
            research_policy: ResearchPolicy::from_section(&root.section("research_policy"))?,
            routing: RoutingConfig::from_section(&root.section("routing"))?,
            logging: LoggingConfig::from_section(&root.section("logging"))?,
        })
    }

    /// Settings of a text-generation provider by name
    pub fn provider(&self, name: &str) -> Option<&ProviderConfig> {
        match name {
            "openai" => Some(&self.openai),
            "grok" => Some(&self.grok.provider),
            _ => None,
        }
    }

    /// Provider settings in routing priority order
    pub fn providers_in_order(&self) -> Vec<&ProviderConfig> {
        self.routing
            .provider_order
            .iter()
            .filter_map(|name| self.provider(name))
            .collect()
    }
}

fn default_investment_profile() -> serde_json::Value {
    json!({
        "objective": "fallback",
        "horizon_minutes": 90,
        "max_positions": 1,
        "risk": 3,
        "budget_sol": 0.1,
        "constraints": "Spot only",
        "include_keywords": ["SOL"],
        "exclude_keywords": []
    })
}

/// A configured secret is usable when non-blank and not an unexpanded `${VAR}` token
fn resolve_secret(configured: Option<&str>, env_vars: &[String]) -> Option<String> {
    configured
        .map(str::trim)
        .filter(|value| !value.is_empty() && !value.starts_with("${"))
        .map(str::to_string)
        .or_else(|| {
            env_vars.iter().find_map(|var| {
                env::var(var)
                    .ok()
                    .map(|v| v.trim().to_string())
                    .filter(|v| !v.is_empty())
            })
        })
}

fn validate_base_url(service: &str, base_url: &str) -> Result<()> {
    Url::parse(base_url).map(|_| ()).map_err(|e| {
        ServiceError::configuration(format!(
            "providers.{}.base_url '{}' is not a valid URL: {}",
            service, base_url, e
        ))
    })
}

mod duration_secs {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.as_secs_f64())
    }
}

mod duration_millis {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }
}
