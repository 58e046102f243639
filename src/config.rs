//! Crawl configuration with sensible defaults.
//!
//! [`CrawlConfig`] is built once (from defaults, a TOML file, or both) and
//! passed explicitly to the fetcher, parser and aggregator. The environment
//! is only consulted by [`CrawlConfig::with_env_token`].

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{CrawlError, Result};
use crate::extract::{default_no_results_markers, default_strategies, StrategyConfig};

/// Environment variable holding the fetch/render proxy token.
pub const TOKEN_ENV_VAR: &str = "CRAWLBASE_TOKEN";

/// Default fetch/render proxy endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://api.proxycrawl.com/";

/// Default results page the proxy is asked to render.
pub const DEFAULT_SEARCH_URL: &str = "https://www.google.com/search";

/// Configuration for a crawl batch.
///
/// Use [`Default::default()`] for sensible defaults, or construct with
/// field overrides. Every field is optional in TOML.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlConfig {
    /// Proxy authentication token. Required before any request is made.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// Base URL of the fetch/render proxy.
    pub endpoint: String,
    /// Results page URL; the query and locale are appended as parameters.
    pub search_url: String,
    /// Value of the `hl` locale parameter on the target URL.
    pub locale: String,
    /// Results kept per query when the caller does not specify a limit.
    pub max_per_query: usize,
    /// Maximum number of queries in flight at once.
    pub concurrency: usize,
    /// Per-attempt request timeout in seconds.
    pub timeout_seconds: u64,
    /// Extra attempts after a transient failure (429, 5xx, timeout, transport).
    pub max_retries: u32,
    /// Base delay for exponential backoff between retries, in milliseconds.
    pub retry_backoff_ms: u64,
    /// Random delay range in milliseconds `(min, max)` before each query is dispatched.
    pub request_delay_ms: (u64, u64),
    /// Custom User-Agent string. If `None`, rotates through a built-in list.
    pub user_agent: Option<String>,
    /// Extraction strategies, tried in order until one yields results.
    pub strategies: Vec<StrategyConfig>,
    /// Page text that marks a genuinely empty results page.
    pub no_results_markers: Vec<String>,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            token: None,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            search_url: DEFAULT_SEARCH_URL.to_string(),
            locale: "en-GB".to_string(),
            max_per_query: 10,
            concurrency: 4,
            timeout_seconds: 30,
            max_retries: 2,
            retry_backoff_ms: 500,
            request_delay_ms: (0, 0),
            user_agent: None,
            strategies: default_strategies(),
            no_results_markers: default_no_results_markers(),
        }
    }
}

impl fmt::Debug for CrawlConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CrawlConfig")
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("endpoint", &self.endpoint)
            .field("search_url", &self.search_url)
            .field("locale", &self.locale)
            .field("max_per_query", &self.max_per_query)
            .field("concurrency", &self.concurrency)
            .field("timeout_seconds", &self.timeout_seconds)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff_ms", &self.retry_backoff_ms)
            .field("request_delay_ms", &self.request_delay_ms)
            .field("user_agent", &self.user_agent)
            .field("strategies", &self.strategies)
            .field("no_results_markers", &self.no_results_markers)
            .finish()
    }
}

impl CrawlConfig {
    /// Load configuration from a TOML file, falling back to defaults for missing fields.
    ///
    /// # Errors
    ///
    /// Returns [`CrawlError::Io`] if the file cannot be read, or
    /// [`CrawlError::Config`] if it is not valid TOML for this struct.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| CrawlError::Config(format!("{}: {e}", path.display())))
    }

    /// Fill in the token from `CRAWLBASE_TOKEN` if none is configured.
    pub fn with_env_token(mut self) -> Self {
        if self.token.as_deref().map_or(true, |t| t.trim().is_empty()) {
            self.token = std::env::var(TOKEN_ENV_VAR)
                .ok()
                .filter(|t| !t.trim().is_empty());
        }
        self
    }

    /// Returns the configured token, or a config error if it is absent or blank.
    pub fn require_token(&self) -> Result<&str> {
        match self.token.as_deref().map(str::trim) {
            Some(token) if !token.is_empty() => Ok(token),
            _ => Err(CrawlError::Config(format!(
                "proxy token is missing (set `token` or {TOKEN_ENV_VAR})"
            ))),
        }
    }

    /// Validates this configuration, returning an error if any field is invalid.
    ///
    /// Checks:
    /// - a non-blank token is present
    /// - `endpoint` and `search_url` are absolute URLs
    /// - `max_per_query`, `concurrency` and `timeout_seconds` are greater than 0
    /// - `request_delay_ms.0` is <= `request_delay_ms.1`
    /// - at least one extraction strategy is configured
    pub fn validate(&self) -> Result<()> {
        self.require_token()?;
        for (name, value) in [("endpoint", &self.endpoint), ("search_url", &self.search_url)] {
            url::Url::parse(value)
                .map_err(|e| CrawlError::Config(format!("{name} is not a valid URL: {e}")))?;
        }
        if self.max_per_query == 0 {
            return Err(CrawlError::Config(
                "max_per_query must be greater than 0".into(),
            ));
        }
        if self.concurrency == 0 {
            return Err(CrawlError::Config(
                "concurrency must be greater than 0".into(),
            ));
        }
        if self.timeout_seconds == 0 {
            return Err(CrawlError::Config(
                "timeout_seconds must be greater than 0".into(),
            ));
        }
        if self.request_delay_ms.0 > self.request_delay_ms.1 {
            return Err(CrawlError::Config(
                "request_delay_ms min must be <= max".into(),
            ));
        }
        if self.strategies.is_empty() {
            return Err(CrawlError::Config(
                "at least one extraction strategy must be configured".into(),
            ));
        }
        Ok(())
    }
}
