//! Fetching results pages through the fetch/render proxy.
//!
//! The proxy is asked to retrieve `{search_url}?q=<query>&hl=<locale>` on
//! our behalf: `GET {endpoint}?token=<token>&url=<target>`. A 200 response
//! body is the page markup; anything else is a [`FetchError`]. Retrying is
//! left to the caller (see [`crate::aggregator`]).

use std::fmt;
use std::future::Future;
use std::time::Duration;

use rand::seq::SliceRandom;

use crate::config::CrawlConfig;
use crate::error::{CrawlError, FetchError};

/// Browser User-Agents sent to the proxy; one is picked per fetcher.
const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 14_6) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.6 Safari/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64; rv:133.0) Gecko/20100101 Firefox/133.0",
];

/// Something that can turn a query into results page markup.
///
/// The aggregator is generic over this trait so batches can run against
/// the real proxy or an in-memory stand-in. Implementations must be
/// `Send + Sync` because queries are fetched concurrently.
pub trait Fetcher: Send + Sync {
    /// Fetch the raw results page markup for `query`.
    ///
    /// # Errors
    ///
    /// Returns a [`FetchError`] for non-200 responses, transport failures
    /// and timeouts.
    fn fetch(&self, query: &str) -> impl Future<Output = Result<String, FetchError>> + Send;
}

/// [`Fetcher`] backed by the Crawlbase (ProxyCrawl) crawling API.
#[derive(Clone)]
pub struct ProxyFetcher {
    client: reqwest::Client,
    endpoint: String,
    token: String,
    search_url: String,
    locale: String,
    timeout: Duration,
}

impl fmt::Debug for ProxyFetcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyFetcher")
            .field("endpoint", &self.endpoint)
            .field("search_url", &self.search_url)
            .field("locale", &self.locale)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl ProxyFetcher {
    /// Create a fetcher from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`CrawlError::Config`] if the token is missing or blank, or
    /// the HTTP client cannot be built. No request is made.
    pub fn new(config: &CrawlConfig) -> Result<Self, CrawlError> {
        let token = config.require_token()?.to_string();

        let user_agent = match config.user_agent {
            Some(ref custom) => custom.clone(),
            None => USER_AGENTS
                .choose(&mut rand::thread_rng())
                .copied()
                .unwrap_or(USER_AGENTS[0])
                .to_string(),
        };

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(user_agent)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .map_err(|e| CrawlError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            token,
            search_url: config.search_url.clone(),
            locale: config.locale.clone(),
            timeout: Duration::from_secs(config.timeout_seconds),
        })
    }

    /// The results page URL the proxy is asked to render for `query`.
    pub fn target_url(&self, query: &str) -> String {
        format!(
            "{}?q={}&hl={}",
            self.search_url,
            urlencoding::encode(query),
            urlencoding::encode(&self.locale)
        )
    }

    fn transport_error(&self, err: reqwest::Error) -> FetchError {
        if err.is_timeout() {
            FetchError::Timeout {
                elapsed: self.timeout,
            }
        } else {
            // The request URL carries the token; keep it out of the message.
            FetchError::Transport {
                cause: err.without_url().to_string(),
            }
        }
    }
}

impl Fetcher for ProxyFetcher {
    async fn fetch(&self, query: &str) -> Result<String, FetchError> {
        tracing::trace!(query, "proxy fetch");

        let target = self.target_url(query);
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("token", self.token.as_str()), ("url", target.as_str())])
            .header("Accept", "text/html,application/xhtml+xml")
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(FetchError::Status {
                status: status.as_u16(),
            });
        }

        let html = response.text().await.map_err(|e| self.transport_error(e))?;

        tracing::trace!(bytes = html.len(), "proxy response received");
        Ok(html)
    }
}
