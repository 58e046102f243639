//! # serp-harvest
//!
//! Batch search results page crawler.
//!
//! For each keyword query, the results page is retrieved through a
//! third-party fetch/render proxy, ranked listings (title, destination link,
//! rank) are extracted from the markup, and the per-query results are
//! aggregated into a [`CrawlBatch`] that can be persisted as a JSON
//! snapshot or exported to CSV.
//!
//! ## Design
//!
//! - [`fetcher::ProxyFetcher`] issues one authenticated proxy request per query
//! - [`extract::SerpParser`] tries an ordered list of CSS-selector strategies
//!   and keeps the first non-empty one; redirect-wrapped links are decoded by
//!   [`link::normalize_link`]
//! - [`aggregator::QueryAggregator`] runs queries with bounded concurrency,
//!   per-query timeout and retry, and reassembles results in input order
//! - A failing query is recorded with an error marker; it never fails the batch
//!
//! Only configuration and validation errors fail a crawl outright, and both
//! are reported before any request is sent.

pub mod aggregator;
pub mod config;
pub mod error;
pub mod extract;
pub mod fetcher;
pub mod link;
pub mod store;
pub mod types;

pub use aggregator::{AggregatorSettings, QueryAggregator};
pub use config::CrawlConfig;
pub use error::{CrawlError, FetchError, Result};
pub use fetcher::{Fetcher, ProxyFetcher};
pub use store::Snapshot;
pub use types::{CrawlBatch, QueryOutcome, QueryStatus, SearchResult};

use tokio_util::sync::CancellationToken;

/// Crawl `queries` through the configured proxy.
///
/// Keeps at most `max_per_query` results per query, or
/// `config.max_per_query` when `None`.
///
/// # Errors
///
/// Returns [`CrawlError::Config`] if the configuration is invalid (for
/// example, no proxy token) and [`CrawlError::Validation`] if there are no
/// non-blank queries. No request is made in either case. Per-query fetch
/// failures are recorded in the returned batch instead.
///
/// # Examples
///
/// ```no_run
/// # async fn example() -> serp_harvest::Result<()> {
/// let config = serp_harvest::CrawlConfig::default().with_env_token();
/// let batch = serp_harvest::crawl(&["oxygen concentrators UK"], Some(5), &config).await?;
/// for (query, outcome) in &batch {
///     for result in &outcome.results {
///         println!("{query} #{}: {} ({})", result.rank, result.title, result.link);
///     }
/// }
/// # Ok(())
/// # }
/// ```
pub async fn crawl<S: AsRef<str>>(
    queries: &[S],
    max_per_query: Option<usize>,
    config: &CrawlConfig,
) -> Result<CrawlBatch> {
    crawl_with_cancel(queries, max_per_query, config, &CancellationToken::new()).await
}

/// Like [`crawl`], but stops dispatching queries once `cancel` fires.
///
/// # Errors
///
/// Same as [`crawl`].
pub async fn crawl_with_cancel<S: AsRef<str>>(
    queries: &[S],
    max_per_query: Option<usize>,
    config: &CrawlConfig,
    cancel: &CancellationToken,
) -> Result<CrawlBatch> {
    config.validate()?;
    let queries = aggregator::prepare_queries(queries)?;
    let fetcher = ProxyFetcher::new(config)?;
    let aggregator = QueryAggregator::from_config(fetcher, config)?;
    aggregator
        .run_with_cancel(
            &queries,
            max_per_query.unwrap_or(config.max_per_query),
            cancel,
        )
        .await
}
