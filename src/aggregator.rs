//! Batch orchestration: bounded fan-out, retry, truncation, ordered reassembly.
//!
//! Queries are fetched and parsed by at most `concurrency` concurrent
//! units. Each unit runs one query to completion (fetch with timeout and
//! retry, parse, truncate). Outcomes are slotted back by input index, so
//! the returned [`CrawlBatch`] always follows input order no matter which
//! query finished first. A failing query becomes a [`QueryStatus::Failed`]
//! entry and never aborts the batch.

use std::time::Duration;

use futures::stream::{self, StreamExt};
use rand::Rng;
use tokio_util::sync::CancellationToken;

use crate::config::CrawlConfig;
use crate::error::{CrawlError, FetchError, Result};
use crate::extract::{PageStatus, ParsedPage, SerpParser};
use crate::fetcher::Fetcher;
use crate::types::{CrawlBatch, QueryOutcome, QueryStatus};

/// Upper bound for a single backoff sleep.
const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Scheduling and retry knobs for a [`QueryAggregator`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregatorSettings {
    /// Maximum number of queries in flight.
    pub concurrency: usize,
    /// Per-attempt fetch timeout.
    pub timeout: Duration,
    /// Extra attempts after a transient failure.
    pub max_retries: u32,
    /// Base delay for exponential backoff.
    pub retry_backoff: Duration,
    /// Random delay range in milliseconds between consecutive dispatches.
    pub request_delay_ms: (u64, u64),
}

impl AggregatorSettings {
    /// Reject settings the scheduler cannot honour.
    ///
    /// # Errors
    ///
    /// Returns [`CrawlError::Config`] if `concurrency` or `timeout` is zero,
    /// or the delay range is inverted.
    pub fn validate(&self) -> Result<()> {
        if self.concurrency == 0 {
            return Err(CrawlError::Config(
                "concurrency must be greater than 0".into(),
            ));
        }
        if self.timeout.is_zero() {
            return Err(CrawlError::Config("timeout must be greater than 0".into()));
        }
        let (min, max) = self.request_delay_ms;
        if min > max {
            return Err(CrawlError::Config(format!(
                "request delay range is inverted ({min}ms > {max}ms)"
            )));
        }
        Ok(())
    }
}

impl Default for AggregatorSettings {
    fn default() -> Self {
        Self::from(&CrawlConfig::default())
    }
}

impl From<&CrawlConfig> for AggregatorSettings {
    fn from(config: &CrawlConfig) -> Self {
        Self {
            concurrency: config.concurrency.max(1),
            timeout: Duration::from_secs(config.timeout_seconds),
            max_retries: config.max_retries,
            retry_backoff: Duration::from_millis(config.retry_backoff_ms),
            request_delay_ms: config.request_delay_ms,
        }
    }
}

/// Runs a batch of queries through a [`Fetcher`] and a [`SerpParser`].
pub struct QueryAggregator<F> {
    fetcher: F,
    parser: SerpParser,
    settings: AggregatorSettings,
}

impl<F: Fetcher> QueryAggregator<F> {
    /// Create an aggregator from its parts.
    ///
    /// # Errors
    ///
    /// Returns [`CrawlError::Config`] if `settings` fail
    /// [`AggregatorSettings::validate`].
    pub fn new(fetcher: F, parser: SerpParser, settings: AggregatorSettings) -> Result<Self> {
        settings.validate()?;
        Ok(Self {
            fetcher,
            parser,
            settings,
        })
    }

    /// Create an aggregator using the strategies and settings in `config`.
    ///
    /// # Errors
    ///
    /// Returns [`CrawlError::Config`] if a configured selector or a
    /// scheduling setting is invalid.
    pub fn from_config(fetcher: F, config: &CrawlConfig) -> Result<Self> {
        let parser =
            SerpParser::from_configs(&config.strategies, config.no_results_markers.clone())?;
        Self::new(fetcher, parser, AggregatorSettings::from(config))
    }

    /// Crawl every query and keep the top `max_per_query` results of each.
    ///
    /// Queries are trimmed and blank entries dropped. The returned batch has
    /// one entry per remaining query, in input order.
    ///
    /// # Errors
    ///
    /// Returns [`CrawlError::Validation`] if no non-blank query remains or
    /// `max_per_query` is zero. Per-query failures are recorded in the batch.
    pub async fn run<S: AsRef<str>>(&self, queries: &[S], max_per_query: usize) -> Result<CrawlBatch> {
        self.run_with_cancel(queries, max_per_query, &CancellationToken::new())
            .await
    }

    /// Like [`run`](Self::run), but stops early when `cancel` fires.
    ///
    /// After cancellation no further queries are started and queries in
    /// flight are abandoned. Both are recorded as
    /// [`QueryStatus::Cancelled`] with no results; results already
    /// collected, including one that completes as cancellation fires, are
    /// kept.
    ///
    /// # Errors
    ///
    /// Same as [`run`](Self::run).
    pub async fn run_with_cancel<S: AsRef<str>>(
        &self,
        queries: &[S],
        max_per_query: usize,
        cancel: &CancellationToken,
    ) -> Result<CrawlBatch> {
        let queries = prepare_queries(queries)?;
        if max_per_query == 0 {
            return Err(CrawlError::Validation(
                "max_per_query must be greater than 0".into(),
            ));
        }

        tracing::info!(
            queries = queries.len(),
            max_per_query,
            concurrency = self.settings.concurrency,
            "crawl batch started"
        );

        let mut slots: Vec<Option<QueryOutcome>> = vec![None; queries.len()];
        {
            // The delay stage sits upstream of the buffer so that query
            // starts are spaced out, not just postponed.
            let outcomes = stream::iter(queries.iter().enumerate())
                .then(move |(index, query)| async move {
                    if index > 0 {
                        if let Some(delay) = self.dispatch_delay() {
                            tokio::select! {
                                () = tokio::time::sleep(delay) => {}
                                () = cancel.cancelled() => {}
                            }
                        }
                    }
                    (index, query)
                })
                .take_while(move |_| futures::future::ready(!cancel.is_cancelled()))
                .map(move |(index, query)| async move {
                    let outcome = tokio::select! {
                        biased;
                        outcome = self.crawl_one(query, max_per_query) => outcome,
                        () = cancel.cancelled() => QueryOutcome::cancelled(),
                    };
                    (index, outcome)
                })
                .buffer_unordered(self.settings.concurrency);
            let mut outcomes = std::pin::pin!(outcomes);

            while let Some((index, outcome)) = outcomes.next().await {
                slots[index] = Some(outcome);
            }
        }

        let entries: Vec<(String, QueryOutcome)> = queries
            .into_iter()
            .zip(slots)
            .map(|(query, slot)| (query, slot.unwrap_or_else(QueryOutcome::cancelled)))
            .collect();
        let batch = CrawlBatch::from_entries(entries);

        tracing::info!(
            queries = batch.len(),
            results = batch.result_count(),
            failed = batch.failures().count(),
            complete = batch.is_complete(),
            "crawl batch finished"
        );
        Ok(batch)
    }

    /// Fetch, parse and truncate one query. Never fails.
    async fn crawl_one(&self, query: &str, max_per_query: usize) -> QueryOutcome {
        match self.fetch_with_retry(query).await {
            Ok(html) => {
                let ParsedPage {
                    mut results,
                    status,
                } = self.parser.parse(&html);
                results.truncate(max_per_query);
                if status == PageStatus::PossibleDrift {
                    tracing::warn!(query, "no listings extracted; results page markup may have changed");
                }
                QueryOutcome {
                    results,
                    status: QueryStatus::from(status),
                }
            }
            Err(err) => {
                tracing::warn!(query, error = %err, "query failed");
                QueryOutcome::failed(err.to_string())
            }
        }
    }

    async fn fetch_with_retry(&self, query: &str) -> std::result::Result<String, FetchError> {
        let mut attempt = 0;
        loop {
            let result = tokio::time::timeout(self.settings.timeout, self.fetcher.fetch(query))
                .await
                .unwrap_or_else(|_| {
                    Err(FetchError::Timeout {
                        elapsed: self.settings.timeout,
                    })
                });

            match result {
                Ok(html) => return Ok(html),
                Err(err) if err.is_transient() && attempt < self.settings.max_retries => {
                    let delay = backoff_delay(self.settings.retry_backoff, attempt);
                    tracing::debug!(
                        query,
                        attempt = attempt + 1,
                        error = %err,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        "transient fetch failure; retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    fn dispatch_delay(&self) -> Option<Duration> {
        let (min, max) = self.settings.request_delay_ms;
        if max == 0 {
            return None;
        }
        let ms = rand::thread_rng().gen_range(min..=max);
        Some(Duration::from_millis(ms))
    }
}

/// Trim queries and drop blank ones.
///
/// # Errors
///
/// Returns [`CrawlError::Validation`] if nothing is left.
pub fn prepare_queries<S: AsRef<str>>(queries: &[S]) -> Result<Vec<String>> {
    let prepared: Vec<String> = queries
        .iter()
        .map(|q| q.as_ref().trim())
        .filter(|q| !q.is_empty())
        .map(str::to_string)
        .collect();

    if prepared.is_empty() {
        return Err(CrawlError::Validation("no keywords provided".into()));
    }
    if prepared.len() < queries.len() {
        tracing::debug!(
            dropped = queries.len() - prepared.len(),
            "blank queries removed"
        );
    }
    Ok(prepared)
}

/// Exponential backoff with up to 50% random jitter, capped at [`MAX_BACKOFF`].
fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    let exp = base.saturating_mul(2u32.saturating_pow(attempt));
    let jitter_cap = u64::try_from(exp.as_millis() / 2).unwrap_or(u64::MAX);
    let jitter = if jitter_cap == 0 {
        0
    } else {
        rand::thread_rng().gen_range(0..=jitter_cap)
    };
    exp.saturating_add(Duration::from_millis(jitter))
        .min(MAX_BACKOFF)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::{default_no_results_markers, default_strategies};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Scripted fetcher: per-query queue of responses, plus a call counter.
    #[derive(Default)]
    struct ScriptedFetcher {
        responses: Mutex<HashMap<String, Vec<std::result::Result<String, FetchError>>>>,
        delays: HashMap<String, Duration>,
        calls: AtomicUsize,
        starts: Mutex<Vec<tokio::time::Instant>>,
    }

    impl ScriptedFetcher {
        fn respond(self, query: &str, response: std::result::Result<String, FetchError>) -> Self {
            self.responses
                .lock()
                .unwrap()
                .entry(query.to_string())
                .or_default()
                .push(response);
            self
        }

        fn delay(mut self, query: &str, delay: Duration) -> Self {
            self.delays.insert(query.to_string(), delay);
            self
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn starts(&self) -> Vec<tokio::time::Instant> {
            let mut starts = self.starts.lock().unwrap().clone();
            starts.sort();
            starts
        }
    }

    impl Fetcher for ScriptedFetcher {
        async fn fetch(&self, query: &str) -> std::result::Result<String, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.starts.lock().unwrap().push(tokio::time::Instant::now());
            if let Some(delay) = self.delays.get(query) {
                tokio::time::sleep(*delay).await;
            }
            let next = {
                let mut responses = self.responses.lock().unwrap();
                match responses.get_mut(query) {
                    Some(queue) if queue.len() > 1 => queue.remove(0),
                    Some(queue) => queue[0].clone(),
                    None => Ok(String::new()),
                }
            };
            next
        }
    }

    fn page(count: usize, prefix: &str) -> String {
        let items: String = (1..=count)
            .map(|i| {
                format!(
                    r#"<div class="ezO2md"><a href="/url?q=https%3A%2F%2F{prefix}{i}.example%2F&amp;sa=U"><span class="CVA68e">{prefix} {i}</span></a></div>"#
                )
            })
            .collect();
        format!("<html><body>{items}</body></html>")
    }

    fn settings() -> AggregatorSettings {
        AggregatorSettings {
            concurrency: 4,
            timeout: Duration::from_secs(5),
            max_retries: 2,
            retry_backoff: Duration::from_millis(10),
            request_delay_ms: (0, 0),
        }
    }

    fn aggregator(fetcher: ScriptedFetcher, settings: AggregatorSettings) -> QueryAggregator<ScriptedFetcher> {
        let parser = SerpParser::from_configs(&default_strategies(), default_no_results_markers())
            .expect("defaults compile");
        QueryAggregator::new(fetcher, parser, settings).expect("valid settings")
    }

    fn rejected_settings(settings: AggregatorSettings) -> String {
        let parser = SerpParser::from_configs(&default_strategies(), default_no_results_markers())
            .expect("defaults compile");
        match QueryAggregator::new(ScriptedFetcher::default(), parser, settings) {
            Err(CrawlError::Config(msg)) => msg,
            Err(other) => panic!("expected config error, got {other}"),
            Ok(_) => panic!("settings were accepted"),
        }
    }

    #[tokio::test]
    async fn empty_query_list_is_validation_error() {
        let agg = aggregator(ScriptedFetcher::default(), settings());
        let err = agg.run::<&str>(&[], 10).await.unwrap_err();
        assert!(matches!(err, CrawlError::Validation(_)));
        assert_eq!(agg.fetcher.calls(), 0);
    }

    #[tokio::test]
    async fn blank_queries_are_validation_error() {
        let agg = aggregator(ScriptedFetcher::default(), settings());
        let err = agg.run(&["  ", "\t", ""], 10).await.unwrap_err();
        assert!(matches!(err, CrawlError::Validation(_)));
        assert_eq!(agg.fetcher.calls(), 0);
    }

    #[tokio::test]
    async fn zero_max_per_query_is_validation_error() {
        let agg = aggregator(ScriptedFetcher::default(), settings());
        let err = agg.run(&["a"], 0).await.unwrap_err();
        assert!(err.to_string().contains("max_per_query"));
    }

    #[tokio::test]
    async fn truncates_to_top_results_without_reranking() {
        let fetcher = ScriptedFetcher::default().respond("widgets", Ok(page(10, "w")));
        let agg = aggregator(fetcher, settings());

        let batch = agg.run(&["widgets"], 3).await.expect("batch");
        let outcome = batch.get("widgets").expect("entry");
        let ranks: Vec<u32> = outcome.results.iter().map(|r| r.rank).collect();
        let titles: Vec<&str> = outcome.results.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(ranks, vec![1, 2, 3]);
        assert_eq!(titles, vec!["w 1", "w 2", "w 3"]);
        assert_eq!(
            outcome.status,
            QueryStatus::Ok {
                strategy: "primary".into()
            }
        );
    }

    #[tokio::test]
    async fn queries_are_trimmed_and_duplicates_kept() {
        let fetcher = ScriptedFetcher::default().respond("dup", Ok(page(2, "d")));
        let agg = aggregator(fetcher, settings());

        let batch = agg.run(&[" dup ", "", "dup"], 10).await.expect("batch");
        let queries: Vec<&str> = batch.queries().collect();
        assert_eq!(queries, vec!["dup", "dup"]);
        assert_eq!(batch.result_count(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn order_preserved_when_later_queries_finish_first() {
        let fetcher = ScriptedFetcher::default()
            .respond("slow", Ok(page(1, "s")))
            .delay("slow", Duration::from_secs(3))
            .respond("medium", Ok(page(1, "m")))
            .delay("medium", Duration::from_secs(1))
            .respond("fast", Ok(page(1, "f")));
        let agg = aggregator(fetcher, settings());

        let batch = agg.run(&["slow", "medium", "fast"], 10).await.expect("batch");
        let queries: Vec<&str> = batch.queries().collect();
        assert_eq!(queries, vec!["slow", "medium", "fast"]);
        assert_eq!(batch.get("slow").unwrap().results[0].title, "s 1");
    }

    #[tokio::test]
    async fn failure_is_isolated_and_recorded() {
        let fetcher = ScriptedFetcher::default()
            .respond("good", Ok(page(2, "g")))
            .respond("bad", Err(FetchError::Status { status: 403 }));
        let agg = aggregator(fetcher, settings());

        let batch = agg.run(&["bad", "good"], 10).await.expect("batch");
        let queries: Vec<&str> = batch.queries().collect();
        assert_eq!(queries, vec!["bad", "good"]);

        let bad = batch.get("bad").unwrap();
        assert!(bad.results.is_empty());
        assert_eq!(
            bad.status,
            QueryStatus::Failed {
                error: "proxy returned HTTP 403".into()
            }
        );
        assert_eq!(batch.get("good").unwrap().results.len(), 2);
        // 403 is not transient: exactly one attempt for "bad".
        assert_eq!(agg.fetcher.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn transient_failures_are_retried() {
        let fetcher = ScriptedFetcher::default()
            .respond("flaky", Err(FetchError::Status { status: 503 }))
            .respond("flaky", Err(FetchError::Status { status: 429 }))
            .respond("flaky", Ok(page(1, "ok")));
        let agg = aggregator(fetcher, settings());

        let batch = agg.run(&["flaky"], 10).await.expect("batch");
        assert_eq!(batch.get("flaky").unwrap().results.len(), 1);
        assert_eq!(agg.fetcher.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn retries_are_bounded() {
        let fetcher =
            ScriptedFetcher::default().respond("down", Err(FetchError::Status { status: 502 }));
        let agg = aggregator(fetcher, settings());

        let batch = agg.run(&["down"], 10).await.expect("batch");
        assert!(matches!(
            batch.get("down").unwrap().status,
            QueryStatus::Failed { .. }
        ));
        assert_eq!(agg.fetcher.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_fetch_times_out() {
        let fetcher = ScriptedFetcher::default()
            .respond("stuck", Ok(page(1, "x")))
            .delay("stuck", Duration::from_secs(60));
        let agg = aggregator(
            fetcher,
            AggregatorSettings {
                max_retries: 0,
                ..settings()
            },
        );

        let batch = agg.run(&["stuck"], 10).await.expect("batch");
        assert_eq!(
            batch.get("stuck").unwrap().status,
            QueryStatus::Failed {
                error: "proxy request timed out after 5s".into()
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn sub_second_timeout_is_reported_in_millis() {
        let fetcher = ScriptedFetcher::default()
            .respond("stuck", Ok(page(1, "x")))
            .delay("stuck", Duration::from_secs(2));
        let agg = aggregator(
            fetcher,
            AggregatorSettings {
                timeout: Duration::from_millis(250),
                max_retries: 0,
                ..settings()
            },
        );

        let batch = agg.run(&["stuck"], 10).await.expect("batch");
        assert_eq!(
            batch.get("stuck").unwrap().status,
            QueryStatus::Failed {
                error: "proxy request timed out after 250ms".into()
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn request_delay_spaces_out_dispatches() {
        let agg = aggregator(
            ScriptedFetcher::default(),
            AggregatorSettings {
                request_delay_ms: (600, 600),
                ..settings()
            },
        );

        let batch = agg.run(&["a", "b", "c", "d"], 10).await.expect("batch");
        assert_eq!(batch.len(), 4);

        let starts = agg.fetcher.starts();
        assert_eq!(starts.len(), 4);
        for pair in starts.windows(2) {
            assert!(
                pair[1] - pair[0] >= Duration::from_millis(600),
                "dispatches only {:?} apart",
                pair[1] - pair[0]
            );
        }
    }

    #[tokio::test(start_paused = true)]
    async fn request_delay_does_not_hold_back_first_query() {
        let agg = aggregator(
            ScriptedFetcher::default(),
            AggregatorSettings {
                request_delay_ms: (600, 600),
                ..settings()
            },
        );
        let began = tokio::time::Instant::now();

        agg.run(&["only"], 10).await.expect("batch");
        assert_eq!(agg.fetcher.starts(), vec![began]);
    }

    #[test]
    fn zero_concurrency_is_rejected() {
        let msg = rejected_settings(AggregatorSettings {
            concurrency: 0,
            ..settings()
        });
        assert!(msg.contains("concurrency"));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let msg = rejected_settings(AggregatorSettings {
            timeout: Duration::ZERO,
            ..settings()
        });
        assert!(msg.contains("timeout"));
    }

    #[test]
    fn inverted_delay_range_is_rejected() {
        let msg = rejected_settings(AggregatorSettings {
            request_delay_ms: (500, 100),
            ..settings()
        });
        assert!(msg.contains("delay"));
    }

    #[tokio::test]
    async fn unmatched_page_is_flagged_as_drift() {
        let fetcher = ScriptedFetcher::default()
            .respond("odd", Ok("<html><body><p>new layout</p></body></html>".into()));
        let agg = aggregator(fetcher, settings());

        let batch = agg.run(&["odd"], 10).await.expect("batch");
        assert_eq!(batch.get("odd").unwrap().status, QueryStatus::PossibleDrift);
    }

    #[tokio::test]
    async fn cancelled_before_start_returns_all_cancelled() {
        let agg = aggregator(ScriptedFetcher::default(), settings());
        let cancel = CancellationToken::new();
        cancel.cancel();

        let batch = agg
            .run_with_cancel(&["a", "b"], 10, &cancel)
            .await
            .expect("batch");
        assert_eq!(batch.len(), 2);
        assert!(!batch.is_complete());
        assert!(batch.iter().all(|(_, o)| o.status == QueryStatus::Cancelled));
        assert_eq!(agg.fetcher.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_keeps_collected_results() {
        let fetcher = ScriptedFetcher::default()
            .respond("first", Ok(page(2, "f")))
            .respond("second", Ok(page(2, "s")))
            .delay("second", Duration::from_secs(10))
            .respond("third", Ok(page(2, "t")));
        let agg = aggregator(
            fetcher,
            AggregatorSettings {
                concurrency: 1,
                ..settings()
            },
        );
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            trigger.cancel();
        });

        let batch = agg
            .run_with_cancel(&["first", "second", "third"], 10, &cancel)
            .await
            .expect("batch");

        let queries: Vec<&str> = batch.queries().collect();
        assert_eq!(queries, vec!["first", "second", "third"]);
        assert_eq!(batch.get("first").unwrap().results.len(), 2);
        let second = batch.get("second").unwrap();
        assert_eq!(second.status, QueryStatus::Cancelled);
        assert!(second.results.is_empty());
        assert_eq!(batch.get("third").unwrap().status, QueryStatus::Cancelled);
        assert_eq!(agg.fetcher.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn result_completing_as_cancellation_fires_is_kept() {
        let fetcher = ScriptedFetcher::default()
            .respond("edge", Ok(page(2, "e")))
            .delay("edge", Duration::from_secs(1));
        let agg = aggregator(fetcher, settings());
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            trigger.cancel();
        });

        let batch = agg
            .run_with_cancel(&["edge"], 10, &cancel)
            .await
            .expect("batch");
        let edge = batch.get("edge").unwrap();
        assert_eq!(edge.results.len(), 2);
        assert_eq!(
            edge.status,
            QueryStatus::Ok {
                strategy: "primary".into()
            }
        );
    }

    #[test]
    fn backoff_grows_and_is_capped() {
        let base = Duration::from_millis(100);
        let first = backoff_delay(base, 0);
        assert!(first >= base && first <= Duration::from_millis(150));
        let third = backoff_delay(base, 2);
        assert!(third >= Duration::from_millis(400) && third <= Duration::from_millis(600));
        assert_eq!(backoff_delay(base, 20), MAX_BACKOFF);
    }

    #[test]
    fn prepare_queries_trims_and_filters() {
        let prepared = prepare_queries(&["  a widget ", "", "b"]).expect("prepared");
        assert_eq!(prepared, vec!["a widget", "b"]);
    }

    #[test]
    fn settings_follow_config() {
        let config = CrawlConfig {
            concurrency: 8,
            timeout_seconds: 12,
            max_retries: 1,
            retry_backoff_ms: 250,
            ..Default::default()
        };
        let settings = AggregatorSettings::from(&config);
        assert_eq!(settings.concurrency, 8);
        assert_eq!(settings.timeout, Duration::from_secs(12));
        assert_eq!(settings.max_retries, 1);
        assert_eq!(settings.retry_backoff, Duration::from_millis(250));
    }
}
