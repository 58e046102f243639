//! Core types for ranked results and crawl batches.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single ranked listing extracted from a results page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    /// 1-based position within the query's result set.
    pub rank: u32,
    /// The listing title as displayed on the results page.
    pub title: String,
    /// The destination URL, with redirect wrappers removed.
    pub link: String,
}

/// How a query's result set came to be.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum QueryStatus {
    /// Results were extracted by the named strategy.
    Ok {
        /// Name of the extraction strategy that produced the results.
        strategy: String,
    },
    /// The page was fetched and explicitly reported no matches.
    NoResults,
    /// The page was fetched but no strategy matched anything and no
    /// "no results" marker was present. The markup has probably changed.
    PossibleDrift,
    /// Fetching failed after all retries.
    Failed {
        /// Description of the last fetch error.
        error: String,
    },
    /// The batch was cancelled before this query completed.
    Cancelled,
}

impl QueryStatus {
    /// Returns `true` if the page was fetched and parsed.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Ok { .. } | Self::NoResults | Self::PossibleDrift)
    }
}

impl fmt::Display for QueryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ok { strategy } => write!(f, "ok ({strategy})"),
            Self::NoResults => f.write_str("no results"),
            Self::PossibleDrift => f.write_str("no matches (possible markup drift)"),
            Self::Failed { error } => write!(f, "failed: {error}"),
            Self::Cancelled => f.write_str("cancelled"),
        }
    }
}

/// The result set for one query: ranked results plus a status marker.
///
/// Ranks are always `1..=results.len()` in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryOutcome {
    /// Ranked results, truncated to the batch's per-query limit.
    pub results: Vec<SearchResult>,
    /// Whether the results came from a successful fetch.
    #[serde(flatten)]
    pub status: QueryStatus,
}

impl QueryOutcome {
    /// An empty outcome carrying a failure marker.
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            results: Vec::new(),
            status: QueryStatus::Failed {
                error: error.into(),
            },
        }
    }

    /// An empty outcome for a query the batch never finished.
    pub fn cancelled() -> Self {
        Self {
            results: Vec::new(),
            status: QueryStatus::Cancelled,
        }
    }
}

/// The ordered aggregate of one crawl invocation.
///
/// Entries appear in the same order as the input queries, including
/// queries that failed or were cancelled. A batch has no mutators once built.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CrawlBatch {
    entries: Vec<(String, QueryOutcome)>,
}

impl CrawlBatch {
    pub(crate) fn from_entries(entries: Vec<(String, QueryOutcome)>) -> Self {
        Self { entries }
    }

    /// Iterate over `(query, outcome)` pairs in input order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &QueryOutcome)> {
        self.entries.iter().map(|(q, o)| (q.as_str(), o))
    }

    /// The queries in input order.
    pub fn queries(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(q, _)| q.as_str())
    }

    /// The outcome for the first entry whose query equals `query`.
    pub fn get(&self, query: &str) -> Option<&QueryOutcome> {
        self.entries
            .iter()
            .find(|(q, _)| q == query)
            .map(|(_, o)| o)
    }

    /// Number of queries in the batch.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the batch has no queries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total number of results across all queries.
    pub fn result_count(&self) -> usize {
        self.entries.iter().map(|(_, o)| o.results.len()).sum()
    }

    /// Queries whose fetch failed, with their error marker.
    pub fn failures(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().filter_map(|(q, o)| match &o.status {
            QueryStatus::Failed { error } => Some((q.as_str(), error.as_str())),
            _ => None,
        })
    }

    /// Returns `true` if no query in the batch was cancelled.
    pub fn is_complete(&self) -> bool {
        self.entries
            .iter()
            .all(|(_, o)| o.status != QueryStatus::Cancelled)
    }
}

impl<'a> IntoIterator for &'a CrawlBatch {
    type Item = (&'a str, &'a QueryOutcome);
    type IntoIter = Box<dyn Iterator<Item = Self::Item> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}
