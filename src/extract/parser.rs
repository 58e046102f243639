//! Best-effort results page parser over an ordered strategy list.

use scraper::Html;

use super::{ExtractionStrategy, SelectorStrategy, StrategyConfig};
use crate::error::CrawlError;
use crate::link::normalize_link;
use crate::types::{QueryStatus, SearchResult};

/// Why a parse produced the results it did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageStatus {
    /// The named strategy produced at least one result.
    Extracted(String),
    /// No strategy matched and the page says there were no results.
    NoResults,
    /// No strategy matched and the page gave no "no results" signal.
    PossibleDrift,
}

impl From<PageStatus> for QueryStatus {
    fn from(status: PageStatus) -> Self {
        match status {
            PageStatus::Extracted(strategy) => Self::Ok { strategy },
            PageStatus::NoResults => Self::NoResults,
            PageStatus::PossibleDrift => Self::PossibleDrift,
        }
    }
}

/// Output of [`SerpParser::parse`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedPage {
    /// Ranked results from the winning strategy (empty if none matched).
    pub results: Vec<SearchResult>,
    /// Which strategy won, or why nothing was extracted.
    pub status: PageStatus,
}

/// Extracts ranked listings from results page markup.
///
/// Strategies are tried in order; the first that yields at least one
/// result with a non-empty title and link wins, and its output is used
/// alone. Parsing never fails: unrecognised markup produces an empty
/// result list.
pub struct SerpParser {
    strategies: Vec<Box<dyn ExtractionStrategy>>,
    no_results_markers: Vec<String>,
}

impl SerpParser {
    /// Build a parser from strategy descriptions.
    ///
    /// # Errors
    ///
    /// Returns [`CrawlError::Config`] if any selector is invalid.
    pub fn from_configs(
        configs: &[StrategyConfig],
        no_results_markers: Vec<String>,
    ) -> Result<Self, CrawlError> {
        let strategies = configs
            .iter()
            .map(|config| {
                SelectorStrategy::compile(config)
                    .map(|s| Box::new(s) as Box<dyn ExtractionStrategy>)
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::with_strategies(strategies, no_results_markers))
    }

    /// Build a parser from already-constructed strategies.
    pub fn with_strategies(
        strategies: Vec<Box<dyn ExtractionStrategy>>,
        no_results_markers: Vec<String>,
    ) -> Self {
        Self {
            strategies,
            no_results_markers,
        }
    }

    /// Parse `markup` into ranked results.
    ///
    /// Ranks start at 1 and follow the winning strategy's document order,
    /// counting only candidates that have both a title and a link.
    pub fn parse(&self, markup: &str) -> ParsedPage {
        let document = Html::parse_document(markup);

        for strategy in &self.strategies {
            let results = rank_candidates(strategy.as_ref(), &document);
            if !results.is_empty() {
                tracing::debug!(
                    strategy = strategy.name(),
                    count = results.len(),
                    "results page parsed"
                );
                return ParsedPage {
                    results,
                    status: PageStatus::Extracted(strategy.name().to_string()),
                };
            }
            tracing::trace!(strategy = strategy.name(), "strategy matched nothing");
        }

        let status = if self
            .no_results_markers
            .iter()
            .any(|marker| markup.contains(marker.as_str()))
        {
            PageStatus::NoResults
        } else {
            tracing::debug!(
                bytes = markup.len(),
                "no strategy matched; results page markup may have changed"
            );
            PageStatus::PossibleDrift
        };

        ParsedPage {
            results: Vec::new(),
            status,
        }
    }
}

fn rank_candidates(strategy: &dyn ExtractionStrategy, document: &Html) -> Vec<SearchResult> {
    strategy
        .extract(document)
        .into_iter()
        .filter(|c| !c.title.is_empty())
        .map(|c| (c.title, normalize_link(&c.href)))
        .filter(|(_, link)| !link.is_empty())
        .zip(1u32..)
        .map(|((title, link), rank)| SearchResult { rank, title, link })
        .collect()
}
