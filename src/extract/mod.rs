//! Results page extraction: ordered selector strategies with fallback.
//!
//! Each [`ExtractionStrategy`] pulls raw `(title, href)` candidates out of a
//! parsed document. The [`SerpParser`] tries strategies in order and keeps
//! the output of the first one that yields at least one usable result.
//! Strategies are described by [`StrategyConfig`] so they can be replaced
//! from configuration when the results page markup changes.

pub mod parser;
pub mod selector;

pub use parser::{PageStatus, ParsedPage, SerpParser};
pub use selector::SelectorStrategy;

use scraper::Html;
use serde::{Deserialize, Serialize};

/// A raw listing found by a strategy, before filtering and ranking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Trimmed title text (may be empty).
    pub title: String,
    /// The anchor's `href` attribute as found in the markup (may be empty).
    pub href: String,
}

/// A way of locating result listings in a results page.
///
/// Implementations must be `Send + Sync` so a parser can be shared by
/// concurrent queries.
pub trait ExtractionStrategy: Send + Sync {
    /// Short name recorded on results produced by this strategy.
    fn name(&self) -> &str;

    /// Extract candidates from `document` in document order.
    fn extract(&self, document: &Html) -> Vec<Candidate>;
}

/// Where a candidate's link is found relative to the matched item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "from", content = "selector", rename_all = "snake_case")]
pub enum LinkSource {
    /// First descendant of the item matching the selector.
    Descendant(String),
    /// Closest ancestor of the item (or the item itself) matching the selector.
    Ancestor(String),
}

/// Declarative description of a selector-based strategy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyConfig {
    /// Strategy name, recorded in the query status.
    pub name: String,
    /// CSS selector matching one element per listing.
    pub item: String,
    /// CSS selector for the title within the item. `None` uses the item's own text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Where to find the anchor carrying the `href`.
    pub link: LinkSource,
}

/// The built-in strategies for the basic (no-JavaScript) Google results page.
///
/// 1. `primary`: `div.ezO2md` containers, title in `span.CVA68e`, first `a` link.
/// 2. `heading-anchor`: `h3` headings nested in anchors, link from the enclosing `a`.
pub fn default_strategies() -> Vec<StrategyConfig> {
    vec![
        StrategyConfig {
            name: "primary".into(),
            item: "div.ezO2md".into(),
            title: Some("span.CVA68e".into()),
            link: LinkSource::Descendant("a".into()),
        },
        StrategyConfig {
            name: "heading-anchor".into(),
            item: "a h3".into(),
            title: None,
            link: LinkSource::Ancestor("a".into()),
        },
    ]
}

/// Page text that Google shows when a query matched nothing.
pub fn default_no_results_markers() -> Vec<String> {
    vec![
        "did not match any documents".into(),
        "No results found for".into(),
    ]
}
