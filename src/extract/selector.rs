//! CSS-selector strategy compiled from a [`StrategyConfig`].

use scraper::{ElementRef, Html, Selector};

use super::{Candidate, ExtractionStrategy, LinkSource, StrategyConfig};
use crate::error::CrawlError;

/// Compiled link lookup.
#[derive(Debug)]
enum LinkLookup {
    Descendant(Selector),
    Ancestor(Selector),
}

/// An [`ExtractionStrategy`] driven by CSS selectors.
#[derive(Debug)]
pub struct SelectorStrategy {
    name: String,
    item: Selector,
    title: Option<Selector>,
    link: LinkLookup,
}

impl SelectorStrategy {
    /// Compile a strategy description.
    ///
    /// # Errors
    ///
    /// Returns [`CrawlError::Config`] if any selector is invalid.
    pub fn compile(config: &StrategyConfig) -> Result<Self, CrawlError> {
        let item = parse_selector(&config.name, "item", &config.item)?;
        let title = config
            .title
            .as_deref()
            .map(|sel| parse_selector(&config.name, "title", sel))
            .transpose()?;
        let link = match &config.link {
            LinkSource::Descendant(sel) => {
                LinkLookup::Descendant(parse_selector(&config.name, "link", sel)?)
            }
            LinkSource::Ancestor(sel) => {
                LinkLookup::Ancestor(parse_selector(&config.name, "link", sel)?)
            }
        };

        Ok(Self {
            name: config.name.clone(),
            item,
            title,
            link,
        })
    }

    fn title_of(&self, item: ElementRef<'_>) -> String {
        let source = match &self.title {
            Some(sel) => item.select(sel).next(),
            None => Some(item),
        };
        source
            .map(|el| el.text().collect::<String>().trim().to_string())
            .unwrap_or_default()
    }

    fn href_of(&self, item: ElementRef<'_>) -> String {
        let anchor = match &self.link {
            LinkLookup::Descendant(sel) => item.select(sel).next(),
            LinkLookup::Ancestor(sel) => std::iter::once(item)
                .chain(item.ancestors().filter_map(ElementRef::wrap))
                .find(|el| sel.matches(el)),
        };
        anchor
            .and_then(|a| a.value().attr("href"))
            .map(|href| href.trim().to_string())
            .unwrap_or_default()
    }
}

impl ExtractionStrategy for SelectorStrategy {
    fn name(&self) -> &str {
        &self.name
    }

    fn extract(&self, document: &Html) -> Vec<Candidate> {
        document
            .select(&self.item)
            .map(|item| Candidate {
                title: self.title_of(item),
                href: self.href_of(item),
            })
            .collect()
    }
}

fn parse_selector(strategy: &str, field: &str, selector: &str) -> Result<Selector, CrawlError> {
    Selector::parse(selector).map_err(|e| {
        CrawlError::Config(format!(
            "strategy `{strategy}`: invalid {field} selector `{selector}`: {e:?}"
        ))
    })
}
