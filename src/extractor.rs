/// Price extraction from vendor page markup
///
/// Selectors run in priority order over a tolerant HTML parse. For each
/// selector only the first matching element is inspected; the first
/// non-empty trimmed text wins. Nothing checks that the text is a currency
/// value.
use once_cell::sync::Lazy;
use scraper::{Html, Selector};

use crate::config::DEFAULT_PRICE_SELECTORS;
use crate::errors::{FetcherError, FetcherResult};
use crate::logger::{self, LogTag};

/// Which selector produced a price
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceMatch {
    pub selector: String,
    pub price: String,
}

#[derive(Debug)]
pub struct PriceExtractor {
    selectors: Vec<(String, Selector)>,
}

static DEFAULT_EXTRACTOR: Lazy<PriceExtractor> = Lazy::new(PriceExtractor::default);

impl PriceExtractor {
    /// Compile a selector list, most specific first
    pub fn new(selectors: &[String]) -> FetcherResult<Self> {
        let compiled = selectors
            .iter()
            .map(|raw| {
                Selector::parse(raw)
                    .map(|selector| (raw.clone(), selector))
                    .map_err(|e| FetcherError::InvalidSelector {
                        selector: raw.clone(),
                        reason: e.to_string(),
                    })
            })
            .collect::<FetcherResult<Vec<_>>>()?;

        Ok(Self { selectors: compiled })
    }

    pub fn selectors(&self) -> impl Iterator<Item = &str> {
        self.selectors.iter().map(|(raw, _)| raw.as_str())
    }

    pub fn extract(&self, markup: &str) -> Option<String> {
        self.extract_match(markup).map(|m| m.price)
    }

    pub fn extract_match(&self, markup: &str) -> Option<PriceMatch> {
        if markup.trim().is_empty() {
            return None;
        }

        let document = Html::parse_document(markup);

        let found = self.selectors.iter().find_map(|(raw, selector)| {
            let element = document.select(selector).next()?;
            let text = element.text().collect::<String>();
            let text = text.trim();
            if text.is_empty() {
                logger::verbose(LogTag::Extract, &format!("'{}' matched an empty element", raw));
                return None;
            }
            Some(PriceMatch {
                selector: raw.clone(),
                price: text.to_string(),
            })
        });

        match &found {
            Some(m) => logger::debug(LogTag::Extract, &format!("'{}' -> {}", m.selector, m.price)),
            None => logger::debug(LogTag::Extract, "No selector produced a price"),
        }
        found
    }
}

impl Default for PriceExtractor {
    fn default() -> Self {
        let selectors = DEFAULT_PRICE_SELECTORS
            .iter()
            .filter_map(|raw| Selector::parse(raw).ok().map(|s| (raw.to_string(), s)))
            .collect();
        Self { selectors }
    }
}

/// Extract a price with the default selectors
pub fn extract_price(markup: &str) -> Option<String> {
    DEFAULT_EXTRACTOR.extract(markup)
}
