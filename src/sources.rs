/// Named product pages to price
use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::DEFAULT_SOURCES;
use crate::errors::{FetcherError, FetcherResult};

/// A commodity/product pair to query
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Source {
    pub name: String,
    pub url: String,
}

impl Source {
    pub fn new(name: &str, url: &str) -> Self {
        Self {
            name: name.to_string(),
            url: url.to_string(),
        }
    }

    /// A bare URL doubles as its own display name
    pub fn from_url(url: &str) -> Self {
        Self::new(url, url)
    }

    /// Check the URL is an absolute http(s) URL
    pub fn validate(&self) -> FetcherResult<()> {
        let parsed = Url::parse(&self.url).map_err(|e| FetcherError::InvalidSource {
            url: self.url.clone(),
            reason: e.to_string(),
        })?;

        match parsed.scheme() {
            "http" | "https" => Ok(()),
            other => Err(FetcherError::InvalidSource {
                url: self.url.clone(),
                reason: format!("unsupported scheme '{}'", other),
            }),
        }
    }
}

impl From<&str> for Source {
    fn from(url: &str) -> Self {
        Source::from_url(url)
    }
}

impl From<String> for Source {
    fn from(url: String) -> Self {
        Source::from_url(&url)
    }
}

/// The built-in commodity list
pub fn default_sources() -> Vec<Source> {
    DEFAULT_SOURCES
        .iter()
        .map(|(name, url)| Source::new(name, url))
        .collect()
}
