//! Relay fetcher
//!
//! Vendor pages are fetched through an ordered list of relay (CORS proxy)
//! endpoints. Relays are tried one at a time; the first that answers with a
//! 2xx body wins. A failing relay is logged and skipped, never retried.
//! When every relay fails the caller gets `FetcherError::RelayExhausted`.

mod endpoint;
mod transport;

pub use endpoint::{encode_target, FetchStrategy, RelayEndpoint};
pub use transport::{HttpResponse, HttpTransport, ReqwestTransport};

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::RelayConfig;
use crate::errors::{FetcherError, FetcherResult};
use crate::logger::{self, LogTag};
use crate::shutdown::CancelSignal;

/// Outcome of probing a single relay
#[derive(Debug)]
pub struct RelayProbe {
    pub relay: String,
    pub elapsed: Duration,
    pub result: FetcherResult<String>,
}

pub struct RelayFetcher {
    strategies: Vec<Box<dyn FetchStrategy>>,
}

impl RelayFetcher {
    pub fn new(strategies: Vec<Box<dyn FetchStrategy>>) -> Self {
        Self { strategies }
    }

    /// One `RelayEndpoint` per template, sharing a transport
    pub fn from_templates(templates: &[String], transport: Arc<dyn HttpTransport>, timeout: Duration) -> Self {
        let strategies = templates
            .iter()
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .map(|t| Box::new(RelayEndpoint::new(t, transport.clone(), timeout)) as Box<dyn FetchStrategy>)
            .collect();
        Self::new(strategies)
    }

    pub fn from_config(config: &RelayConfig) -> FetcherResult<Self> {
        let timeout = Duration::from_secs(config.timeout_secs);
        let transport = Arc::new(ReqwestTransport::new(&config.user_agent, timeout)?);
        Ok(Self::from_templates(&config.endpoints, transport, timeout))
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Fetch the target's markup through the first relay that succeeds
    pub async fn fetch(&self, target_url: &str) -> FetcherResult<String> {
        self.fetch_inner(target_url, None).await
    }

    /// Like `fetch`, but checks `cancel` before each relay request
    pub async fn fetch_cancellable(&self, target_url: &str, cancel: &CancelSignal) -> FetcherResult<String> {
        self.fetch_inner(target_url, Some(cancel)).await
    }

    async fn fetch_inner(&self, target_url: &str, cancel: Option<&CancelSignal>) -> FetcherResult<String> {
        let total = self.strategies.len();

        for (index, strategy) in self.strategies.iter().enumerate() {
            if cancel.map_or(false, |c| c.is_cancelled()) {
                return Err(FetcherError::Cancelled);
            }

            match strategy.fetch(target_url).await {
                Ok(body) => {
                    logger::debug(
                        LogTag::Relay,
                        &format!(
                            "Relay {}/{} ({}) served {} ({} bytes)",
                            index + 1,
                            total,
                            strategy.name(),
                            target_url,
                            body.len()
                        ),
                    );
                    return Ok(body);
                }
                Err(e) => {
                    logger::warning(
                        LogTag::Relay,
                        &format!("Relay {}/{} ({}) failed: {}", index + 1, total, strategy.name(), e),
                    );
                }
            }
        }

        Err(FetcherError::RelayExhausted {
            url: target_url.to_string(),
            attempts: total,
        })
    }

    /// Try every relay regardless of earlier successes
    pub async fn probe_all(&self, target_url: &str) -> Vec<RelayProbe> {
        let mut reports = Vec::with_capacity(self.strategies.len());
        for strategy in &self.strategies {
            let started = Instant::now();
            let result = strategy.fetch(target_url).await;
            reports.push(RelayProbe {
                relay: strategy.name().to_string(),
                elapsed: started.elapsed(),
                result,
            });
        }
        reports
    }
}
