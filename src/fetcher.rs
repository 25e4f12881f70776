/// Batch orchestration: cache lookup, relay fetch, extraction, commit
///
/// Sources are processed strictly one at a time in input order. A fresh
/// cache entry is served without touching the network; everything else is
/// fetched, recorded (as `"Unavailable"` when no price came back) and
/// persisted immediately. Network fetches are spaced by a fixed delay.
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use crate::cache::{now_ms, CacheEntry, FileStore, KeyValueStore, PriceCache, UNAVAILABLE};
use crate::config::Config;
use crate::errors::{FetcherError, FetcherResult};
use crate::extractor::PriceExtractor;
use crate::logger::{self, LogTag};
use crate::relay::RelayFetcher;
use crate::shutdown::CancelSignal;
use crate::sources::{default_sources, Source};

const DEFAULT_BATCH_DELAY: Duration = Duration::from_millis(4000);

/// One row of a batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchResult {
    pub name: String,
    pub url: String,
    pub price: String,
    pub cached: bool,
}

/// Outcome of a single uncached lookup
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PriceLookup {
    pub url: String,
    /// None when no relay answered or no selector matched
    pub price: Option<String>,
    /// Set only when every relay failed
    pub error: Option<String>,
}

pub struct BullionFetcher {
    relay: RelayFetcher,
    extractor: PriceExtractor,
    cache: PriceCache,
    fresh_window: Duration,
    default_sources: Vec<Source>,
    default_delay: Duration,
    last_results: RwLock<HashMap<String, FetchResult>>,
}

impl BullionFetcher {
    pub fn new(relay: RelayFetcher, extractor: PriceExtractor, cache: PriceCache, fresh_window: Duration) -> Self {
        Self {
            relay,
            extractor,
            cache,
            fresh_window,
            default_sources: default_sources(),
            default_delay: DEFAULT_BATCH_DELAY,
            last_results: RwLock::new(HashMap::new()),
        }
    }

    /// Replace the source list and delay used by `fetch_defaults`
    pub fn with_defaults(mut self, sources: Vec<Source>, delay: Duration) -> Self {
        self.default_sources = sources;
        self.default_delay = delay;
        self
    }

    /// Production wiring: reqwest relays and a file store in the data directory
    pub fn from_config(config: &Config) -> FetcherResult<Self> {
        Self::from_config_with_store(config, Arc::new(FileStore::in_data_directory()))
    }

    pub fn from_config_with_store(config: &Config, store: Arc<dyn KeyValueStore>) -> FetcherResult<Self> {
        config.validate()?;

        let relay = RelayFetcher::from_config(&config.relay)?;
        let extractor = PriceExtractor::new(&config.extractor.selectors)?;
        let cache = PriceCache::from_config(&config.cache, store);

        logger::debug(
            LogTag::System,
            &format!(
                "Fetcher ready: {} relays, {} selectors, {} sources",
                relay.len(),
                config.extractor.selectors.len(),
                config.sources.len()
            ),
        );

        Ok(Self::new(relay, extractor, cache, config.fresh_window())
            .with_defaults(config.sources()?, config.batch_delay()))
    }

    pub fn relay(&self) -> &RelayFetcher {
        &self.relay
    }

    pub fn extractor(&self) -> &PriceExtractor {
        &self.extractor
    }

    pub fn cache(&self) -> &PriceCache {
        &self.cache
    }

    pub fn default_sources(&self) -> &[Source] {
        &self.default_sources
    }

    pub fn default_delay(&self) -> Duration {
        self.default_delay
    }

    /// Fetch and extract a single page, bypassing the cache
    pub async fn fetch_price(&self, url: &str) -> PriceLookup {
        match self.lookup(url, None).await {
            Ok(lookup) => lookup,
            Err(e) => PriceLookup {
                url: url.to_string(),
                price: None,
                error: Some(format!("Fetch failed: {}", e)),
            },
        }
    }

    /// Only `Cancelled` is returned as an error
    async fn lookup(&self, url: &str, cancel: Option<&CancelSignal>) -> FetcherResult<PriceLookup> {
        let fetched = match cancel {
            Some(cancel) => self.relay.fetch_cancellable(url, cancel).await,
            None => self.relay.fetch(url).await,
        };

        match fetched {
            Ok(markup) if markup.trim().is_empty() => {
                logger::warning(LogTag::Batch, &format!("Empty page returned for {}", url));
                Ok(PriceLookup {
                    url: url.to_string(),
                    price: None,
                    error: Some("Fetch failed: empty response".to_string()),
                })
            }
            Ok(markup) => Ok(PriceLookup {
                url: url.to_string(),
                price: self.extractor.extract(&markup),
                error: None,
            }),
            Err(FetcherError::Cancelled) => Err(FetcherError::Cancelled),
            Err(e) => {
                logger::warning(LogTag::Batch, &format!("No relay served {}", url));
                Ok(PriceLookup {
                    url: url.to_string(),
                    price: None,
                    error: Some(format!("Fetch failed: {}", e)),
                })
            }
        }
    }

    pub async fn fetch_all(&self, sources: &[Source], delay: Duration) -> Vec<FetchResult> {
        self.run_batch(sources, delay, None).await
    }

    /// Like `fetch_all`, stopping early once `cancel` fires
    ///
    /// Results gathered before cancellation are returned and stay committed.
    pub async fn fetch_all_cancellable(
        &self,
        sources: &[Source],
        delay: Duration,
        cancel: &CancelSignal,
    ) -> Vec<FetchResult> {
        self.run_batch(sources, delay, Some(cancel)).await
    }

    pub async fn fetch_defaults(&self) -> Vec<FetchResult> {
        self.run_batch(&self.default_sources, self.default_delay, None).await
    }

    pub async fn fetch_defaults_cancellable(&self, cancel: &CancelSignal) -> Vec<FetchResult> {
        self.run_batch(&self.default_sources, self.default_delay, Some(cancel)).await
    }

    async fn run_batch(&self, sources: &[Source], delay: Duration, cancel: Option<&CancelSignal>) -> Vec<FetchResult> {
        let started = Instant::now();
        let mut results = Vec::with_capacity(sources.len());
        let mut cancelled = false;

        logger::info(LogTag::Batch, &format!("Fetching {} sources", sources.len()));

        for (index, source) in sources.iter().enumerate() {
            if cancel.map_or(false, |c| c.is_cancelled()) {
                cancelled = true;
                break;
            }

            let now = now_ms();
            let cache = self.cache.load_at(now);
            if let Some(entry) = cache.get(&source.url).filter(|e| e.is_fresh(now, self.fresh_window)) {
                logger::debug(
                    LogTag::Cache,
                    &format!("{}: cached {} ({}s old)", source.name, entry.price, entry.age_ms(now).unwrap_or(0) / 1000),
                );
                results.push(FetchResult {
                    name: source.name.clone(),
                    url: source.url.clone(),
                    price: entry.price.clone(),
                    cached: true,
                });
                continue;
            }

            let lookup = match self.lookup(&source.url, cancel).await {
                Ok(lookup) => lookup,
                Err(_) => {
                    cancelled = true;
                    break;
                }
            };

            let price = lookup.price.unwrap_or_else(|| UNAVAILABLE.to_string());
            logger::info(LogTag::Batch, &format!("{}: {}", source.name, price));
            self.cache.commit(&source.url, CacheEntry::new(price.clone(), now_ms()));

            results.push(FetchResult {
                name: source.name.clone(),
                url: source.url.clone(),
                price,
                cached: false,
            });

            let is_last = index + 1 == sources.len();
            if is_last || delay.is_zero() {
                continue;
            }

            match cancel {
                Some(cancel) => {
                    tokio::select! {
                        _ = tokio::time::sleep(delay) => {}
                        _ = cancel.cancelled() => {
                            cancelled = true;
                            break;
                        }
                    }
                }
                None => tokio::time::sleep(delay).await,
            }
        }

        if cancelled {
            logger::warning(
                LogTag::Batch,
                &format!("Batch cancelled after {}/{} sources", results.len(), sources.len()),
            );
        }

        let cached = results.iter().filter(|r| r.cached).count();
        let unavailable = results.iter().filter(|r| r.price == UNAVAILABLE).count();
        logger::info(
            LogTag::Batch,
            &format!(
                "Batch done in {:.1}s: {} fetched, {} cached, {} unavailable",
                started.elapsed().as_secs_f64(),
                results.len() - cached,
                cached,
                unavailable
            ),
        );

        self.publish(&results);
        results
    }

    fn publish(&self, results: &[FetchResult]) {
        let map = results.iter().map(|r| (r.name.clone(), r.clone())).collect();
        let mut guard = match self.last_results.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = map;
    }

    /// Name -> result map of the most recent batch
    pub fn last_results(&self) -> HashMap<String, FetchResult> {
        match self.last_results.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}
