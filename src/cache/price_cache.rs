/// Persisted URL -> price cache with a freshness window and an expiry horizon
///
/// The whole mapping lives under a single store key as JSON:
/// `{ "<url>": { "price": "<string>", "t": <epoch millis> } }`.
/// Entries are read one by one: an unreadable entry is dropped on its own,
/// an unreadable blob degrades to an empty cache. Write failures are
/// reported as `SaveOutcome::Failed` and logged, never propagated.
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use super::store::KeyValueStore;
use crate::config::CacheConfig;
use crate::logger::{self, LogTag};

/// Price recorded when a page could not be fetched or no price was found
pub const UNAVAILABLE: &str = "Unavailable";

/// Current wall-clock time in epoch milliseconds
pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

fn duration_ms(duration: Duration) -> i64 {
    i64::try_from(duration.as_millis()).unwrap_or(i64::MAX)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub price: String,
    /// Epoch milliseconds of the fetch attempt; entries without one never
    /// count as fresh and never expire
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub t: Option<i64>,
}

impl CacheEntry {
    pub fn new(price: impl Into<String>, t: i64) -> Self {
        Self {
            price: price.into(),
            t: Some(t),
        }
    }

    pub fn age_ms(&self, now_ms: i64) -> Option<i64> {
        self.t.map(|t| now_ms.saturating_sub(t))
    }

    /// Young enough to serve without refetching
    pub fn is_fresh(&self, now_ms: i64, window: Duration) -> bool {
        self.age_ms(now_ms).map_or(false, |age| age < duration_ms(window))
    }

    /// Old enough to drop on load
    pub fn is_expired(&self, now_ms: i64, horizon: Duration) -> bool {
        self.age_ms(now_ms).map_or(false, |age| age > duration_ms(horizon))
    }

    pub fn is_unavailable(&self) -> bool {
        self.price == UNAVAILABLE
    }

    pub fn fetched_at(&self) -> Option<DateTime<Utc>> {
        self.t.and_then(|t| Utc.timestamp_millis_opt(t).single())
    }
}

/// URL-ordered mapping of cache entries
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PriceCacheStore {
    entries: BTreeMap<String, CacheEntry>,
}

impl PriceCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, url: &str) -> Option<&CacheEntry> {
        self.entries.get(url)
    }

    pub fn insert(&mut self, url: &str, entry: CacheEntry) {
        self.entries.insert(url.to_string(), entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &CacheEntry)> {
        self.entries.iter()
    }

    /// Drop expired entries, returning how many were removed
    pub fn prune(&mut self, now_ms: i64, horizon: Duration) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired(now_ms, horizon));
        before - self.entries.len()
    }
}

/// Result of a cache write
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Persisted,
    /// Empty cache and nothing stored yet; no write issued
    Skipped,
    Failed(String),
}

impl SaveOutcome {
    pub fn is_persisted(&self) -> bool {
        matches!(self, SaveOutcome::Persisted)
    }
}

pub struct PriceCache {
    store: Arc<dyn KeyValueStore>,
    key: String,
    expiry_horizon: Duration,
}

impl PriceCache {
    pub fn new(store: Arc<dyn KeyValueStore>, key: &str, expiry_horizon: Duration) -> Self {
        Self {
            store,
            key: key.to_string(),
            expiry_horizon,
        }
    }

    pub fn from_config(config: &CacheConfig, store: Arc<dyn KeyValueStore>) -> Self {
        Self::new(store, &config.store_key, Duration::from_secs(config.expiry_horizon_secs))
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn expiry_horizon(&self) -> Duration {
        self.expiry_horizon
    }

    pub fn load(&self) -> PriceCacheStore {
        self.load_at(now_ms())
    }

    /// Read the cache, pruning expired entries
    ///
    /// If anything was pruned the reduced cache is written back once.
    pub fn load_at(&self, now_ms: i64) -> PriceCacheStore {
        let mut cache = self.read();
        let pruned = cache.prune(now_ms, self.expiry_horizon);

        if pruned > 0 {
            logger::debug(
                LogTag::Cache,
                &format!("Pruned {} expired entries from '{}'", pruned, self.key),
            );
            self.save(&cache);
        }
        cache
    }

    pub fn save(&self, cache: &PriceCacheStore) -> SaveOutcome {
        if cache.is_empty() {
            if let Ok(None) = self.store.get(&self.key) {
                return SaveOutcome::Skipped;
            }
        }

        let json = match serde_json::to_string(cache) {
            Ok(json) => json,
            Err(e) => {
                logger::warning(LogTag::Cache, &format!("Failed to serialize price cache: {}", e));
                return SaveOutcome::Failed(e.to_string());
            }
        };

        match self.store.set(&self.key, &json) {
            Ok(()) => {
                logger::verbose(
                    LogTag::Cache,
                    &format!("Saved {} entries under '{}'", cache.len(), self.key),
                );
                SaveOutcome::Persisted
            }
            Err(e) => {
                logger::warning(LogTag::Cache, &format!("Failed to persist price cache: {}", e));
                SaveOutcome::Failed(e.to_string())
            }
        }
    }

    /// Read-modify-write a single entry
    pub fn commit(&self, url: &str, entry: CacheEntry) -> SaveOutcome {
        let mut cache = self.read();
        cache.prune(now_ms(), self.expiry_horizon);
        cache.insert(url, entry);
        self.save(&cache)
    }

    pub fn clear(&self) -> SaveOutcome {
        self.save(&PriceCacheStore::new())
    }

    fn read(&self) -> PriceCacheStore {
        let raw = match self.store.get(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return PriceCacheStore::new(),
            Err(e) => {
                logger::warning(LogTag::Cache, &format!("Failed to read price cache: {}", e));
                return PriceCacheStore::new();
            }
        };

        let values = match serde_json::from_str::<BTreeMap<String, serde_json::Value>>(&raw) {
            Ok(values) => values,
            Err(e) => {
                logger::warning(
                    LogTag::Cache,
                    &format!("Discarding unreadable price cache '{}': {}", self.key, e),
                );
                return PriceCacheStore::new();
            }
        };

        let mut cache = PriceCacheStore::new();
        for (url, value) in values {
            match serde_json::from_value::<CacheEntry>(value) {
                Ok(entry) => cache.insert(&url, entry),
                Err(e) => logger::warning(
                    LogTag::Cache,
                    &format!("Dropping unreadable cache entry for {}: {}", url, e),
                ),
            }
        }
        cache
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::store::MemoryStore;
    use crate::errors::{FetcherError, FetcherResult};

    const KEY: &str = "bullion_prices_v1";
    const HOUR_MS: i64 = 60 * 60 * 1000;
    const DAY: Duration = Duration::from_secs(24 * 60 * 60);

    fn cache_with(store: &Arc<MemoryStore>) -> PriceCache {
        PriceCache::new(store.clone(), KEY, DAY)
    }

    struct FailingStore;

    impl KeyValueStore for FailingStore {
        fn get(&self, _key: &str) -> FetcherResult<Option<String>> {
            Err(FetcherError::Persistence("disk unavailable".to_string()))
        }

        fn set(&self, _key: &str, _value: &str) -> FetcherResult<()> {
            Err(FetcherError::Persistence("quota exceeded".to_string()))
        }
    }

    #[test]
    fn test_entry_horizon_boundaries() {
        let entry = CacheEntry::new("£1.00", 0);
        assert!(entry.is_fresh(HOUR_MS - 1, Duration::from_secs(3600)));
        assert!(!entry.is_fresh(HOUR_MS, Duration::from_secs(3600)));
        assert!(!entry.is_expired(24 * HOUR_MS, DAY));
        assert!(entry.is_expired(24 * HOUR_MS + 1, DAY));
    }

    #[test]
    fn test_load_prunes_and_saves_once() {
        let now = 100 * HOUR_MS;
        let store = Arc::new(MemoryStore::new());
        let mut seeded = PriceCacheStore::new();
        seeded.insert("https://shop/fresh", CacheEntry::new("£10.00", now - HOUR_MS / 6));
        seeded.insert("https://shop/stale", CacheEntry::new("£20.00", now - 25 * HOUR_MS));
        store.seed(KEY, &serde_json::to_string(&seeded).unwrap());

        let loaded = cache_with(&store).load_at(now);

        assert_eq!(loaded.len(), 1);
        assert!(loaded.get("https://shop/fresh").is_some());
        assert!(loaded.get("https://shop/stale").is_none());
        assert_eq!(store.write_count(), 1);

        let persisted: PriceCacheStore = serde_json::from_str(&store.get(KEY).unwrap().unwrap()).unwrap();
        assert_eq!(persisted, loaded);
    }

    #[test]
    fn test_load_without_expired_entries_does_not_write() {
        let store = Arc::new(MemoryStore::new());
        store.seed(KEY, r#"{"https://shop/a":{"price":"£1","t":1000}}"#);

        let loaded = cache_with(&store).load_at(2000);
        assert_eq!(loaded.len(), 1);
        assert_eq!(store.write_count(), 0);
    }

    #[test]
    fn test_save_of_load_is_idempotent() {
        let raw = r#"{"https://shop/a":{"price":"£1,200.00","t":1000},"https://shop/b":{"price":"Unavailable","t":2000}}"#;
        let store = Arc::new(MemoryStore::new());
        store.seed(KEY, raw);
        let cache = cache_with(&store);

        let loaded = cache.load_at(3000);
        assert!(loaded.get("https://shop/b").unwrap().is_unavailable());
        assert_eq!(cache.save(&loaded), SaveOutcome::Persisted);
        assert_eq!(store.get(KEY).unwrap().as_deref(), Some(raw));
    }

    #[test]
    fn test_corrupt_store_loads_empty() {
        let store = Arc::new(MemoryStore::new());
        store.seed(KEY, "{not json");
        assert!(cache_with(&store).load().is_empty());
        assert_eq!(store.write_count(), 0);
    }

    #[test]
    fn test_entry_without_timestamp_is_kept_but_never_fresh() {
        let store = Arc::new(MemoryStore::new());
        store.seed(KEY, r#"{"https://shop/a":{"price":"£1"},"https://shop/b":{"price":"£2","t":5}}"#);

        let loaded = cache_with(&store).load_at(10);
        assert_eq!(loaded.len(), 2);

        let untimed = loaded.get("https://shop/a").unwrap();
        assert_eq!(untimed.t, None);
        assert!(!untimed.is_fresh(10, Duration::from_secs(3600)));
        assert!(!untimed.is_expired(i64::MAX, DAY));
        assert!(loaded.get("https://shop/b").unwrap().is_fresh(10, Duration::from_secs(3600)));
        assert_eq!(store.write_count(), 0);
    }

    #[test]
    fn test_unreadable_entry_dropped_alone() {
        let store = Arc::new(MemoryStore::new());
        store.seed(
            KEY,
            r#"{"https://shop/a":{"price":"£1","t":5},"https://shop/x":42,"https://shop/y":{"t":5}}"#,
        );

        let loaded = cache_with(&store).load_at(10);
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded.get("https://shop/a").unwrap().price, "£1");
    }

    #[test]
    fn test_untimed_entry_round_trips_without_timestamp() {
        let raw = r#"{"https://shop/a":{"price":"£1"}}"#;
        let store = Arc::new(MemoryStore::new());
        store.seed(KEY, raw);
        let cache = cache_with(&store);

        let loaded = cache.load_at(10);
        assert_eq!(cache.save(&loaded), SaveOutcome::Persisted);
        assert_eq!(store.get(KEY).unwrap().as_deref(), Some(raw));
    }

    #[test]
    fn test_failing_store() {
        let cache = PriceCache::new(Arc::new(FailingStore), KEY, DAY);
        assert!(cache.load().is_empty());

        let mut prices = PriceCacheStore::new();
        prices.insert("https://shop/a", CacheEntry::new("£1", now_ms()));
        assert!(matches!(cache.save(&prices), SaveOutcome::Failed(reason) if reason.contains("quota")));
        assert!(!cache.commit("https://shop/a", CacheEntry::new("£1", now_ms())).is_persisted());
    }

    #[test]
    fn test_empty_save_skipped_until_something_persisted() {
        let store = Arc::new(MemoryStore::new());
        let cache = cache_with(&store);

        assert_eq!(cache.save(&PriceCacheStore::new()), SaveOutcome::Skipped);
        assert_eq!(store.write_count(), 0);

        assert!(cache.commit("https://shop/a", CacheEntry::new("£1", now_ms())).is_persisted());
        assert_eq!(cache.clear(), SaveOutcome::Persisted);
        assert_eq!(store.get(KEY).unwrap().as_deref(), Some("{}"));
        assert!(cache.load().is_empty());
    }

    #[test]
    fn test_commit_merges_with_existing_entries() {
        let store = Arc::new(MemoryStore::new());
        let cache = cache_with(&store);
        let now = now_ms();

        cache.commit("https://shop/a", CacheEntry::new("£1", now));
        cache.commit("https://shop/b", CacheEntry::new("£2", now));
        cache.commit("https://shop/a", CacheEntry::new("£3", now));

        let loaded = cache.load();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded.get("https://shop/a").unwrap().price, "£3");
        assert_eq!(store.write_count(), 3);
    }

    #[test]
    fn test_fetched_at() {
        let entry = CacheEntry::new("£1", 1_700_000_000_000);
        assert_eq!(entry.fetched_at().unwrap().timestamp(), 1_700_000_000);
    }
}
