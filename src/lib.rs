//! Bullion price fetcher
//!
//! Vendor product pages are fetched through fallback relays, a price string
//! is extracted from the markup, and results are kept in a persisted cache
//! with a freshness window and an expiry horizon.

pub mod cache;
pub mod config;
pub mod errors;
pub mod extractor;
pub mod fetcher;
pub mod logger;
pub mod paths;
pub mod relay;
pub mod shutdown;
pub mod sources;

pub use cache::{CacheEntry, PriceCache, PriceCacheStore, SaveOutcome, UNAVAILABLE};
pub use errors::{FetcherError, FetcherResult};
pub use extractor::{extract_price, PriceExtractor};
pub use fetcher::{BullionFetcher, FetchResult, PriceLookup};
pub use shutdown::CancelSignal;
pub use sources::Source;
