//! Price cache
//!
//! - `store`: the `KeyValueStore` seam with file and in-memory backends
//! - `price_cache`: entry model, load/prune/save over a single store key

mod price_cache;
mod store;

pub use price_cache::{now_ms, CacheEntry, PriceCache, PriceCacheStore, SaveOutcome, UNAVAILABLE};
pub use store::{FileStore, KeyValueStore, MemoryStore};
