/// Configuration schemas - all config structures defined once with defaults
///
/// Each struct is defined using the config_struct! macro which provides:
/// - Single-source definition (no repetition)
/// - Embedded defaults
/// - Serde support
use crate::config_struct;

/// Relay endpoint templates, tried in order.
///
/// Each template is concatenated with the percent-encoded target URL.
pub const DEFAULT_RELAY_ENDPOINTS: &[&str] = &[
    "https://api.allorigins.win/raw?url=",
    "https://api.allorigins.cf/raw?url=",
    "https://thingproxy.freeboard.io/fetch/",
    "https://cors-anywhere.herokuapp.com/",
    "https://api.codetabs.com/v1/proxy?quest=",
    "https://cors.bridged.cc/",
    "https://corsproxy.io/?",
    "https://yacdn.org/proxy/",
    "https://proxy.cors.sh/",
    "https://cors.eu.org/?u=",
];

/// Price selectors, most specific first
pub const DEFAULT_PRICE_SELECTORS: &[&str] = &[
    "#b_pricing_now",
    ".product-price",
    "[data-price]",
    ".price",
    ".product-pricing",
    "span[class*=\"price\"]",
];

/// Built-in commodity sources (name, vendor product page)
pub const DEFAULT_SOURCES: &[(&str, &str)] = &[
    (
        "925 silver",
        "https://www.cooksongold.com/Grain-and-Casting-Pieces/Sterling-Silver-Grain,-100--------Recycled-Silver-prcode-ASA-000",
    ),
    (
        "fine silver",
        "https://www.cooksongold.com/Grain-and-Casting-Pieces/Fine-Silver-Grain,-100-Recycled---Silver-prcode-ASF-000",
    ),
    (
        "9K gold",
        "https://www.cooksongold.com/Grain-and-Casting-Pieces/9ct-Casting-Yellow-Grain,-100-----Recycled-Gold-prcode-AAB-000",
    ),
    (
        "14K gold",
        "https://www.cooksongold.com/Grain-and-Casting-Pieces/14ct-Ay-Yellow-Grain,-100-Recycled-Gold-prcode-AGE-000",
    ),
    (
        "18K gold",
        "https://www.cooksongold.com/Grain-and-Casting-Pieces/18ct-Hcb-Yellow-Grain,-100--------Recycled-Gold-prcode-ALO-000",
    ),
    (
        "22K gold",
        "https://www.cooksongold.com/Grain-and-Casting-Pieces/22ct-Yellow-Ds-Grain,-100-Recycled-Gold-prcode-AQA-000",
    ),
    (
        "24K gold",
        "https://www.cooksongold.com/Grain-and-Casting-Pieces/Fine-Gold-Grain-Minimum-99.96-Au,-100-Recycled-Gold-prcode-ARZ-000",
    ),
    (
        "palladium",
        "https://www.cooksongold.com/Grain-and-Casting-Pieces/Palladium-Casting-Pieces-prcode-APAL-000",
    ),
    (
        "platinum",
        "https://www.cooksongold.com/Grain-and-Casting-Pieces/Platinum-Hc-Casting-Pieces-prcode-BXB-000",
    ),
];

fn to_strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

fn default_sources() -> Vec<SourceConfig> {
    DEFAULT_SOURCES
        .iter()
        .map(|(name, url)| SourceConfig {
            name: name.to_string(),
            url: url.to_string(),
        })
        .collect()
}

// ============================================================================
// RELAY CONFIGURATION
// ============================================================================

config_struct! {
    /// Relay (cross-origin proxy) configuration
    pub struct RelayConfig {
        /// Endpoint templates in fallback order
        endpoints: Vec<String> = to_strings(DEFAULT_RELAY_ENDPOINTS),
        /// Upper bound for a single relay attempt
        timeout_secs: u64 = 12,
        user_agent: String = format!("bullion-fetcher/{}", env!("CARGO_PKG_VERSION")),
    }
}

// ============================================================================
// EXTRACTION CONFIGURATION
// ============================================================================

config_struct! {
    /// Price extraction configuration
    pub struct ExtractorConfig {
        /// CSS selectors in priority order
        selectors: Vec<String> = to_strings(DEFAULT_PRICE_SELECTORS),
    }
}

// ============================================================================
// CACHE CONFIGURATION
// ============================================================================

config_struct! {
    /// Price cache configuration
    pub struct CacheConfig {
        /// Key the whole cache mapping is persisted under
        store_key: String = "bullion_prices_v1".to_string(),
        /// Entries younger than this are served without a refetch
        fresh_window_secs: u64 = 60 * 60,
        /// Entries older than this are pruned on load
        expiry_horizon_secs: u64 = 24 * 60 * 60,
    }
}

// ============================================================================
// BATCH CONFIGURATION
// ============================================================================

config_struct! {
    /// Batch pacing configuration
    pub struct BatchConfig {
        /// Pause after each network fetch except the last
        delay_ms: u64 = 4000,
    }
}

config_struct! {
    /// A named product page to price
    pub struct SourceConfig {
        name: String = String::new(),
        url: String = String::new(),
    }
}

// ============================================================================
// ROOT CONFIGURATION
// ============================================================================

config_struct! {
    /// Complete fetcher configuration (`config.toml`)
    pub struct Config {
        relay: RelayConfig = RelayConfig::default(),
        extractor: ExtractorConfig = ExtractorConfig::default(),
        cache: CacheConfig = CacheConfig::default(),
        batch: BatchConfig = BatchConfig::default(),
        /// Sources used when a batch is run without explicit URLs
        sources: Vec<SourceConfig> = default_sources(),
    }
}
