//! Configuration system
//!
//! Schemas with embedded defaults (`schemas`), the `config_struct!` macro
//! (`macros`), and TOML loading/validation helpers (`utils`).

pub mod macros;
pub mod schemas;
pub mod utils;

pub use schemas::{
    BatchConfig, CacheConfig, Config, ExtractorConfig, RelayConfig, SourceConfig,
    DEFAULT_PRICE_SELECTORS, DEFAULT_RELAY_ENDPOINTS, DEFAULT_SOURCES,
};
pub use utils::{get_config_clone, init_config, load_config_from_path, save_config_to_path};
