use super::schemas::Config;
/// Configuration utilities - loading, validation, and access helpers
///
/// Library types take `&Config` explicitly; the global handle below exists
/// for the CLI and debug tools, which load the file once at startup.
use once_cell::sync::OnceCell;
use std::path::Path;
use std::sync::RwLock;
use std::time::Duration;

use crate::errors::{FetcherError, FetcherResult};
use crate::logger::{self, LogTag};
use crate::sources::Source;

/// Global configuration instance, set once by `init_config`
pub static CONFIG: OnceCell<RwLock<Config>> = OnceCell::new();

impl Config {
    pub fn fresh_window(&self) -> Duration {
        Duration::from_secs(self.cache.fresh_window_secs)
    }

    pub fn expiry_horizon(&self) -> Duration {
        Duration::from_secs(self.cache.expiry_horizon_secs)
    }

    pub fn relay_timeout(&self) -> Duration {
        Duration::from_secs(self.relay.timeout_secs)
    }

    pub fn batch_delay(&self) -> Duration {
        Duration::from_millis(self.batch.delay_ms)
    }

    /// Configured sources as validated `Source` values
    pub fn sources(&self) -> FetcherResult<Vec<Source>> {
        self.sources
            .iter()
            .map(|s| {
                let source = Source::new(&s.name, &s.url);
                source.validate()?;
                Ok(source)
            })
            .collect()
    }

    /// Check the configuration for values the fetcher cannot run with
    pub fn validate(&self) -> FetcherResult<()> {
        if self.relay.endpoints.iter().all(|e| e.trim().is_empty()) {
            return Err(FetcherError::Config("relay.endpoints must not be empty".to_string()));
        }
        if self.relay.timeout_secs == 0 {
            return Err(FetcherError::Config("relay.timeout_secs must be greater than zero".to_string()));
        }
        if self.extractor.selectors.is_empty() {
            return Err(FetcherError::Config("extractor.selectors must not be empty".to_string()));
        }
        if self.cache.store_key.trim().is_empty() {
            return Err(FetcherError::Config("cache.store_key must not be empty".to_string()));
        }
        if self.cache.fresh_window_secs >= self.cache.expiry_horizon_secs {
            return Err(FetcherError::Config(format!(
                "cache.fresh_window_secs ({}) must be shorter than cache.expiry_horizon_secs ({})",
                self.cache.fresh_window_secs, self.cache.expiry_horizon_secs
            )));
        }
        self.sources()?;
        Ok(())
    }
}

/// Load configuration from a TOML file
///
/// A missing file yields the defaults; an unreadable or invalid file is an
/// error. The loaded configuration is validated before it is returned.
pub fn load_config_from_path(path: &Path) -> FetcherResult<Config> {
    let config = if path.exists() {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            FetcherError::Config(format!("Failed to read config file '{}': {}", path.display(), e))
        })?;

        toml::from_str::<Config>(&contents).map_err(|e| {
            FetcherError::Config(format!("Failed to parse config file '{}': {}", path.display(), e))
        })?
    } else {
        logger::warning(
            LogTag::Config,
            &format!("Config file '{}' not found, using default values", path.display()),
        );
        Config::default()
    };

    config.validate()?;
    Ok(config)
}

/// Write a configuration as pretty TOML, creating parent directories
pub fn save_config_to_path(config: &Config, path: &Path) -> FetcherResult<()> {
    let contents = toml::to_string_pretty(config)
        .map_err(|e| FetcherError::Config(format!("Failed to serialize config: {}", e)))?;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, contents)?;
    Ok(())
}

/// Install the global configuration (first call wins)
pub fn init_config(config: Config) -> FetcherResult<()> {
    CONFIG
        .set(RwLock::new(config))
        .map_err(|_| FetcherError::Config("Config already initialized".to_string()))
}

/// Get a clone of the global configuration, or the defaults if none was installed
pub fn get_config_clone() -> Config {
    match CONFIG.get() {
        Some(lock) => match lock.read() {
            Ok(config) => config.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        },
        None => Config::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schemas::SourceConfig;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        config.validate().expect("defaults should validate");
        assert_eq!(config.relay.endpoints.len(), 10);
        assert_eq!(config.extractor.selectors[0], "#b_pricing_now");
        assert_eq!(config.fresh_window(), Duration::from_secs(3600));
        assert_eq!(config.expiry_horizon(), Duration::from_secs(86_400));
        assert_eq!(config.batch_delay(), Duration::from_millis(4000));
        assert_eq!(config.sources().unwrap().len(), 9);
    }

    #[test]
    fn test_fresh_window_must_be_shorter_than_expiry() {
        let mut config = Config::default();
        config.cache.fresh_window_secs = config.cache.expiry_horizon_secs;
        assert!(matches!(config.validate(), Err(FetcherError::Config(_))));
    }

    #[test]
    fn test_invalid_source_rejected() {
        let mut config = Config::default();
        config.sources.push(SourceConfig {
            name: "broken".to_string(),
            url: "not a url".to_string(),
        });
        assert!(matches!(config.validate(), Err(FetcherError::InvalidSource { .. })));
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
            [batch]
            delay_ms = 250

            [[sources]]
            name = "platinum"
            url = "https://example.com/platinum"
            "#,
        )
        .expect("partial config should parse");

        assert_eq!(config.batch.delay_ms, 250);
        assert_eq!(config.cache.fresh_window_secs, 3600);
        assert_eq!(config.sources.len(), 1);
        assert_eq!(config.relay, crate::config::RelayConfig::default());
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config_from_path(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_save_then_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.batch.delay_ms = 0;
        config.relay.endpoints = vec!["https://relay.example/?u=".to_string()];

        save_config_to_path(&config, &path).unwrap();
        let loaded = load_config_from_path(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[cache\nstore_key = ").unwrap();
        assert!(matches!(load_config_from_path(&path), Err(FetcherError::Config(_))));
    }
}
