/// Logger configuration shared by all logging calls
///
/// Held in a process-wide `RwLock` so the CLI can install its flags once
/// while library code keeps calling the plain `logger::*` functions.
use once_cell::sync::Lazy;
use std::collections::HashSet;
use std::sync::RwLock;

use super::levels::LogLevel;
use super::tags::LogTag;

#[derive(Debug, Clone)]
pub struct LoggerConfig {
    /// Messages above this level are dropped (Debug/Verbose still need their flags)
    pub min_level: LogLevel,

    /// Tags with DEBUG output enabled (debug keys, lowercase)
    pub debug_tags: HashSet<String>,

    /// When non-empty, only these tags are shown (errors always pass)
    pub enabled_tags: HashSet<String>,

    /// Mirror console output into the daily log file
    pub file_logging: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            min_level: LogLevel::Info,
            debug_tags: HashSet::new(),
            enabled_tags: HashSet::new(),
            file_logging: false,
        }
    }
}

impl LoggerConfig {
    /// Build a configuration from CLI-style flags
    ///
    /// `debug` entries are tag keys; `all` enables every tag. Any debug tag
    /// raises the threshold to DEBUG, `verbose` raises it to VERBOSE and
    /// `quiet` lowers it to WARNING.
    pub fn from_flags(debug: &[String], verbose: bool, quiet: bool) -> Self {
        let mut debug_tags: HashSet<String> =
            debug.iter().map(|t| t.trim().to_lowercase()).filter(|t| !t.is_empty()).collect();

        if debug_tags.remove("all") {
            debug_tags.extend(LogTag::known_debug_keys().iter().map(|k| k.to_string()));
        }

        let min_level = if verbose {
            LogLevel::Verbose
        } else if !debug_tags.is_empty() {
            LogLevel::Debug
        } else if quiet {
            LogLevel::Warning
        } else {
            LogLevel::Info
        };

        Self {
            min_level,
            debug_tags,
            ..Self::default()
        }
    }
}

static LOGGER_CONFIG: Lazy<RwLock<LoggerConfig>> = Lazy::new(|| RwLock::new(LoggerConfig::default()));

/// Snapshot of the active configuration
pub fn get_logger_config() -> LoggerConfig {
    match LOGGER_CONFIG.read() {
        Ok(config) => config.clone(),
        Err(poisoned) => poisoned.into_inner().clone(),
    }
}

/// Run `f` against the active configuration under a read guard
pub(super) fn with_logger_config<R>(f: impl FnOnce(&LoggerConfig) -> R) -> R {
    match LOGGER_CONFIG.read() {
        Ok(config) => f(&config),
        Err(poisoned) => f(&poisoned.into_inner()),
    }
}

/// Replace the active configuration
pub fn set_logger_config(config: LoggerConfig) {
    match LOGGER_CONFIG.write() {
        Ok(mut current) => *current = config,
        Err(poisoned) => *poisoned.into_inner() = config,
    }
}

pub(super) fn is_debug_enabled_for_tag(config: &LoggerConfig, tag: &LogTag) -> bool {
    config.min_level >= LogLevel::Verbose || config.debug_tags.contains(&tag.to_debug_key())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_info() {
        let config = LoggerConfig::default();
        assert_eq!(config.min_level, LogLevel::Info);
        assert!(config.debug_tags.is_empty());
        assert!(!config.file_logging);
    }

    #[test]
    fn test_debug_flags_raise_level() {
        let config = LoggerConfig::from_flags(&["Relay".to_string()], false, false);
        assert_eq!(config.min_level, LogLevel::Debug);
        assert!(is_debug_enabled_for_tag(&config, &LogTag::Relay));
        assert!(!is_debug_enabled_for_tag(&config, &LogTag::Cache));
    }

    #[test]
    fn test_debug_all_expands() {
        let config = LoggerConfig::from_flags(&["all".to_string()], false, false);
        for key in LogTag::known_debug_keys() {
            assert!(config.debug_tags.contains(*key));
        }
        assert!(!config.debug_tags.contains("all"));
    }

    #[test]
    fn test_read_guard_sees_active_config() {
        let level = with_logger_config(|config| config.min_level);
        assert_eq!(level, get_logger_config().min_level);
        assert!(with_logger_config(|config| !config.file_logging));
    }

    #[test]
    fn test_verbose_beats_quiet() {
        let config = LoggerConfig::from_flags(&[], true, true);
        assert_eq!(config.min_level, LogLevel::Verbose);
        assert!(is_debug_enabled_for_tag(&config, &LogTag::Batch));

        let quiet = LoggerConfig::from_flags(&[], false, true);
        assert_eq!(quiet.min_level, LogLevel::Warning);
    }
}
