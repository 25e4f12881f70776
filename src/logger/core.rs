/// Core logging implementation with automatic filtering
///
/// This module contains the central logging logic that:
/// - Checks if a log should be displayed based on level and tag
/// - Delegates to the format module for output
use super::config::{is_debug_enabled_for_tag, with_logger_config, LoggerConfig};
use super::levels::LogLevel;
use super::tags::LogTag;

/// Check if a log message should be displayed
///
/// Filtering rules:
/// 1. Errors are always shown
/// 2. Check against minimum log level threshold
/// 3. Debug level requires debug mode for that tag
/// 4. Verbose level requires the verbose threshold
/// 5. If enabled_tags is non-empty, tag must be in the set
pub fn should_log(config: &LoggerConfig, tag: &LogTag, level: LogLevel) -> bool {
    if level == LogLevel::Error {
        return true;
    }

    if level > config.min_level {
        return false;
    }

    if level == LogLevel::Debug && !is_debug_enabled_for_tag(config, tag) {
        return false;
    }

    if level == LogLevel::Verbose && config.min_level != LogLevel::Verbose {
        return false;
    }

    if !config.enabled_tags.is_empty() && !config.enabled_tags.contains(&tag.to_debug_key()) {
        return false;
    }

    true
}

/// Internal logging function with automatic filtering
pub fn log_internal(tag: LogTag, level: LogLevel, message: &str) {
    if !with_logger_config(|config| should_log(config, &tag, level)) {
        return;
    }

    super::format::format_and_log(&tag, level, message);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_errors_always_pass() {
        let config = LoggerConfig {
            min_level: LogLevel::Warning,
            enabled_tags: ["batch".to_string()].into_iter().collect(),
            ..LoggerConfig::default()
        };
        assert!(should_log(&config, &LogTag::Relay, LogLevel::Error));
    }

    #[test]
    fn test_debug_needs_tag() {
        let config = LoggerConfig::from_flags(&["cache".to_string()], false, false);
        assert!(should_log(&config, &LogTag::Cache, LogLevel::Debug));
        assert!(!should_log(&config, &LogTag::Relay, LogLevel::Debug));
        assert!(should_log(&config, &LogTag::Relay, LogLevel::Info));
        assert!(!should_log(&config, &LogTag::Cache, LogLevel::Verbose));
    }

    #[test]
    fn test_live_config_filters_debug() {
        assert!(!with_logger_config(|config| should_log(config, &LogTag::Relay, LogLevel::Debug)));
        assert!(with_logger_config(|config| should_log(config, &LogTag::Relay, LogLevel::Error)));
    }

    #[test]
    fn test_enabled_tags_filter() {
        let config = LoggerConfig {
            enabled_tags: ["relay".to_string()].into_iter().collect(),
            ..LoggerConfig::default()
        };
        assert!(should_log(&config, &LogTag::Relay, LogLevel::Info));
        assert!(!should_log(&config, &LogTag::Cache, LogLevel::Warning));
    }
}
