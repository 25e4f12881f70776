//! Structured logging for the bullion fetcher
//!
//! This module provides a small tagged logging API with:
//! - Standard log levels (Error/Warning/Info/Debug/Verbose)
//! - Per-component debug control (`--debug relay`, `--debug cache`, ...)
//! - Dual output: colored console (stderr) + daily log file
//!
//! ## Usage
//!
//! ```rust
//! use bullion_fetcher::logger::{self, LogTag};
//!
//! logger::error(LogTag::Cache, "Failed to persist price cache");
//! logger::warning(LogTag::Relay, "Relay returned HTTP 503");
//! logger::info(LogTag::Batch, "Fetched 9 sources");
//! logger::debug(LogTag::Extract, "Matched selector #b_pricing_now"); // Only with --debug extract
//! logger::verbose(LogTag::Relay, "Raw response body ..."); // Only with --verbose
//! ```
//!
//! ## Initialization
//!
//! Library code logs to the console with the default configuration. The CLI
//! calls [`init`] once at startup to apply its flags and enable file output.

mod config;
mod core;
mod file;
mod format;
mod levels;
mod tags;

pub use config::{get_logger_config, set_logger_config, LoggerConfig};
pub use levels::LogLevel;
pub use tags::LogTag;

/// Initialize the logger system
///
/// Installs the given configuration and, when `config.file_logging` is set,
/// opens today's log file under the logs directory. Safe to call once at
/// startup before any services run.
pub fn init(config: LoggerConfig) {
    let file_logging = config.file_logging;
    set_logger_config(config);

    if file_logging {
        file::init_file_logging();
    }
}

/// Log at ERROR level (always shown, critical issues)
pub fn error(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Error, message);
}

/// Log at WARNING level (important issues)
///
/// Relay failures and persistence problems land here: they are expected,
/// recovered from, and worth seeing.
pub fn warning(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Warning, message);
}

/// Log at INFO level (standard operations)
pub fn info(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Info, message);
}

/// Log at DEBUG level (detailed diagnostics)
///
/// Only shown when debug mode is enabled for the tag.
///
/// # Example
/// ```rust
/// use bullion_fetcher::logger::{self, LogTag};
///
/// // Only shown with --debug relay
/// logger::debug(LogTag::Relay, "Trying https://corsproxy.io/?...");
/// ```
pub fn debug(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Debug, message);
}

/// Log at VERBOSE level (very detailed tracing)
pub fn verbose(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Verbose, message);
}

/// Force flush all pending log writes
///
/// Call this during shutdown to ensure all logs are written to disk.
pub fn flush() {
    file::flush_file_logging();
}
