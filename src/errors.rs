use thiserror::Error;

/// Unified error type for relay fetching, extraction, caching and configuration.
///
/// Batch operations never surface these to callers: relay and persistence
/// failures are downgraded to `"Unavailable"` prices and empty stores. The
/// variants exist so each component boundary can log precisely what failed.
#[derive(Error, Debug)]
pub enum FetcherError {
    #[error("HTTP request to {url} failed: {message}")] Http {
        url: String,
        message: String,
    },

    #[error("HTTP {status} from {url}")] HttpStatus {
        url: String,
        status: u16,
    },

    #[error("Request to {url} timed out after {seconds} seconds")] Timeout {
        url: String,
        seconds: u64,
    },

    #[error("All {attempts} relays failed for {url}")] RelayExhausted {
        url: String,
        attempts: usize,
    },

    #[error("Invalid selector '{selector}': {reason}")] InvalidSelector {
        selector: String,
        reason: String,
    },

    #[error("Invalid source URL '{url}': {reason}")] InvalidSource {
        url: String,
        reason: String,
    },

    #[error("Persistence error: {0}")] Persistence(String),

    #[error("Configuration error: {0}")] Config(String),

    #[error("Operation cancelled")] Cancelled,

    #[error("Serialization error: {0}")] Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")] Io(#[from] std::io::Error),
}

impl FetcherError {
    /// Failures of a single relay attempt; the next relay should be tried.
    pub fn is_relay_failure(&self) -> bool {
        matches!(
            self,
            FetcherError::Http { .. } | FetcherError::HttpStatus { .. } | FetcherError::Timeout { .. }
        )
    }

    pub fn is_recoverable(&self) -> bool {
        match self {
            FetcherError::Http { .. } => true,
            FetcherError::HttpStatus { status, .. } => *status == 429 || *status >= 500,
            FetcherError::Timeout { .. } => true,
            FetcherError::RelayExhausted { .. } => true,
            FetcherError::Persistence(_) => true,
            _ => false,
        }
    }
}

pub type FetcherResult<T> = Result<T, FetcherError>;
