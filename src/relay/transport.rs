/// HTTP transport used by relay endpoints
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use crate::errors::{FetcherError, FetcherResult};

/// Status and text body of a completed request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Minimal GET interface so relays can run against a stub in tests
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn get(&self, url: &str) -> FetcherResult<HttpResponse>;
}

/// reqwest-backed transport (rustls)
pub struct ReqwestTransport {
    client: Client,
    timeout: Duration,
}

impl ReqwestTransport {
    /// Build a client with the given user agent
    ///
    /// `timeout` is applied at the client level as well as by each relay, so
    /// a stalled body download cannot outlive the attempt.
    pub fn new(user_agent: &str, timeout: Duration) -> FetcherResult<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .map_err(|e| FetcherError::Http {
                url: String::new(),
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self { client, timeout })
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get(&self, url: &str) -> FetcherResult<HttpResponse> {
        let response = self.client.get(url).send().await.map_err(|e| self.map_error(url, e))?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            // Body of a failed relay is never used
            return Ok(HttpResponse::new(status, String::new()));
        }

        let body = response.text().await.map_err(|e| self.map_error(url, e))?;
        Ok(HttpResponse::new(status, body))
    }
}

impl ReqwestTransport {
    fn map_error(&self, url: &str, error: reqwest::Error) -> FetcherError {
        if error.is_timeout() {
            FetcherError::Timeout {
                url: url.to_string(),
                seconds: self.timeout.as_secs(),
            }
        } else {
            FetcherError::Http {
                url: url.to_string(),
                message: error.to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_range() {
        assert!(HttpResponse::new(200, "ok").is_success());
        assert!(HttpResponse::new(204, "").is_success());
        assert!(!HttpResponse::new(301, "").is_success());
        assert!(!HttpResponse::new(429, "").is_success());
        assert!(!HttpResponse::new(503, "").is_success());
    }

    #[test]
    fn test_client_builds() {
        let transport = ReqwestTransport::new("bullion-fetcher/test", Duration::from_secs(5)).unwrap();
        assert_eq!(transport.timeout(), Duration::from_secs(5));
    }
}
