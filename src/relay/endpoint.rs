/// A single relay: template + encoded target, one bounded attempt
use async_trait::async_trait;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use std::sync::Arc;
use std::time::Duration;

use super::transport::HttpTransport;
use crate::errors::{FetcherError, FetcherResult};
use crate::logger::{self, LogTag};

/// Characters left as-is by URI component encoding
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Percent-encode a full URL so it can be appended to a relay template
pub fn encode_target(target_url: &str) -> String {
    utf8_percent_encode(target_url, URI_COMPONENT).to_string()
}

/// One way of getting a page's markup
#[async_trait]
pub trait FetchStrategy: Send + Sync {
    /// Label used in logs and probe reports
    fn name(&self) -> &str;

    async fn fetch(&self, target_url: &str) -> FetcherResult<String>;
}

pub struct RelayEndpoint {
    template: String,
    transport: Arc<dyn HttpTransport>,
    timeout: Duration,
}

impl RelayEndpoint {
    pub fn new(template: &str, transport: Arc<dyn HttpTransport>, timeout: Duration) -> Self {
        Self {
            template: template.to_string(),
            transport,
            timeout,
        }
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn request_url(&self, target_url: &str) -> String {
        format!("{}{}", self.template, encode_target(target_url))
    }
}

#[async_trait]
impl FetchStrategy for RelayEndpoint {
    fn name(&self) -> &str {
        &self.template
    }

    async fn fetch(&self, target_url: &str) -> FetcherResult<String> {
        let request_url = self.request_url(target_url);
        logger::debug(LogTag::Relay, &format!("GET {}", request_url));

        let response = match tokio::time::timeout(self.timeout, self.transport.get(&request_url)).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(FetcherError::Timeout {
                    url: request_url,
                    seconds: self.timeout.as_secs(),
                });
            }
        };

        if !response.is_success() {
            return Err(FetcherError::HttpStatus {
                url: request_url,
                status: response.status,
            });
        }

        logger::verbose(
            LogTag::Relay,
            &format!("{} returned {} bytes", self.template, response.body.len()),
        );
        Ok(response.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relay::transport::HttpResponse;
    use std::sync::Mutex;

    struct EchoTransport {
        seen: Mutex<Vec<String>>,
        status: u16,
        delay: Duration,
    }

    impl EchoTransport {
        fn new(status: u16, delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                seen: Mutex::new(Vec::new()),
                status,
                delay,
            })
        }
    }

    #[async_trait]
    impl HttpTransport for EchoTransport {
        async fn get(&self, url: &str) -> FetcherResult<HttpResponse> {
            self.seen.lock().unwrap().push(url.to_string());
            tokio::time::sleep(self.delay).await;
            Ok(HttpResponse::new(self.status, format!("<html>{}</html>", url)))
        }
    }

    #[test]
    fn test_encoding_matches_uri_component() {
        assert_eq!(
            encode_target("https://shop.example/item?id=1&q=a b"),
            "https%3A%2F%2Fshop.example%2Fitem%3Fid%3D1%26q%3Da%20b"
        );
        assert_eq!(encode_target("a-b_c.d!e~f*g'h(i)j"), "a-b_c.d!e~f*g'h(i)j");
        assert_eq!(encode_target("£"), "%C2%A3");
    }

    #[test]
    fn test_request_url_appends_encoded_target() {
        let transport = EchoTransport::new(200, Duration::ZERO);
        let endpoint = RelayEndpoint::new("https://relay.example/raw?url=", transport, Duration::from_secs(1));
        assert_eq!(
            endpoint.request_url("https://shop.example/p"),
            "https://relay.example/raw?url=https%3A%2F%2Fshop.example%2Fp"
        );
    }

    #[tokio::test]
    async fn test_success_returns_body() {
        let transport = EchoTransport::new(200, Duration::ZERO);
        let endpoint = RelayEndpoint::new("https://relay.example/?", transport.clone(), Duration::from_secs(1));

        let body = endpoint.fetch("https://shop.example/p").await.unwrap();
        assert_eq!(body, "<html>https://relay.example/?https%3A%2F%2Fshop.example%2Fp</html>");
        assert_eq!(transport.seen.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_non_success_status_is_error() {
        let transport = EchoTransport::new(403, Duration::ZERO);
        let endpoint = RelayEndpoint::new("https://relay.example/?", transport, Duration::from_secs(1));

        let err = endpoint.fetch("https://shop.example/p").await.unwrap_err();
        assert!(matches!(err, FetcherError::HttpStatus { status: 403, .. }));
    }

    #[tokio::test]
    async fn test_slow_relay_times_out() {
        let transport = EchoTransport::new(200, Duration::from_secs(5));
        let endpoint = RelayEndpoint::new("https://relay.example/?", transport, Duration::from_millis(20));

        let err = endpoint.fetch("https://shop.example/p").await.unwrap_err();
        assert!(matches!(err, FetcherError::Timeout { .. }));
        assert!(err.is_relay_failure());
    }
}
