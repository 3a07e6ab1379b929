//! HTTP client abstraction for testability

use std::time::Duration;

use super::ProviderError;

/// Default request timeout for overlay fetches.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Trait for HTTP GET operations.
///
/// This abstraction allows dependency injection and easier testing by
/// enabling mock HTTP clients in tests.
pub trait HttpClient: Send + Sync {
    /// Performs an HTTP GET request and returns the response body.
    fn get(&self, url: &str) -> Result<Vec<u8>, ProviderError>;
}

/// Real HTTP client implementation using reqwest.
#[derive(Debug, Clone)]
pub struct ReqwestClient {
    client: reqwest::blocking::Client,
}

impl ReqwestClient {
    /// Creates a client with the default 30 s timeout.
    pub fn new() -> Result<Self, ProviderError> {
        Self::with_timeout(DEFAULT_TIMEOUT_SECS)
    }

    /// Creates a client with a custom request timeout.
    ///
    /// The timeout is the only bound on a stalled fetch; the worker pool
    /// itself never times a job out.
    pub fn with_timeout(timeout_secs: u64) -> Result<Self, ProviderError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| ProviderError::HttpError(format!("failed to create HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

impl HttpClient for ReqwestClient {
    fn get(&self, url: &str) -> Result<Vec<u8>, ProviderError> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| ProviderError::HttpError(format!("request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(ProviderError::HttpError(format!(
                "HTTP {} from {}",
                response.status(),
                url
            )));
        }

        response
            .bytes()
            .map(|b| b.to_vec())
            .map_err(|e| ProviderError::HttpError(format!("failed to read response: {e}")))
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Mock HTTP client for testing; counts how often it is called.
    pub struct MockHttpClient {
        response: Result<Vec<u8>, ProviderError>,
        calls: Arc<AtomicUsize>,
    }

    impl MockHttpClient {
        /// Mock that always succeeds with `body`.
        pub fn ok(body: Vec<u8>) -> Self {
            Self {
                response: Ok(body),
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }

        /// Mock that always fails with an HTTP error.
        pub fn err(message: &str) -> Self {
            Self {
                response: Err(ProviderError::HttpError(message.to_string())),
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }

        /// Number of GET requests performed so far.
        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        /// Shared handle to the call counter, surviving moves of the mock.
        pub fn call_counter(&self) -> Arc<AtomicUsize> {
            Arc::clone(&self.calls)
        }
    }

    impl HttpClient for MockHttpClient {
        fn get(&self, _url: &str) -> Result<Vec<u8>, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.response.clone()
        }
    }

    #[test]
    fn test_mock_client_success() {
        let mock = MockHttpClient::ok(vec![1, 2, 3, 4]);
        assert_eq!(mock.get("http://example.com").unwrap(), vec![1, 2, 3, 4]);
        assert_eq!(mock.calls(), 1);
    }

    #[test]
    fn test_mock_client_error() {
        let mock = MockHttpClient::err("test error");
        assert!(mock.get("http://example.com").is_err());
    }
}
