//! HTTP body fetcher for BIMI certificate retrieval.
//!
//! The BIMI evaluator treats the certificate URL opaquely: it only needs
//! the response status and the raw text body. No TLS chain validation is
//! performed on the fetched content itself.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use thiserror::Error;

/// Finite fetch timeout, matching the DNS client policy.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Network-level fetch failure. Non-2xx responses are NOT errors; they are
/// reported through [`FetchedBody::ok`].
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    #[error("fetch timed out for '{0}'")]
    Timeout(String),
    #[error("fetch failed for '{0}': {1}")]
    Transport(String, String),
}

/// Raw fetch outcome: HTTP-level success flag plus the body text.
#[derive(Debug, Clone)]
pub struct FetchedBody {
    pub ok: bool,
    pub body: String,
}

/// Seam between the BIMI evaluator and the network.
pub trait BodyFetcher: Send + Sync {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<FetchedBody, FetchError>> + Send;
}

/// reqwest-backed fetcher.
///
/// An optional proxy prefix can be prepended to every URL for callers that
/// must route through a CORS-bypass relay; direct fetch is the default for
/// native callers.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    proxy_prefix: Option<String>,
}

impl HttpFetcher {
    pub fn new() -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_FETCH_TIMEOUT)
            .build()
            .map_err(|e| FetchError::Transport(String::new(), e.to_string()))?;
        Ok(Self {
            client,
            proxy_prefix: None,
        })
    }

    /// Route every fetch through a relay, e.g. `https://proxy.example/?url=`.
    /// The target URL is appended verbatim.
    pub fn with_proxy_prefix(mut self, prefix: &str) -> Self {
        self.proxy_prefix = Some(prefix.to_string());
        self
    }
}

impl BodyFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedBody, FetchError> {
        let target = match &self.proxy_prefix {
            Some(prefix) => format!("{prefix}{url}"),
            None => url.to_string(),
        };
        log::debug!("fetching {target}");

        let response = self.client.get(&target).send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout(url.to_string())
            } else {
                FetchError::Transport(url.to_string(), e.to_string())
            }
        })?;

        let ok = response.status().is_success();
        let body = response
            .text()
            .await
            .map_err(|e| FetchError::Transport(url.to_string(), e.to_string()))?;

        Ok(FetchedBody { ok, body })
    }
}

/// In-memory fetcher for tests, keyed by exact URL.
#[derive(Debug, Clone, Default)]
pub struct MockFetcher {
    bodies: Arc<Mutex<HashMap<String, FetchedBody>>>,
    failures: Arc<Mutex<HashMap<String, FetchError>>>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_body(&self, url: &str, ok: bool, body: &str) {
        self.bodies.lock().unwrap().insert(
            url.to_string(),
            FetchedBody {
                ok,
                body: body.to_string(),
            },
        );
    }

    pub fn add_failure(&self, url: &str, err: FetchError) {
        self.failures.lock().unwrap().insert(url.to_string(), err);
    }
}

impl BodyFetcher for MockFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedBody, FetchError> {
        if let Some(err) = self.failures.lock().unwrap().get(url) {
            return Err(err.clone());
        }
        match self.bodies.lock().unwrap().get(url) {
            Some(body) => Ok(body.clone()),
            None => Err(FetchError::Transport(
                url.to_string(),
                "no mock body registered".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_fetcher_returns_primed_body() {
        let fetcher = MockFetcher::new();
        fetcher.add_body("https://example.com/vmc.pem", true, "PEM DATA");
        let fetched = fetcher.fetch("https://example.com/vmc.pem").await.unwrap();
        assert!(fetched.ok);
        assert_eq!(fetched.body, "PEM DATA");
    }

    #[tokio::test]
    async fn mock_fetcher_unregistered_url_is_transport_error() {
        let fetcher = MockFetcher::new();
        assert!(fetcher.fetch("https://example.com/missing").await.is_err());
    }
}
