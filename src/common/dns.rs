//! DNS-over-HTTPS TXT query client.
//!
//! The evaluators only ever need TXT lookups, abstracted behind the
//! [`TxtResolver`] trait. The production implementation is [`DohClient`],
//! which speaks the JSON DNS API (`application/dns-json`) exposed by
//! Cloudflare, Google, and Quad9. A [`MockResolver`] backed by in-memory
//! maps is provided for tests and offline callers.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

/// Default DoH endpoint.
pub const DEFAULT_DOH_ENDPOINT: &str = "https://cloudflare-dns.com/dns-query";

/// Default per-request timeout. Must be finite so one hung lookup cannot
/// stall a whole batch of domain resolutions.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Network-level DNS failure. "No record found" is NOT an error: a query
/// that reaches the resolver and comes back empty yields `Ok(vec![])`.
#[derive(Debug, Clone, Error)]
pub enum DnsError {
    #[error("DNS query timed out for '{0}'")]
    Timeout(String),
    #[error("DNS transport error for '{0}': {1}")]
    Transport(String, String),
    #[error("DNS response for '{0}' could not be decoded: {1}")]
    Decode(String, String),
}

/// TXT resolver seam between the evaluators and the network.
///
/// `Ok` carries the TXT strings with surrounding quote characters already
/// stripped; an empty vec means the name has no TXT records (or the
/// resolver answered with a non-zero status). `Err` is reserved for
/// transport failures.
pub trait TxtResolver: Send + Sync {
    fn query_txt(&self, name: &str) -> impl Future<Output = Result<Vec<String>, DnsError>> + Send;
}

/// One answer in a JSON DNS response.
#[derive(Debug, Clone, Deserialize)]
pub struct DohAnswer {
    pub name: String,
    #[serde(rename = "type")]
    pub rr_type: u16,
    pub data: String,
}

/// JSON DNS response envelope. Only the fields the engine reads.
#[derive(Debug, Clone, Deserialize)]
pub struct DohResponse {
    #[serde(rename = "Status")]
    pub status: u32,
    #[serde(rename = "Answer", default)]
    pub answers: Vec<DohAnswer>,
}

/// TXT record type code.
const RR_TYPE_TXT: u16 = 16;

/// DNS-over-HTTPS client.
#[derive(Debug, Clone)]
pub struct DohClient {
    client: reqwest::Client,
    endpoint: String,
}

impl DohClient {
    /// Client against the default endpoint with the default timeout.
    pub fn new() -> Result<Self, DnsError> {
        Self::with_endpoint(DEFAULT_DOH_ENDPOINT)
    }

    /// Client against a specific dns-json endpoint.
    pub fn with_endpoint(endpoint: &str) -> Result<Self, DnsError> {
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(|e| DnsError::Transport(endpoint.to_string(), e.to_string()))?;
        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
        })
    }

    /// Client reusing an existing `reqwest::Client` (shared connection pool).
    pub fn with_client(client: reqwest::Client, endpoint: &str) -> Self {
        Self {
            client,
            endpoint: endpoint.to_string(),
        }
    }
}

impl TxtResolver for DohClient {
    async fn query_txt(&self, name: &str) -> Result<Vec<String>, DnsError> {
        log::debug!("DoH TXT query for {name}");

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("name", name), ("type", "TXT")])
            .header("Accept", "application/dns-json")
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    DnsError::Timeout(name.to_string())
                } else {
                    DnsError::Transport(name.to_string(), e.to_string())
                }
            })?;

        let body: DohResponse = response
            .json()
            .await
            .map_err(|e| DnsError::Decode(name.to_string(), e.to_string()))?;

        if body.status != 0 {
            log::debug!("DoH status {} for {name}, treating as no record", body.status);
            return Ok(Vec::new());
        }

        let records: Vec<String> = body
            .answers
            .iter()
            .filter(|a| a.rr_type == RR_TYPE_TXT)
            .map(|a| strip_txt_quotes(&a.data))
            .collect();

        log::debug!("DoH found {} TXT records for {name}", records.len());
        Ok(records)
    }
}

/// Strip the quote characters the JSON DNS API wraps TXT data in.
///
/// Long TXT records arrive split into quoted chunks (`"part1" "part2"`);
/// the chunks are rejoined without separators per RFC 7208 §3.3.
pub fn strip_txt_quotes(data: &str) -> String {
    let trimmed = data.trim();
    if !trimmed.contains('"') {
        return trimmed.to_string();
    }
    let mut out = String::with_capacity(trimmed.len());
    let mut in_quotes = false;
    for c in trimmed.chars() {
        if c == '"' {
            in_quotes = !in_quotes;
        } else if in_quotes {
            out.push(c);
        }
    }
    out
}

/// In-memory TXT resolver for tests.
///
/// Records are keyed by lowercased name. A name may instead be primed with
/// an error to exercise transport-failure paths.
#[derive(Debug, Clone, Default)]
pub struct MockResolver {
    txt: Arc<Mutex<HashMap<String, Vec<String>>>>,
    failures: Arc<Mutex<HashMap<String, DnsError>>>,
    queries: Arc<Mutex<Vec<String>>>,
}

impl MockResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_txt(&self, name: &str, records: Vec<String>) {
        self.txt
            .lock()
            .unwrap()
            .insert(name.to_lowercase(), records);
    }

    pub fn add_failure(&self, name: &str, err: DnsError) {
        self.failures.lock().unwrap().insert(name.to_lowercase(), err);
    }

    /// Names queried so far, in call order.
    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

impl TxtResolver for MockResolver {
    async fn query_txt(&self, name: &str) -> Result<Vec<String>, DnsError> {
        let key = name.to_lowercase();
        self.queries.lock().unwrap().push(key.clone());
        if let Some(err) = self.failures.lock().unwrap().get(&key) {
            return Err(err.clone());
        }
        Ok(self.txt.lock().unwrap().get(&key).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_quotes_single_chunk() {
        assert_eq!(strip_txt_quotes("\"v=spf1 -all\""), "v=spf1 -all");
    }

    #[test]
    fn strip_quotes_rejoins_chunks() {
        assert_eq!(
            strip_txt_quotes("\"v=spf1 include:a.com\" \" -all\""),
            "v=spf1 include:a.com -all"
        );
    }

    #[test]
    fn strip_quotes_unquoted_passthrough() {
        assert_eq!(strip_txt_quotes("v=DMARC1; p=none"), "v=DMARC1; p=none");
    }

    #[tokio::test]
    async fn mock_resolver_returns_primed_records() {
        let resolver = MockResolver::new();
        resolver.add_txt("example.com", vec!["v=spf1 -all".into()]);
        let records = resolver.query_txt("EXAMPLE.com").await.unwrap();
        assert_eq!(records, vec!["v=spf1 -all"]);
    }

    #[tokio::test]
    async fn mock_resolver_empty_for_unknown_name() {
        let resolver = MockResolver::new();
        assert!(resolver.query_txt("nothing.example").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn mock_resolver_primed_failure() {
        let resolver = MockResolver::new();
        resolver.add_failure("down.example", DnsError::Timeout("down.example".into()));
        assert!(resolver.query_txt("down.example").await.is_err());
    }

    #[tokio::test]
    async fn mock_resolver_records_query_order() {
        let resolver = MockResolver::new();
        let _ = resolver.query_txt("a.example").await;
        let _ = resolver.query_txt("b.example").await;
        assert_eq!(resolver.queries(), vec!["a.example", "b.example"]);
    }

    #[test]
    fn doh_response_decodes_dns_json() {
        let raw = r#"{"Status":0,"Answer":[{"name":"example.com","type":16,"TTL":300,"data":"\"v=spf1 -all\""}]}"#;
        let parsed: DohResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.status, 0);
        assert_eq!(parsed.answers.len(), 1);
        assert_eq!(strip_txt_quotes(&parsed.answers[0].data), "v=spf1 -all");
    }

    #[test]
    fn doh_response_missing_answer_section() {
        let raw = r#"{"Status":3}"#;
        let parsed: DohResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.status, 3);
        assert!(parsed.answers.is_empty());
    }
}
