//! Orchestrator: runs the requested evaluators for a domain and assembles
//! one [`DomainResult`].

use futures::{stream, StreamExt};
use serde::Serialize;
use thiserror::Error;

use crate::bimi::{BimiEvaluator, BimiResult};
use crate::common::dns::{DnsError, DohClient, TxtResolver};
use crate::common::domain::normalize;
use crate::common::fetch::{BodyFetcher, FetchError, HttpFetcher};
use crate::dmarc::{DmarcEvaluator, DmarcResult};
use crate::spf::{SpfEvaluator, SpfResult};

/// Simultaneous domain resolutions in [`Inspector::resolve_many`].
pub const DEFAULT_CONCURRENCY: usize = 5;

/// Which facets to resolve for a domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    All,
    Spf,
    Dmarc,
    Bimi,
}

impl Scope {
    fn wants_spf(self) -> bool {
        matches!(self, Scope::All | Scope::Spf)
    }

    fn wants_dmarc(self) -> bool {
        matches!(self, Scope::All | Scope::Dmarc)
    }

    fn wants_bimi(self) -> bool {
        matches!(self, Scope::All | Scope::Bimi)
    }
}

/// Lifecycle of a domain resolution. Terminal once it leaves `Pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LookupStatus {
    Pending,
    Completed,
    /// Framework-level fault outside the evaluators; protocol-level
    /// problems always land in the facet `errors` instead.
    Error,
}

/// Aggregated facet results for one domain.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DomainResult {
    pub domain: String,
    pub status: LookupStatus,
    pub spf: Option<SpfResult>,
    pub dmarc: Option<DmarcResult>,
    pub bimi: Option<BimiResult>,
}

/// Failure constructing the default network clients.
#[derive(Debug, Error)]
pub enum InspectorError {
    #[error(transparent)]
    Dns(#[from] DnsError),
    #[error(transparent)]
    Fetch(#[from] FetchError),
}

/// Email-authentication inspector for domains.
pub struct Inspector<R: TxtResolver, F: BodyFetcher> {
    resolver: R,
    fetcher: F,
}

impl Inspector<DohClient, HttpFetcher> {
    /// Inspector over the default DoH endpoint and a direct HTTP fetcher.
    pub fn new() -> Result<Self, InspectorError> {
        Ok(Self {
            resolver: DohClient::new()?,
            fetcher: HttpFetcher::new()?,
        })
    }
}

impl<R: TxtResolver, F: BodyFetcher> Inspector<R, F> {
    /// Inspector over caller-supplied resolver and fetcher.
    pub fn with_components(resolver: R, fetcher: F) -> Self {
        Self { resolver, fetcher }
    }

    /// Resolve the requested facets for one domain.
    ///
    /// Facets run sequentially; a failure in one is recorded in that
    /// facet's `errors` and never aborts its siblings.
    pub async fn resolve(&self, domain: &str, scope: Scope) -> DomainResult {
        let domain = normalize(domain);
        log::debug!("resolving {domain} ({scope:?})");

        let mut result = DomainResult {
            domain: domain.clone(),
            status: LookupStatus::Pending,
            spf: None,
            dmarc: None,
            bimi: None,
        };

        if scope.wants_spf() {
            result.spf = Some(self.resolve_spf(&domain).await);
        }
        if scope.wants_dmarc() {
            result.dmarc = Some(self.resolve_dmarc(&domain).await);
        }
        if scope.wants_bimi() {
            result.bimi = Some(self.resolve_bimi(&domain).await);
        }

        result.status = LookupStatus::Completed;
        result
    }

    /// Resolve many domains with bounded fan-out (batches of
    /// [`DEFAULT_CONCURRENCY`]), preserving input order.
    pub async fn resolve_many<S: AsRef<str>>(&self, domains: &[S], scope: Scope) -> Vec<DomainResult> {
        stream::iter(domains.iter().map(|d| self.resolve(d.as_ref(), scope)))
            .buffered(DEFAULT_CONCURRENCY)
            .collect()
            .await
    }

    async fn resolve_spf(&self, domain: &str) -> SpfResult {
        let answers = match self.resolver.query_txt(domain).await {
            Ok(answers) => answers,
            Err(e) => return facet_error_spf(e.to_string()),
        };
        match answers.iter().find(|r| r.contains("v=spf1")) {
            Some(record) => {
                let mut result = SpfEvaluator::new(&self.resolver).evaluate(domain, record).await;
                result.valid = !result.exceeds_lookup_limit;
                result
            }
            None => facet_error_spf("No SPF record found.".to_string()),
        }
    }

    async fn resolve_dmarc(&self, domain: &str) -> DmarcResult {
        let name = format!("_dmarc.{domain}");
        let answers = match self.resolver.query_txt(&name).await {
            Ok(answers) => answers,
            Err(e) => return facet_error_dmarc(e.to_string()),
        };
        match answers.iter().find(|r| r.contains("v=DMARC1")) {
            Some(record) => {
                let mut result = DmarcEvaluator::new(&self.resolver).evaluate(domain, record).await;
                result.valid = result.errors.is_empty();
                result
            }
            None => facet_error_dmarc("No DMARC record found.".to_string()),
        }
    }

    async fn resolve_bimi(&self, domain: &str) -> BimiResult {
        let name = format!("default._bimi.{domain}");
        let answers = match self.resolver.query_txt(&name).await {
            Ok(answers) => answers,
            Err(e) => return facet_error_bimi(e.to_string()),
        };
        match answers.iter().find(|r| r.contains("v=BIMI1")) {
            Some(record) => {
                let mut result = BimiEvaluator::new(&self.fetcher).evaluate(record).await;
                result.valid = result.errors.is_empty();
                result
            }
            None => facet_error_bimi("No BIMI record found.".to_string()),
        }
    }
}

fn facet_error_spf(error: String) -> SpfResult {
    SpfResult {
        record: String::new(),
        mechanisms: Vec::new(),
        includes: Vec::new(),
        redirects: Vec::new(),
        lookup_count: 0,
        exceeds_lookup_limit: false,
        nested_lookups: Default::default(),
        lookup_details: Vec::new(),
        valid: false,
        errors: vec![error],
    }
}

fn facet_error_dmarc(error: String) -> DmarcResult {
    let mut result = DmarcResult::empty("");
    result.errors.push(error);
    result
}

fn facet_error_bimi(error: String) -> BimiResult {
    BimiResult {
        record: String::new(),
        logo_url: None,
        certificate_url: None,
        certificate_authority: None,
        certificate_issuer: None,
        certificate_issue_date: None,
        certificate_expiry: None,
        valid: false,
        errors: vec![error],
    }
}
