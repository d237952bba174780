//! DMARC (Domain-based Message Authentication, Reporting, and Conformance) per RFC 7489.
//!
//! Parses the policy record published at `_dmarc.<domain>` and verifies
//! third-party report authorization (RFC 7489 §7.1) for external `rua`/`ruf`
//! recipients.

mod eval;
mod parser;

pub use eval::DmarcEvaluator;
pub use parser::parse_dmarc_record;

use serde::Serialize;

/// The closed DMARC tag vocabulary. Anything else is reported as invalid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DmarcTag {
    Version,
    Policy,
    SubdomainPolicy,
    AggregateReportUris,
    ForensicReportUris,
    FailureOptions,
    DkimAlignment,
    SpfAlignment,
    ReportFormat,
    ReportInterval,
    Percentage,
}

impl DmarcTag {
    /// Exact tag-name match; tags are lowercase on the wire.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "v" => Some(DmarcTag::Version),
            "p" => Some(DmarcTag::Policy),
            "sp" => Some(DmarcTag::SubdomainPolicy),
            "rua" => Some(DmarcTag::AggregateReportUris),
            "ruf" => Some(DmarcTag::ForensicReportUris),
            "fo" => Some(DmarcTag::FailureOptions),
            "adkim" => Some(DmarcTag::DkimAlignment),
            "aspf" => Some(DmarcTag::SpfAlignment),
            "rf" => Some(DmarcTag::ReportFormat),
            "ri" => Some(DmarcTag::ReportInterval),
            "pct" => Some(DmarcTag::Percentage),
            _ => None,
        }
    }
}

/// Outcome of inspecting one domain's DMARC record.
///
/// Unrecognized tags never populate a field; they only append to `errors`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DmarcResult {
    pub record: String,
    pub policy: Option<String>,
    pub subdomain_policy: Option<String>,
    /// `pct` tag; defaults to 100 when absent or non-numeric.
    pub percentage: u8,
    pub adkim: Option<String>,
    pub aspf: Option<String>,
    pub fo: Option<String>,
    pub rf: Option<String>,
    pub ri: Option<String>,
    /// Deduplicated union of `rua_emails` and `ruf_emails`.
    pub reporting_emails: Vec<String>,
    pub rua_emails: Vec<String>,
    pub ruf_emails: Vec<String>,
    pub valid: bool,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

impl DmarcResult {
    pub(crate) fn empty(record: &str) -> Self {
        Self {
            record: record.to_string(),
            policy: None,
            subdomain_policy: None,
            percentage: 100,
            adkim: None,
            aspf: None,
            fo: None,
            rf: None,
            ri: None,
            reporting_emails: Vec::new(),
            rua_emails: Vec::new(),
            ruf_emails: Vec::new(),
            valid: false,
            warnings: Vec::new(),
            errors: Vec::new(),
        }
    }
}
