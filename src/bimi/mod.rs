//! BIMI (Brand Indicators for Message Identification).
//!
//! Parses the record published at `default._bimi.<domain>` and inspects the
//! Verified Mark Certificate (VMC) referenced by its `a=` tag. Certificate
//! inspection is best-effort text extraction from the PEM blob, not
//! cryptographic validation.

mod eval;
mod parser;
mod vmc;

pub use eval::BimiEvaluator;
pub use parser::{parse_bimi_tags, ParsedBimi};
pub use vmc::{extract_certificate_fields, CertificateFields, PEM_MARKER};

use serde::Serialize;

/// Outcome of inspecting one domain's BIMI record.
///
/// Certificate fields are populated only when `certificate_url` is present
/// and the fetch plus PEM sniff succeed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BimiResult {
    pub record: String,
    pub logo_url: Option<String>,
    pub certificate_url: Option<String>,
    pub certificate_authority: Option<String>,
    pub certificate_issuer: Option<String>,
    pub certificate_issue_date: Option<String>,
    pub certificate_expiry: Option<String>,
    pub valid: bool,
    pub errors: Vec<String>,
}
