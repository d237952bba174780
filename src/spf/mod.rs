//! SPF (Sender Policy Framework) lookup auditing per RFC 7208.
//!
//! This module does not evaluate `check_host()` against a client IP; it
//! audits a published record: how many DNS-querying mechanisms the record
//! reaches through its `include`/`redirect` chains, and whether that total
//! breaches the 10-lookup ceiling of RFC 7208 §4.6.4.

mod parser;
mod walker;

pub use parser::{classify_term, parse_spf_record, LookupMechanism, ParsedSpf, SpfTerm};
pub use walker::{SpfEvaluator, MAX_DNS_LOOKUPS};

use std::collections::BTreeMap;

use serde::Serialize;

/// One lookup-triggering mechanism encountered during the recursive walk.
///
/// Forms a tree rooted at the initiating domain's record: `include` and
/// `redirect` nodes carry the fetched sub-record and its own lookups under
/// `nested`; `a`/`mx`/`ptr`/`exists` nodes are counted but never followed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LookupDetail {
    /// Global 1-based sequence index, assigned in depth-first pre-order.
    pub number: u32,
    pub mechanism: LookupMechanism,
    pub domain: String,
    /// Raw TXT record fetched for `include`/`redirect` targets.
    pub record: Option<String>,
    pub nested: Vec<LookupDetail>,
    /// Recursion depth, 0 at the root record.
    pub indent: u32,
}

/// Outcome of auditing one domain's SPF record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpfResult {
    pub record: String,
    /// Every whitespace-separated token of the top-level record.
    pub mechanisms: Vec<String>,
    pub includes: Vec<String>,
    pub redirects: Vec<String>,
    /// Total lookup-triggering mechanisms across the whole recursive walk.
    pub lookup_count: u32,
    pub exceeds_lookup_limit: bool,
    /// Raw record text per resolved sub-domain.
    pub nested_lookups: BTreeMap<String, String>,
    pub lookup_details: Vec<LookupDetail>,
    pub valid: bool,
    pub errors: Vec<String>,
}
