use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

/// Mechanisms that cost a DNS lookup under RFC 7208 §4.6.4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LookupMechanism {
    Include,
    Redirect,
    A,
    Mx,
    Ptr,
    Exists,
}

impl LookupMechanism {
    pub fn as_str(&self) -> &'static str {
        match self {
            LookupMechanism::Include => "include",
            LookupMechanism::Redirect => "redirect",
            LookupMechanism::A => "a",
            LookupMechanism::Mx => "mx",
            LookupMechanism::Ptr => "ptr",
            LookupMechanism::Exists => "exists",
        }
    }
}

/// One classified SPF token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpfTerm {
    /// `include:<domain>` — counted and followed.
    Include(String),
    /// `redirect=<domain>` — counted and followed.
    Redirect(String),
    /// `a`/`mx`/`ptr`/`exists`, optionally qualified and with an optional
    /// `:<domain>` suffix — counted but never followed. A missing domain
    /// means the enclosing record's domain.
    Lookup {
        mechanism: LookupMechanism,
        domain: Option<String>,
    },
    /// Anything else (`all`, `ip4:`, modifiers, unknown tokens). Kept as an
    /// opaque mechanism, never an error.
    Other(String),
}

/// Bare or qualified a/mx/ptr/exists mechanism, optional `:<domain>`.
static LOOKUP_MECHANISM_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[+\-~?]?(a|mx|ptr|exists)(?::(\S+))?$").unwrap());

/// Classify a single whitespace-separated SPF token.
///
/// Precedence: `include:` prefix, then `redirect=` prefix (both exact and
/// case-sensitive), then the lookup-mechanism pattern, else opaque.
pub fn classify_term(token: &str) -> SpfTerm {
    if let Some(target) = token.strip_prefix("include:") {
        return SpfTerm::Include(target.to_string());
    }
    if let Some(target) = token.strip_prefix("redirect=") {
        return SpfTerm::Redirect(target.to_string());
    }
    if let Some(caps) = LOOKUP_MECHANISM_RE.captures(token) {
        let mechanism = match &caps[1] {
            "a" => LookupMechanism::A,
            "mx" => LookupMechanism::Mx,
            "ptr" => LookupMechanism::Ptr,
            _ => LookupMechanism::Exists,
        };
        return SpfTerm::Lookup {
            mechanism,
            domain: caps.get(2).map(|m| m.as_str().to_string()),
        };
    }
    SpfTerm::Other(token.to_string())
}

/// Flat view of a single SPF record: every token plus the `include`/
/// `redirect` targets it names directly.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsedSpf {
    pub mechanisms: Vec<String>,
    pub includes: Vec<String>,
    pub redirects: Vec<String>,
}

/// Split a record on whitespace and classify each token. Unknown tokens are
/// kept as opaque mechanisms.
pub fn parse_spf_record(record: &str) -> ParsedSpf {
    let mut parsed = ParsedSpf::default();
    for token in record.split_whitespace() {
        parsed.mechanisms.push(token.to_string());
        match classify_term(token) {
            SpfTerm::Include(target) => parsed.includes.push(target),
            SpfTerm::Redirect(target) => parsed.redirects.push(target),
            _ => {}
        }
    }
    parsed
}
