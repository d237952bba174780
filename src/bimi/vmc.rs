//! Best-effort VMC field extraction.
//!
//! Pulls the organization, issuer, and validity window out of the textual
//! companions most CAs ship alongside the PEM body (the `openssl x509
//! -text` dump). This is a narrowly scoped text-extraction strategy, kept
//! behind its own function so a real X.509 parser can replace it without
//! touching the evaluator's contract.

use chrono::{NaiveDateTime, TimeZone, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

/// PEM sniff marker; bodies without it are rejected as non-certificates.
pub const PEM_MARKER: &str = "-----BEGIN CERTIFICATE-----";

static ORGANIZATION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Organization:\s*O\s*=\s*(.+)").unwrap());
static BARE_O_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"O\s*=\s*(.+)").unwrap());
static ISSUER_CN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Issuer:.*?CN\s*=\s*([^,\r\n]+)").unwrap());
static NOT_BEFORE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"Not Before\s*:\s*(.+)").unwrap());
static NOT_AFTER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"Not After\s*:\s*(.+)").unwrap());

/// Fields pulled out of a fetched VMC body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateFields {
    /// Organization the mark is asserted for; `"Unknown"` when no match.
    pub authority: String,
    pub issuer: Option<String>,
    pub issue_date: Option<String>,
    pub expiry: Option<String>,
}

/// Extract identity fields from a PEM certificate body.
///
/// The caller is responsible for the PEM sniff; this function assumes the
/// marker is present. Validity timestamps are normalized to ISO-8601 when
/// they parse as the openssl text format, otherwise kept verbatim.
pub fn extract_certificate_fields(body: &str) -> CertificateFields {
    let authority = ORGANIZATION_RE
        .captures(body)
        .or_else(|| BARE_O_RE.captures(body))
        .map(|caps| caps[1].trim().to_string())
        .unwrap_or_else(|| "Unknown".to_string());

    let issuer = ISSUER_CN_RE
        .captures(body)
        .map(|caps| caps[1].trim().to_string());

    let issue_date = NOT_BEFORE_RE
        .captures(body)
        .map(|caps| normalize_validity_date(caps[1].trim()));

    let expiry = NOT_AFTER_RE
        .captures(body)
        .map(|caps| normalize_validity_date(caps[1].trim()));

    CertificateFields {
        authority,
        issuer,
        issue_date,
        expiry,
    }
}

/// Parse an openssl validity timestamp ("May 30 10:48:38 2027 GMT") and
/// render it as RFC 3339. Unparseable input is returned unchanged.
fn normalize_validity_date(raw: &str) -> String {
    let cleaned = raw.trim().trim_end_matches("GMT").trim();
    match NaiveDateTime::parse_from_str(cleaned, "%b %e %H:%M:%S %Y") {
        Ok(naive) => Utc.from_utc_datetime(&naive).to_rfc3339(),
        Err(_) => raw.trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
Certificate:
    Data:
        Issuer: C = US, O = DigiCert Inc, CN = DigiCert Verified Mark RSA4096 SHA256 2021 CA1
        Validity
            Not Before: May 30 00:00:00 2024 GMT
            Not After : May 30 23:59:59 2025 GMT
        Subject: Organization: O = Example Brands Inc
-----BEGIN CERTIFICATE-----
MIIFfTCCBGWgAwIBAgIQ
-----END CERTIFICATE-----
";

    #[test]
    fn authority_prefers_organization_line() {
        let fields = extract_certificate_fields(SAMPLE);
        assert_eq!(fields.authority, "Example Brands Inc");
    }

    #[test]
    fn authority_falls_back_to_bare_o() {
        let body = "Issuer: C = US\nSubject: O = Fallback Corp\n-----BEGIN CERTIFICATE-----\n";
        let fields = extract_certificate_fields(body);
        assert_eq!(fields.authority, "Fallback Corp");
    }

    #[test]
    fn authority_unknown_when_nothing_matches() {
        let fields = extract_certificate_fields("-----BEGIN CERTIFICATE-----\nAAAA\n");
        assert_eq!(fields.authority, "Unknown");
        assert!(fields.expiry.is_none());
        assert!(fields.issuer.is_none());
    }

    #[test]
    fn issuer_common_name_is_extracted() {
        let fields = extract_certificate_fields(SAMPLE);
        assert_eq!(
            fields.issuer.as_deref(),
            Some("DigiCert Verified Mark RSA4096 SHA256 2021 CA1")
        );
    }

    #[test]
    fn validity_dates_are_normalized_to_iso8601() {
        let fields = extract_certificate_fields(SAMPLE);
        assert_eq!(fields.issue_date.as_deref(), Some("2024-05-30T00:00:00+00:00"));
        assert_eq!(fields.expiry.as_deref(), Some("2025-05-30T23:59:59+00:00"));
    }

    #[test]
    fn unparseable_validity_date_is_kept_verbatim() {
        let body = "Not After : someday soon\n-----BEGIN CERTIFICATE-----\n";
        let fields = extract_certificate_fields(body);
        assert_eq!(fields.expiry.as_deref(), Some("someday soon"));
    }
}
