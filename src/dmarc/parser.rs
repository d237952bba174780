use crate::common::domain::label_count;

use super::{DmarcResult, DmarcTag};

/// Parse a DMARC record's tag=value pairs into a [`DmarcResult`].
///
/// Pure and synchronous: third-party report authorization is checked
/// separately by [`super::DmarcEvaluator`]. `domain` is the domain the
/// record was published under; it only influences the `sp=` warning.
pub fn parse_dmarc_record(record: &str, domain: &str) -> DmarcResult {
    let mut result = DmarcResult::empty(record);

    let pairs: Vec<(&str, &str)> = record
        .split(';')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .filter_map(|part| part.split_once('='))
        .map(|(tag, value)| (tag.trim(), value.trim()))
        .collect();

    // sp= only binds at the organizational domain (RFC 7489 §6.3); flag it
    // when the record is published on a subdomain.
    if label_count(domain) > 2 && pairs.iter().any(|(tag, _)| *tag == "sp") {
        result.warnings.push(format!(
            "The 'sp' tag only applies at the organizational domain; it has no effect on the subdomain '{domain}'."
        ));
    }

    for (tag, value) in pairs {
        let Some(known) = DmarcTag::from_name(tag) else {
            result
                .errors
                .push(format!("'{tag}' is not a valid DMARC tag."));
            continue;
        };
        match known {
            DmarcTag::Version => {}
            DmarcTag::Policy => result.policy = Some(value.to_string()),
            DmarcTag::SubdomainPolicy => result.subdomain_policy = Some(value.to_string()),
            DmarcTag::Percentage => {
                result.percentage = value.parse().unwrap_or(100).min(100);
            }
            DmarcTag::AggregateReportUris => result.rua_emails = parse_report_uris(value),
            DmarcTag::ForensicReportUris => result.ruf_emails = parse_report_uris(value),
            DmarcTag::FailureOptions => result.fo = Some(value.to_string()),
            DmarcTag::DkimAlignment => result.adkim = Some(value.to_string()),
            DmarcTag::SpfAlignment => result.aspf = Some(value.to_string()),
            DmarcTag::ReportFormat => result.rf = Some(value.to_string()),
            DmarcTag::ReportInterval => result.ri = Some(value.to_string()),
        }
    }

    // Deduplicated union of rua + ruf, first-seen order.
    for email in result.rua_emails.iter().chain(result.ruf_emails.iter()) {
        if !result.reporting_emails.contains(email) {
            result.reporting_emails.push(email.clone());
        }
    }

    result
}

/// Split a rua/ruf value on commas, stripping the `mailto:` scheme.
fn parse_report_uris(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|entry| {
            let entry = entry.trim();
            entry.strip_prefix("mailto:").unwrap_or(entry).trim().to_string()
        })
        .filter(|entry| !entry.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_minimal_record() {
        let result = parse_dmarc_record("v=DMARC1; p=none", "example.com");
        assert_eq!(result.policy.as_deref(), Some("none"));
        assert_eq!(result.percentage, 100);
        assert!(result.errors.is_empty());
    }

    #[test]
    fn parse_full_record() {
        let result = parse_dmarc_record(
            "v=DMARC1; p=reject; sp=quarantine; pct=50; adkim=s; aspf=r; fo=1; rf=afrf; ri=3600; \
             rua=mailto:agg@example.com; ruf=mailto:for@example.com",
            "example.com",
        );
        assert_eq!(result.policy.as_deref(), Some("reject"));
        assert_eq!(result.subdomain_policy.as_deref(), Some("quarantine"));
        assert_eq!(result.percentage, 50);
        assert_eq!(result.adkim.as_deref(), Some("s"));
        assert_eq!(result.aspf.as_deref(), Some("r"));
        assert_eq!(result.fo.as_deref(), Some("1"));
        assert_eq!(result.rf.as_deref(), Some("afrf"));
        assert_eq!(result.ri.as_deref(), Some("3600"));
        assert_eq!(result.rua_emails, vec!["agg@example.com"]);
        assert_eq!(result.ruf_emails, vec!["for@example.com"]);
        assert!(result.errors.is_empty());
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn unknown_tag_appends_one_error_and_touches_no_field() {
        let result = parse_dmarc_record("v=DMARC1; p=none; x=foo", "example.com");
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].contains("'x'"));
        assert_eq!(result.policy.as_deref(), Some("none"));
        assert_eq!(result.percentage, 100);
        assert!(result.fo.is_none());
        assert!(result.rf.is_none());
    }

    #[test]
    fn pct_defaults_to_100_when_absent() {
        let result = parse_dmarc_record("v=DMARC1; p=none", "example.com");
        assert_eq!(result.percentage, 100);
    }

    #[test]
    fn pct_defaults_to_100_when_non_numeric() {
        let result = parse_dmarc_record("v=DMARC1; p=none; pct=abc", "example.com");
        assert_eq!(result.percentage, 100);
    }

    #[test]
    fn pct_is_clamped_to_100() {
        let result = parse_dmarc_record("v=DMARC1; p=none; pct=150", "example.com");
        assert_eq!(result.percentage, 100);
    }

    #[test]
    fn reporting_emails_union_is_deduplicated() {
        let result = parse_dmarc_record(
            "v=DMARC1; p=none; rua=mailto:a@example.com, mailto:b@example.com; \
             ruf=mailto:a@example.com",
            "example.com",
        );
        assert_eq!(result.rua_emails, vec!["a@example.com", "b@example.com"]);
        assert_eq!(result.ruf_emails, vec!["a@example.com"]);
        assert_eq!(result.reporting_emails, vec!["a@example.com", "b@example.com"]);
    }

    #[test]
    fn mailto_prefix_is_optional() {
        let result = parse_dmarc_record("v=DMARC1; p=none; rua=plain@example.com", "example.com");
        assert_eq!(result.rua_emails, vec!["plain@example.com"]);
    }

    #[test]
    fn sp_on_subdomain_warns_but_is_not_an_error() {
        let result = parse_dmarc_record("v=DMARC1; p=none; sp=reject", "mail.example.com");
        assert_eq!(result.warnings.len(), 1);
        assert!(result.warnings[0].contains("mail.example.com"));
        assert!(result.errors.is_empty());
        assert_eq!(result.subdomain_policy.as_deref(), Some("reject"));
    }

    #[test]
    fn sp_on_organizational_domain_does_not_warn() {
        let result = parse_dmarc_record("v=DMARC1; p=none; sp=reject", "example.com");
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn empty_segments_are_dropped() {
        let result = parse_dmarc_record("v=DMARC1;; p=none; ;", "example.com");
        assert_eq!(result.policy.as_deref(), Some("none"));
        assert!(result.errors.is_empty());
    }
}
