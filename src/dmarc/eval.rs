use crate::common::dns::TxtResolver;
use crate::common::domain::{domain_from_email, domains_equal, normalize};

use super::parser::parse_dmarc_record;
use super::DmarcResult;

/// DMARC record evaluator: tag parsing plus third-party report
/// authorization checks (RFC 7489 §7.1).
pub struct DmarcEvaluator<'a, R: TxtResolver> {
    resolver: &'a R,
}

impl<'a, R: TxtResolver> DmarcEvaluator<'a, R> {
    pub fn new(resolver: &'a R) -> Self {
        Self { resolver }
    }

    /// Parse an already-fetched DMARC record published at `domain` and
    /// verify that every external report recipient's domain has published
    /// an authorization record at
    /// `<policy-domain>._report._dmarc.<reporting-domain>`.
    ///
    /// A failed or empty authorization lookup downgrades to a warning;
    /// it never becomes an error and never propagates.
    pub async fn evaluate(&self, domain: &str, record: &str) -> DmarcResult {
        let mut result = parse_dmarc_record(record, domain);

        let emails = result.reporting_emails.clone();
        for email in &emails {
            let Some(report_domain) = domain_from_email(email) else {
                continue;
            };
            if domains_equal(report_domain, domain) {
                continue;
            }
            if !self.is_authorized(domain, report_domain).await {
                result.warnings.push(format!(
                    "External domain '{report_domain}' may not be authorized to receive DMARC reports for '{domain}'."
                ));
            }
        }

        result
    }

    async fn is_authorized(&self, policy_domain: &str, report_domain: &str) -> bool {
        let name = format!(
            "{}._report._dmarc.{}",
            normalize(policy_domain),
            normalize(report_domain)
        );
        match self.resolver.query_txt(&name).await {
            Ok(answers) => answers.iter().any(|r| r.contains("v=DMARC1")),
            Err(e) => {
                log::warn!("authorization lookup failed for {name}: {e}");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::dns::{DnsError, MockResolver};

    async fn evaluate(resolver: &MockResolver, domain: &str, record: &str) -> DmarcResult {
        DmarcEvaluator::new(resolver).evaluate(domain, record).await
    }

    #[tokio::test]
    async fn same_domain_recipients_trigger_no_authorization_query() {
        let resolver = MockResolver::new();
        let result = evaluate(
            &resolver,
            "example.com",
            "v=DMARC1; p=reject; rua=mailto:a@example.com,mailto:b@example.com; pct=50",
        )
        .await;

        assert_eq!(result.policy.as_deref(), Some("reject"));
        assert_eq!(result.percentage, 50);
        assert_eq!(result.reporting_emails, vec!["a@example.com", "b@example.com"]);
        assert!(resolver.queries().is_empty());
        assert!(result.warnings.is_empty());
        assert!(result.errors.is_empty());
    }

    #[tokio::test]
    async fn external_recipient_queries_the_report_authorization_name() {
        let resolver = MockResolver::new();
        let result = evaluate(
            &resolver,
            "example.com",
            "v=DMARC1; p=none; rua=mailto:dmarc@other.org",
        )
        .await;

        assert_eq!(
            resolver.queries(),
            vec!["example.com._report._dmarc.other.org"]
        );
        assert_eq!(result.warnings.len(), 1);
        assert!(result.warnings[0].contains("'other.org'"));
        assert!(result.errors.is_empty());
    }

    #[tokio::test]
    async fn authorized_external_recipient_produces_no_warning() {
        let resolver = MockResolver::new();
        resolver.add_txt(
            "example.com._report._dmarc.other.org",
            vec!["v=DMARC1".into()],
        );
        let result = evaluate(
            &resolver,
            "example.com",
            "v=DMARC1; p=none; ruf=mailto:dmarc@other.org",
        )
        .await;
        assert!(result.warnings.is_empty());
    }

    #[tokio::test]
    async fn authorization_lookup_failure_downgrades_to_warning() {
        let resolver = MockResolver::new();
        resolver.add_failure(
            "example.com._report._dmarc.other.org",
            DnsError::Timeout("example.com._report._dmarc.other.org".into()),
        );
        let result = evaluate(
            &resolver,
            "example.com",
            "v=DMARC1; p=none; rua=mailto:dmarc@other.org",
        )
        .await;
        assert_eq!(result.warnings.len(), 1);
        assert!(result.errors.is_empty());
    }

    #[tokio::test]
    async fn duplicate_external_recipient_is_checked_once() {
        let resolver = MockResolver::new();
        resolver.add_txt(
            "example.com._report._dmarc.other.org",
            vec!["v=DMARC1".into()],
        );
        let _ = evaluate(
            &resolver,
            "example.com",
            "v=DMARC1; p=none; rua=mailto:dmarc@other.org; ruf=mailto:dmarc@other.org",
        )
        .await;
        assert_eq!(resolver.queries().len(), 1);
    }
}
