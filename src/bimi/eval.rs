use crate::common::fetch::BodyFetcher;

use super::parser::parse_bimi_tags;
use super::vmc::{extract_certificate_fields, PEM_MARKER};
use super::BimiResult;

/// BIMI record evaluator: tag parsing plus VMC retrieval and inspection.
pub struct BimiEvaluator<'a, F: BodyFetcher> {
    fetcher: &'a F,
}

impl<'a, F: BodyFetcher> BimiEvaluator<'a, F> {
    pub fn new(fetcher: &'a F) -> Self {
        Self { fetcher }
    }

    /// Inspect an already-fetched BIMI record.
    ///
    /// When the record carries an `a=` URL the certificate is fetched and
    /// its identity fields extracted. Fetch and parse problems land in
    /// `errors`; they never propagate.
    pub async fn evaluate(&self, record: &str) -> BimiResult {
        let parsed = parse_bimi_tags(record);
        let mut result = BimiResult {
            record: record.to_string(),
            logo_url: parsed.logo_url,
            certificate_url: parsed.certificate_url,
            certificate_authority: None,
            certificate_issuer: None,
            certificate_issue_date: None,
            certificate_expiry: None,
            valid: false,
            errors: Vec::new(),
        };

        let Some(url) = result.certificate_url.clone() else {
            return result;
        };

        match self.fetcher.fetch(&url).await {
            Ok(fetched) if !fetched.ok => {
                result
                    .errors
                    .push("Failed to fetch BIMI Verified Mark Certificate (VMC).".to_string());
            }
            Ok(fetched) => {
                if fetched.body.contains(PEM_MARKER) {
                    let fields = extract_certificate_fields(&fetched.body);
                    result.certificate_authority = Some(fields.authority);
                    result.certificate_issuer = fields.issuer;
                    result.certificate_issue_date = fields.issue_date;
                    result.certificate_expiry = fields.expiry;
                } else {
                    result.errors.push(
                        "Fetched VMC URL content does not appear to be a valid PEM certificate."
                            .to_string(),
                    );
                }
            }
            Err(e) => {
                log::warn!("VMC fetch failed for {url}: {e}");
                result
                    .errors
                    .push("Error fetching or parsing BIMI certificate.".to_string());
            }
        }

        result
    }
}
