use std::collections::{BTreeMap, HashSet};

use crate::common::dns::TxtResolver;
use crate::common::domain::normalize;

use super::parser::{classify_term, parse_spf_record, LookupMechanism, SpfTerm};
use super::{LookupDetail, SpfResult};

/// DNS lookup ceiling of RFC 7208 §4.6.4.
pub const MAX_DNS_LOOKUPS: u32 = 10;

/// Recursive SPF lookup auditor.
pub struct SpfEvaluator<'a, R: TxtResolver> {
    resolver: &'a R,
}

impl<'a, R: TxtResolver> SpfEvaluator<'a, R> {
    pub fn new(resolver: &'a R) -> Self {
        Self { resolver }
    }

    /// Audit an already-fetched SPF record published at `domain`.
    ///
    /// Walks the record depth-first: each `include`/`redirect` target is
    /// fetched and descended into synchronously before the next sibling
    /// token is examined, so lookup numbering is the pre-order traversal
    /// of mechanism discovery. Nested fetch failures are recorded on the
    /// affected node and never abort the walk.
    pub async fn evaluate(&self, domain: &str, record: &str) -> SpfResult {
        let parsed = parse_spf_record(record);

        let mut counter = 0u32;
        let mut nested_lookups = BTreeMap::new();
        let lookup_details = self
            .walk(
                record,
                domain,
                &HashSet::new(),
                0,
                &mut counter,
                &mut nested_lookups,
            )
            .await;

        let exceeds_lookup_limit = counter > MAX_DNS_LOOKUPS;
        let mut errors = Vec::new();
        if exceeds_lookup_limit {
            errors.push(format!(
                "SPF record requires {counter} DNS lookups, exceeding the limit of {MAX_DNS_LOOKUPS} allowed by RFC 7208."
            ));
        }

        SpfResult {
            record: record.to_string(),
            mechanisms: parsed.mechanisms,
            includes: parsed.includes,
            redirects: parsed.redirects,
            lookup_count: counter,
            exceeds_lookup_limit,
            nested_lookups,
            lookup_details,
            valid: false,
            errors,
        }
    }

    /// One recursion level of the lookup count.
    ///
    /// `visited` guards against cycles per branch: each level works on its
    /// own copy, so additions made inside one `include` subtree are not
    /// seen by its siblings. Diamond-shaped reuse of a sub-domain through
    /// two different siblings is therefore revisited and recounted; only a
    /// true cycle (a domain including itself through its own ancestry) is
    /// cut off. Historical counts depend on these exact semantics.
    ///
    /// `counter` is the single shared lookup tally, incremented once per
    /// lookup-triggering token in discovery order.
    async fn walk(
        &self,
        record: &str,
        domain: &str,
        visited: &HashSet<String>,
        depth: u32,
        counter: &mut u32,
        nested_lookups: &mut BTreeMap<String, String>,
    ) -> Vec<LookupDetail> {
        let domain_key = normalize(domain);
        if visited.contains(&domain_key) {
            log::debug!("SPF cycle at {domain_key}, cutting branch");
            return Vec::new();
        }
        let mut branch_visited = visited.clone();
        branch_visited.insert(domain_key);

        let mut details = Vec::new();
        for token in record.split_whitespace() {
            match classify_term(token) {
                SpfTerm::Include(target) => {
                    *counter += 1;
                    let number = *counter;
                    let (fetched, nested) = self
                        .descend(&target, &branch_visited, depth, counter, nested_lookups)
                        .await;
                    details.push(LookupDetail {
                        number,
                        mechanism: LookupMechanism::Include,
                        domain: target,
                        record: Some(fetched),
                        nested,
                        indent: depth,
                    });
                }
                SpfTerm::Redirect(target) => {
                    *counter += 1;
                    let number = *counter;
                    let (fetched, nested) = self
                        .descend(&target, &branch_visited, depth, counter, nested_lookups)
                        .await;
                    details.push(LookupDetail {
                        number,
                        mechanism: LookupMechanism::Redirect,
                        domain: target,
                        record: Some(fetched),
                        nested,
                        indent: depth,
                    });
                }
                SpfTerm::Lookup { mechanism, domain: target } => {
                    *counter += 1;
                    details.push(LookupDetail {
                        number: *counter,
                        mechanism,
                        domain: target.unwrap_or_else(|| domain.to_string()),
                        record: None,
                        nested: Vec::new(),
                        indent: depth,
                    });
                }
                SpfTerm::Other(_) => {}
            }
        }
        details
    }

    /// Fetch an `include`/`redirect` target and recurse into its record.
    ///
    /// A transport failure or a TXT answer set without an SPF record is
    /// reported as "No TXT record found" on the node and ends the branch.
    async fn descend(
        &self,
        target: &str,
        visited: &HashSet<String>,
        depth: u32,
        counter: &mut u32,
        nested_lookups: &mut BTreeMap<String, String>,
    ) -> (String, Vec<LookupDetail>) {
        let answers = match self.resolver.query_txt(target).await {
            Ok(answers) => answers,
            Err(e) => {
                log::warn!("TXT fetch failed for {target}: {e}");
                return ("No TXT record found".to_string(), Vec::new());
            }
        };

        let Some(sub_record) = answers.iter().find(|r| r.starts_with("v=spf1")) else {
            return ("No TXT record found".to_string(), Vec::new());
        };

        nested_lookups.insert(normalize(target), sub_record.clone());
        let nested = Box::pin(self.walk(
            sub_record,
            target,
            visited,
            depth + 1,
            counter,
            nested_lookups,
        ))
        .await;
        (sub_record.clone(), nested)
    }
}
