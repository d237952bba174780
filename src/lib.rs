//! DNS email-authentication resolution engine: SPF, DMARC, and BIMI.
//!
//! Given a domain, the [`Inspector`] fetches its authentication TXT records
//! over DNS-over-HTTPS and audits them: the SPF walk recursively follows
//! `include`/`redirect` chains while enforcing the 10-lookup ceiling of
//! RFC 7208, the DMARC evaluator validates the tag vocabulary and checks
//! third-party report authorization, and the BIMI evaluator fetches the
//! Verified Mark Certificate and extracts its identity fields.
//!
//! DNS caching is the caller's responsibility. The network sits behind the
//! [`common::dns::TxtResolver`] and [`common::fetch::BodyFetcher`] traits —
//! implement them to supply caching, a different transport, or test doubles.
//!
//! ```no_run
//! use email_auth_inspector::{Inspector, Scope};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let inspector = Inspector::new()?;
//! let result = inspector.resolve("example.com", Scope::All).await;
//! if let Some(spf) = &result.spf {
//!     println!("{} DNS lookups, valid: {}", spf.lookup_count, spf.valid);
//! }
//! # Ok(())
//! # }
//! ```

pub mod bimi;
pub mod common;
pub mod dmarc;
pub mod spf;

mod inspector;

pub use inspector::{
    DomainResult, Inspector, InspectorError, LookupStatus, Scope, DEFAULT_CONCURRENCY,
};
