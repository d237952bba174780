//! Common infrastructure shared across the SPF, DMARC, and BIMI evaluators.

pub mod dns;
pub mod domain;
pub mod fetch;
