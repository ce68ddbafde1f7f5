//! Field validation engine.
//!
//! - [`certificate`] inspects pasted X.509 certificates.
//! - [`fields`] holds one validator per configuration field.
//! - [`ValidationLedger`] aggregates the findings of one pass and decides
//!   whether the values may be persisted.

pub mod certificate;
pub mod fields;
mod ledger;

pub use certificate::{
    CertificateDetails, CertificateParseResult, LogicCheck, parse_certificate, parse_certificate_at,
};
pub use fields::{FieldOutcome, FieldValidator, InvalidFlag, parse_flag};
pub use ledger::{ERRORS_TOKEN, ValidationLedger};
