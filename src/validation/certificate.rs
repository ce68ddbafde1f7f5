//! Structural and X.509 inspection of certificates pasted into the form.
//!
//! Administrators usually paste certificates as one long line, and form
//! transport may leave literal `\r\n` escapes behind. The inspector strips
//! all of that, checks the PEM markers, rebuilds a canonical
//! `header\npayload\nfooter` string and, when the `x509` feature is
//! compiled in, decodes the certificate to report who issued it and how
//! long it remains valid.
//!
//! Inspection never fails: every stage that could not run leaves its
//! fields empty so callers can render "no details available" uniformly.

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::Serialize;

static LINE_BREAKS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\r\n|\r|\n").unwrap());
static BEGIN_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"-+BEGIN CERTIFICATE-+").unwrap());
static END_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"-+END CERTIFICATE-+").unwrap());
static PEM_PARTS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(-+BEGIN CERTIFICATE-+)(.+?)(-+END CERTIFICATE-+)").unwrap()
});

/// Outcome of decoding the reconstructed certificate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LogicCheck {
    /// Decoded as an X.509 certificate.
    Valid,
    /// The payload is not a decodable certificate.
    Invalid,
    /// Built without X.509 support; the payload was not inspected.
    Unavailable,
}

/// Subject and issuer names of a decoded certificate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CertificateDetails {
    /// Subject common name.
    pub common_name: Option<String>,
    /// Issuer organization.
    pub issuer_organization: Option<String>,
    /// Issuer common name.
    pub issuer_common_name: Option<String>,
}

/// Everything learned about one certificate string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CertificateParseResult {
    pub begin_tag_present: bool,
    pub end_tag_present: bool,
    /// A BEGIN ... END envelope with a payload was found.
    pub cert_semantics_valid: bool,
    /// `None` when the envelope was not found and decoding was skipped.
    pub cert_logic_valid: Option<LogicCheck>,
    /// Canonical certificate when the envelope was found, otherwise the
    /// input with line breaks removed.
    pub cert_str: String,
    pub details: Option<CertificateDetails>,
    /// Not-before date, `YYYY-MM-DD`.
    pub valid_from: Option<String>,
    /// Not-after date, `YYYY-MM-DD`.
    pub valid_to: Option<String>,
    /// Whole days until not-after; negative once expired.
    pub days_remaining: Option<i64>,
}

impl CertificateParseResult {
    pub fn markers_present(&self) -> bool {
        self.begin_tag_present && self.end_tag_present
    }

    /// Messages describing each missing marker.
    pub fn marker_problems(&self) -> Vec<&'static str> {
        let mut problems = Vec::new();
        if !self.begin_tag_present {
            problems.push("The certificate BEGIN tag should be present");
        }
        if !self.end_tag_present {
            problems.push("The certificate END tag should be present");
        }
        problems
    }
}

/// Inspect a certificate string against the current time.
pub fn parse_certificate(raw: &str) -> CertificateParseResult {
    parse_certificate_at(raw, Utc::now())
}

/// Inspect a certificate string, computing remaining validity against `now`.
pub fn parse_certificate_at(raw: &str, now: DateTime<Utc>) -> CertificateParseResult {
    let cert = strip_line_breaks(raw);

    let begin_tag_present = BEGIN_TAG.is_match(&cert);
    let end_tag_present = END_TAG.is_match(&cert);

    let Some(parts) = PEM_PARTS.captures(&cert) else {
        return CertificateParseResult {
            begin_tag_present,
            end_tag_present,
            cert_semantics_valid: false,
            cert_logic_valid: None,
            cert_str: cert,
            details: None,
            valid_from: None,
            valid_to: None,
            days_remaining: None,
        };
    };

    let payload = &parts[2];
    let cert_str = format!("{}\n{}\n{}", &parts[1], payload, &parts[3]);

    let mut result = CertificateParseResult {
        begin_tag_present,
        end_tag_present,
        cert_semantics_valid: true,
        cert_logic_valid: None,
        cert_str: String::new(),
        details: None,
        valid_from: None,
        valid_to: None,
        days_remaining: None,
    };

    match decode(payload) {
        Decoded::Certificate(decoded) => {
            result.cert_logic_valid = Some(LogicCheck::Valid);
            result.valid_from = Some(decoded.not_before.format("%Y-%m-%d").to_string());
            result.valid_to = Some(decoded.not_after.format("%Y-%m-%d").to_string());
            result.days_remaining = Some((decoded.not_after - now).num_days());
            result.details = Some(decoded.details);
        }
        Decoded::Invalid(reason) => {
            tracing::debug!(reason = %reason, "Certificate payload could not be decoded");
            result.cert_logic_valid = Some(LogicCheck::Invalid);
        }
        Decoded::Unavailable => {
            result.cert_logic_valid = Some(LogicCheck::Unavailable);
        }
    }

    result.cert_str = cert_str;
    result
}

/// Remove real line breaks and the literal `\r\n`, `\r`, `\n` escapes that
/// form transport tends to leave behind.
fn strip_line_breaks(raw: &str) -> String {
    LINE_BREAKS
        .replace_all(raw, "")
        .replace(r"\r\n", "")
        .replace(r"\r", "")
        .replace(r"\n", "")
}

struct DecodedCertificate {
    details: CertificateDetails,
    not_before: DateTime<Utc>,
    not_after: DateTime<Utc>,
}

enum Decoded {
    Certificate(DecodedCertificate),
    Invalid(String),
    #[cfg_attr(feature = "x509", allow(dead_code))]
    Unavailable,
}

#[cfg(not(feature = "x509"))]
fn decode(_payload: &str) -> Decoded {
    Decoded::Unavailable
}

#[cfg(feature = "x509")]
fn decode(payload: &str) -> Decoded {
    match x509::decode(payload) {
        Ok(decoded) => Decoded::Certificate(decoded),
        Err(e) => Decoded::Invalid(e.to_string()),
    }
}

#[cfg(feature = "x509")]
mod x509 {
    use base64::{Engine, engine::general_purpose::STANDARD};
    use chrono::{DateTime, Utc};
    use openssl::{
        asn1::{Asn1Time, Asn1TimeRef},
        nid::Nid,
        x509::{X509, X509NameRef},
    };

    use super::{CertificateDetails, DecodedCertificate};

    #[derive(Debug, thiserror::Error)]
    pub(super) enum DecodeError {
        #[error("payload is not base64: {0}")]
        Base64(#[from] base64::DecodeError),

        #[error("payload is not an X.509 certificate: {0}")]
        Openssl(#[from] openssl::error::ErrorStack),

        #[error("certificate validity is out of range")]
        TimeOutOfRange,
    }

    pub(super) fn decode(payload: &str) -> Result<DecodedCertificate, DecodeError> {
        let compact: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
        let der = STANDARD.decode(compact)?;
        let cert = X509::from_der(&der)?;

        Ok(DecodedCertificate {
            details: CertificateDetails {
                common_name: name_entry(cert.subject_name(), Nid::COMMONNAME),
                issuer_organization: name_entry(cert.issuer_name(), Nid::ORGANIZATIONNAME),
                issuer_common_name: name_entry(cert.issuer_name(), Nid::COMMONNAME),
            },
            not_before: to_utc(cert.not_before())?,
            not_after: to_utc(cert.not_after())?,
        })
    }

    fn name_entry(name: &X509NameRef, nid: Nid) -> Option<String> {
        name.entries_by_nid(nid)
            .next()
            .and_then(|entry| entry.data().as_utf8().ok())
            .map(|value| value.to_string())
    }

    fn to_utc(time: &Asn1TimeRef) -> Result<DateTime<Utc>, DecodeError> {
        let epoch = Asn1Time::from_unix(0)?;
        let diff = epoch.diff(time)?;
        let secs = i64::from(diff.days) * 86_400 + i64::from(diff.secs);
        DateTime::from_timestamp(secs, 0).ok_or(DecodeError::TimeOutOfRange)
    }
}
