use indexmap::IndexMap;

use crate::{
    models::{ConfigField, Finding, Severity},
    render::{RenderMap, escape_html},
};

/// Placeholder that receives the form-global messages.
pub const ERRORS_TOKEN: &str = "[[ERRORS]]";

/// Findings collected during one pass over a record.
///
/// The warning and fatal flags only ever go from `false` to `true`, so the
/// commit decision does not depend on the order findings arrive in.
#[derive(Debug, Clone, Default)]
pub struct ValidationLedger {
    findings: Vec<Finding>,
    has_warning: bool,
    has_fatal: bool,
}

impl ValidationLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, finding: Finding) {
        tracing::debug!(
            field = finding.field.map(|f| f.as_str()),
            kind = ?finding.kind,
            severity = ?finding.severity,
            message = %finding.message,
            "Validation finding"
        );
        match finding.severity {
            Severity::Fatal => self.has_fatal = true,
            Severity::Warning => self.has_warning = true,
            Severity::Notice => {}
        }
        self.findings.push(finding);
    }

    pub fn extend(&mut self, findings: impl IntoIterator<Item = Finding>) {
        for finding in findings {
            self.record(finding);
        }
    }

    pub fn has_warning(&self) -> bool {
        self.has_warning
    }

    pub fn has_fatal(&self) -> bool {
        self.has_fatal
    }

    /// Whether the validated values may be persisted.
    pub fn may_commit(&self) -> bool {
        !self.has_warning && !self.has_fatal
    }

    /// Whether every form control should be rendered disabled.
    pub fn disable_controls(&self) -> bool {
        self.has_fatal
    }

    pub fn findings(&self) -> &[Finding] {
        &self.findings
    }

    pub fn is_empty(&self) -> bool {
        self.findings.is_empty()
    }

    /// `[[<PREFIX>_ERROR]]` for every field with findings, plus the
    /// `[[ERRORS]]` banner (empty when there are no global findings).
    pub fn render_tokens(&self) -> RenderMap {
        let mut per_field: IndexMap<ConfigField, Vec<String>> = IndexMap::new();
        let mut global = Vec::new();

        for finding in &self.findings {
            let message = render_message(&finding.message);
            match finding.field {
                Some(field) => per_field.entry(field).or_default().push(message),
                None => global.push(message),
            }
        }

        let mut tokens: RenderMap = per_field
            .into_iter()
            .map(|(field, messages)| (field.error_token(), messages.join("<br>")))
            .collect();

        let banner = if global.is_empty() {
            String::new()
        } else {
            let class = if self.has_fatal || self.has_warning {
                "alert-danger"
            } else {
                "alert-info"
            };
            format!(
                "<div class=\"alert {class}\" role=\"alert\">{}<br></div>",
                global.join("<br>")
            )
        };
        tokens.insert(ERRORS_TOKEN.to_string(), banner);

        tokens
    }
}

/// Messages are plain text; embedded newlines become line breaks.
fn render_message(message: &str) -> String {
    escape_html(message).replace('\n', "<br>")
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::models::FindingKind;

    fn warning() -> Finding {
        Finding::for_field(
            ConfigField::Strict,
            FindingKind::InvalidBooleanFlag,
            "Strict can only be 1 or 0",
        )
    }

    fn fatal() -> Finding {
        Finding::global(FindingKind::SchemaMismatch, "Schema mismatch")
    }

    fn notice() -> Finding {
        Finding::global(FindingKind::FeedUnreachable, "Feed down")
    }

    #[test]
    fn test_empty_ledger_allows_commit() {
        let ledger = ValidationLedger::new();
        assert!(ledger.may_commit());
        assert!(!ledger.disable_controls());
        assert_eq!(ledger.render_tokens().get(ERRORS_TOKEN).map(String::as_str), Some(""));
    }

    #[rstest]
    #[case::warning(vec![warning()], false, false)]
    #[case::fatal(vec![fatal()], false, true)]
    #[case::notice(vec![notice()], true, false)]
    #[case::warning_then_fatal(vec![warning(), fatal()], false, true)]
    #[case::fatal_then_warning(vec![fatal(), warning()], false, true)]
    #[case::notice_after_warning(vec![warning(), notice()], false, false)]
    fn test_flags(
        #[case] findings: Vec<Finding>,
        #[case] may_commit: bool,
        #[case] disable_controls: bool,
    ) {
        let mut ledger = ValidationLedger::new();
        ledger.extend(findings);
        assert_eq!(ledger.may_commit(), may_commit);
        assert_eq!(ledger.disable_controls(), disable_controls);
    }

    #[test]
    fn test_field_messages_are_joined() {
        let mut ledger = ValidationLedger::new();
        ledger.record(warning());
        ledger.record(Finding::for_field(
            ConfigField::Strict,
            FindingKind::InvalidBooleanFlag,
            "second",
        ));
        let tokens = ledger.render_tokens();
        assert_eq!(tokens["[[STRICT_ERROR]]"], "Strict can only be 1 or 0<br>second");
        assert_eq!(tokens[ERRORS_TOKEN], "");
        assert_eq!(ledger.findings().len(), 2);
    }

    #[test]
    fn test_global_banner() {
        let mut ledger = ValidationLedger::new();
        ledger.record(fatal());
        ledger.record(Finding::global(FindingKind::UnknownField, "No handler for <x>"));
        let banner = &ledger.render_tokens()[ERRORS_TOKEN];
        assert_eq!(
            banner,
            "<div class=\"alert alert-danger\" role=\"alert\">Schema mismatch<br>No handler for &lt;x&gt;<br></div>"
        );
    }

    #[test]
    fn test_notice_banner_is_informational() {
        let mut ledger = ValidationLedger::new();
        ledger.record(notice());
        assert!(ledger.render_tokens()[ERRORS_TOKEN].contains("alert-info"));
    }

    #[test]
    fn test_multiline_message() {
        let mut ledger = ValidationLedger::new();
        ledger.record(Finding::for_field(
            ConfigField::IdpCertificate,
            FindingKind::CertificateMarkerMissing,
            "first\nsecond",
        ));
        assert_eq!(ledger.render_tokens()["[[IP_CERT_ERROR]]"], "first<br>second");
    }
}
