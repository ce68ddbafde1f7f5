use serde::Serialize;

use super::ConfigField;

/// How a finding affects the configuration round-trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Shown to the administrator, never blocks anything.
    Notice,
    /// Blocks persistence; the form stays editable.
    Warning,
    /// Blocks persistence and disables every form control.
    Fatal,
}

/// What went wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingKind {
    /// The loaded record does not have the expected number of entries.
    SchemaMismatch,
    /// The store could not be reached or returned no configuration.
    StoreUnavailable,
    /// The store refused to persist an accepted configuration.
    PersistenceFailed,
    /// A stored column without a matching field handler.
    UnknownField,
    InvalidBooleanFlag,
    CertificateMarkerMissing,
    KeyMarkerMissing,
    FeedUnreachable,
    FeedUnparseable,
}

impl FindingKind {
    /// Severity assigned to findings of this kind.
    pub fn severity(&self) -> Severity {
        match self {
            FindingKind::SchemaMismatch
            | FindingKind::StoreUnavailable
            | FindingKind::PersistenceFailed => Severity::Fatal,
            FindingKind::UnknownField
            | FindingKind::InvalidBooleanFlag
            | FindingKind::CertificateMarkerMissing
            | FindingKind::KeyMarkerMissing => Severity::Warning,
            FindingKind::FeedUnreachable | FindingKind::FeedUnparseable => Severity::Notice,
        }
    }
}

/// One validation outcome.
///
/// Findings without a field are form-global and end up in the page banner;
/// field-scoped findings are rendered next to their field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    pub field: Option<ConfigField>,
    pub kind: FindingKind,
    pub severity: Severity,
    pub message: String,
}

impl Finding {
    /// A form-global finding with the kind's default severity.
    pub fn global(kind: FindingKind, message: impl Into<String>) -> Self {
        Self {
            field: None,
            kind,
            severity: kind.severity(),
            message: message.into(),
        }
    }

    /// A finding scoped to one field with the kind's default severity.
    pub fn for_field(field: ConfigField, kind: FindingKind, message: impl Into<String>) -> Self {
        Self {
            field: Some(field),
            kind,
            severity: kind.severity(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for Finding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.field {
            Some(field) => write!(f, "{}: {}", field, self.message),
            None => f.write_str(&self.message),
        }
    }
}
