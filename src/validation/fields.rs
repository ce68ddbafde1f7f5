//! Per-field validation and form token generation.
//!
//! Every [`ConfigField`] maps to exactly one static validator. A validator
//! looks at a single raw value and returns what the form needs for that
//! field: the normalized value, any findings, and the `[[PREFIX_*]]`
//! placeholders it owns. Validators never see other fields and never touch
//! shared state; the reconciler merges their outcomes.

use crate::{
    models::{ConfigField, Finding, FindingKind},
    render::{RenderMap, escape_html, select_options, token},
    validation::certificate::parse_certificate,
};

/// Options of every Yes/No select.
const FLAG_OPTIONS: &[(&str, &str)] = &[("1", "Yes"), ("0", "No")];

const NAMEID_FORMATS: &[(&str, &str)] = &[
    ("unspecified", "Unspecified"),
    ("emailAddress", "Email Address"),
    ("transient", "Transient"),
    ("persistent", "Persistent"),
];

const AUTHN_CONTEXTS: &[(&str, &str)] = &[
    ("PasswordProtectedTransport", "PasswordProtectedTransport"),
    ("Password", "Password"),
    ("X509", "X509"),
];

const AUTHN_COMPARISONS: &[(&str, &str)] = &[
    ("exact", "Exact"),
    ("minimum", "Minimum"),
    ("maximum", "Maximum"),
    ("better", "Better"),
];

/// Stored value of `requested_authn_context` when no context is requested.
pub const NO_AUTHN_CONTEXT: &str = "none";

const NO_CERTIFICATE_DETAILS: &str = "No certificate details provided or available";

const INVALID_PRIVATE_KEY: &str = "This does not look like a valid private key, please make sure to include the private key BEGIN and END tags";

/// What one validator produced for one raw value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldOutcome {
    /// The value after normalization.
    pub value: String,
    pub findings: Vec<Finding>,
    pub tokens: RenderMap,
}

impl FieldOutcome {
    fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            ..Default::default()
        }
    }

    fn token(mut self, field: ConfigField, suffix: &str, value: impl Into<String>) -> Self {
        self.tokens
            .insert(token(field.token_prefix(), suffix), value.into());
        self
    }

    fn token_exact(mut self, placeholder: &str, value: String) -> Self {
        self.tokens.insert(placeholder.to_string(), value);
        self
    }

    fn labelled(self, field: ConfigField, label: &str, title: &str) -> Self {
        self.token(field, "LABEL", label).token(field, "TITLE", title)
    }

    fn finding(mut self, finding: Finding) -> Self {
        self.findings.push(finding);
        self
    }
}

/// Validates and renders one configuration field.
pub trait FieldValidator: Send + Sync {
    fn validate(&self, raw: &str) -> FieldOutcome;
}

/// A flag value that is neither `0` nor `1`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("expected 0 or 1, got {0:?}")]
pub struct InvalidFlag(pub String);

/// Parse a stored or submitted flag. Only the exact strings `0` and `1` are
/// accepted.
pub fn parse_flag(raw: &str) -> Result<bool, InvalidFlag> {
    match raw {
        "1" => Ok(true),
        "0" => Ok(false),
        other => Err(InvalidFlag(other.to_string())),
    }
}

/// `0`/`1` toggle rendered as a Yes/No select.
pub struct BooleanFlag {
    field: ConfigField,
    /// Short name used in the error message.
    name: &'static str,
    label: &'static str,
    title: &'static str,
}

impl FieldValidator for BooleanFlag {
    fn validate(&self, raw: &str) -> FieldOutcome {
        let outcome = FieldOutcome::new(raw)
            .labelled(self.field, self.label, self.title)
            .token(self.field, "SELECT", select_options(FLAG_OPTIONS, Some(raw)));

        match parse_flag(raw) {
            Ok(_) => outcome,
            Err(e) => {
                tracing::debug!(field = %self.field, error = %e, "Rejected flag value");
                outcome.finding(Finding::for_field(
                    self.field,
                    FindingKind::InvalidBooleanFlag,
                    format!("{} can only be 1 or 0", self.name),
                ))
            }
        }
    }
}

/// One value out of a fixed list. Values outside the list are kept and
/// simply render with nothing selected.
pub struct Choice {
    field: ConfigField,
    label: &'static str,
    title: &'static str,
    options: &'static [(&'static str, &'static str)],
}

impl FieldValidator for Choice {
    fn validate(&self, raw: &str) -> FieldOutcome {
        FieldOutcome::new(raw)
            .labelled(self.field, self.label, self.title)
            .token(self.field, "SELECT", select_options(self.options, Some(raw)))
    }
}

/// Comma-joined selection; the client-side multiselect reads the current
/// value from `[[<PREFIX>_CONTEXT]]`.
pub struct MultiChoice {
    field: ConfigField,
    label: &'static str,
    title: &'static str,
    options: &'static [(&'static str, &'static str)],
}

impl FieldValidator for MultiChoice {
    fn validate(&self, raw: &str) -> FieldOutcome {
        let value = if raw.is_empty() { NO_AUTHN_CONTEXT } else { raw };
        FieldOutcome::new(value)
            .labelled(self.field, self.label, self.title)
            .token(self.field, "SELECT", select_options(self.options, Some(value)))
            .token(self.field, "CONTEXT", escape_html(value))
    }
}

/// Accepted as-is.
pub struct FreeText {
    field: ConfigField,
    label: &'static str,
    title: &'static str,
}

impl FieldValidator for FreeText {
    fn validate(&self, raw: &str) -> FieldOutcome {
        FieldOutcome::new(raw)
            .labelled(self.field, self.label, self.title)
            .token(self.field, "VALUE", escape_html(raw))
    }
}

/// PEM certificate, inspected for markers and validity.
pub struct Certificate {
    field: ConfigField,
    /// Which party the certificate belongs to, e.g. `SP`.
    owner: &'static str,
    label: &'static str,
    title: &'static str,
}

impl FieldValidator for Certificate {
    fn validate(&self, raw: &str) -> FieldOutcome {
        let parsed = parse_certificate(raw);

        let summary = match (&parsed.details, parsed.days_remaining) {
            (Some(details), Some(days)) => format!(
                "Configured {} certificate was issued by: {} for: {} and has {:+} days left",
                self.owner,
                details.issuer_common_name.as_deref().unwrap_or_default(),
                details.common_name.as_deref().unwrap_or_default(),
                days
            ),
            _ => NO_CERTIFICATE_DETAILS.to_string(),
        };

        let mut outcome = FieldOutcome::new(raw)
            .labelled(self.field, self.label, self.title)
            .token(self.field, "VALUE", escape_html(raw))
            .token(self.field, "VALID", escape_html(&summary));

        let problems = parsed.marker_problems();
        if !problems.is_empty() {
            outcome = outcome.finding(Finding::for_field(
                self.field,
                FindingKind::CertificateMarkerMissing,
                problems.join("\n"),
            ));
        } else if parsed.details.is_none() {
            tracing::debug!(
                field = %self.field,
                logic = ?parsed.cert_logic_valid,
                "Certificate details unavailable"
            );
        }

        outcome
    }
}

/// PEM private key. Only the markers are checked; the key is never decoded.
pub struct PrivateKey {
    field: ConfigField,
    label: &'static str,
    title: &'static str,
}

impl FieldValidator for PrivateKey {
    fn validate(&self, raw: &str) -> FieldOutcome {
        let value = raw.replace(r"\r\n", "");
        let has_markers =
            value.contains("-BEGIN PRIVATE KEY-") && value.contains("-END PRIVATE KEY-");

        let outcome = FieldOutcome::new(value.clone())
            .labelled(self.field, self.label, self.title)
            .token(self.field, "VALUE", escape_html(&value));

        if has_markers {
            outcome
        } else {
            outcome.finding(Finding::for_field(
                self.field,
                FindingKind::KeyMarkerMissing,
                INVALID_PRIVATE_KEY,
            ))
        }
    }
}

/// Record identifier, echoed into the hidden form input.
pub struct Identity;

impl FieldValidator for Identity {
    fn validate(&self, raw: &str) -> FieldOutcome {
        FieldOutcome::new(raw).token_exact("[[ID]]", escape_html(raw))
    }
}

/// Stored plugin version. The banner comes from the release feed check.
pub struct ReleaseVersion;

impl FieldValidator for ReleaseVersion {
    fn validate(&self, raw: &str) -> FieldOutcome {
        FieldOutcome::new(raw)
    }
}

static ENFORCED: BooleanFlag = BooleanFlag {
    field: ConfigField::Enforced,
    name: "Enforced",
    label: "Plugin Enforced",
    title: "Toggle 'yes' to enforce Single Sign On for all login sessions",
};

static STRICT: BooleanFlag = BooleanFlag {
    field: ConfigField::Strict,
    name: "Strict",
    label: "Strict",
    title: "If 'strict' is True, then unsigned or unencrypted messages are rejected",
};

static DEBUG: BooleanFlag = BooleanFlag {
    field: ConfigField::Debug,
    name: "Debug",
    label: "Debug",
    title: "Toggle yes to print errors",
};

static JIT: BooleanFlag = BooleanFlag {
    field: ConfigField::Jit,
    name: "Jit",
    label: "Just In Time (JIT) Provisioning",
    title: "Toggle 'yes' to create new users if they do not already exist. Toggle 'no' will cause an error if the user does not already exist.",
};

static ENCRYPT_NAMEID: BooleanFlag = BooleanFlag {
    field: ConfigField::NameIdEncrypted,
    name: "Encrypt NameID",
    label: "Encrypt NameID",
    title: "Toggle yes to encrypt NameID. Requires service provider certificate and key",
};

static SIGN_AUTHN_REQUESTS: BooleanFlag = BooleanFlag {
    field: ConfigField::AuthnRequestsSigned,
    name: "Sign Authn Requests",
    label: "Sign Authn Requests",
    title: "Toggle yes to sign Authn Requests. Requires service provider certificate and key",
};

static SIGN_LOGOUT_REQUESTS: BooleanFlag = BooleanFlag {
    field: ConfigField::LogoutRequestSigned,
    name: "Sign Logout Requests",
    label: "Sign Logout Requests",
    title: "Toggle yes to sign Logout Requests. Requires service provider certificate and key",
};

static SIGN_LOGOUT_RESPONSES: BooleanFlag = BooleanFlag {
    field: ConfigField::LogoutResponseSigned,
    name: "Sign Logout Responses",
    label: "Sign Logout Responses",
    title: "Toggle yes to sign Logout Responses. Requires service provider certificate and key",
};

static SP_CERTIFICATE: Certificate = Certificate {
    field: ConfigField::SpCertificate,
    owner: "SP",
    label: "Service Provider Certificate",
    title: "Certificate we should use when communicating with the Identity Provider. Use one long string without returns!",
};

static SP_CERTIFICATE_KEY: PrivateKey = PrivateKey {
    field: ConfigField::SpCertificateKey,
    label: "Service Provider Certificate Key",
    title: "Certificate private key we should use when communicating with the Identity Provider",
};

static SP_NAMEID_FORMAT: Choice = Choice {
    field: ConfigField::SpNameIdFormat,
    label: "Name ID Format",
    title: "The name id format that is sent to the IdP.",
    options: NAMEID_FORMATS,
};

static IDP_ENTITY_ID: FreeText = FreeText {
    field: ConfigField::IdpEntityId,
    label: "Identity Provider Entity ID",
    title: "Identifier of the IdP entity (must be a URI).",
};

static IDP_SSO_URL: FreeText = FreeText {
    field: ConfigField::IdpSsoUrl,
    label: "Identity Provider Single Sign On Service URL",
    title: "URL Target of the Identity Provider where we will send the Authentication Request Message.",
};

static IDP_SLO_URL: FreeText = FreeText {
    field: ConfigField::IdpSloUrl,
    label: "Identity Provider Single Logout Service URL",
    title: "URL Location of the Identity Provider where we will send the Single Logout Request.",
};

static IDP_CERTIFICATE: Certificate = Certificate {
    field: ConfigField::IdpCertificate,
    owner: "IdP",
    label: "Identity Provider Public X509 Certificate",
    title: "Public x509 certificate of the Identity Provider.",
};

static AUTHN_CONTEXT: MultiChoice = MultiChoice {
    field: ConfigField::RequestedAuthnContext,
    label: "Requested Authn Context",
    title: "Set to None and no AuthContext will be sent in the AuthnRequest, otherwise select one or more contexts",
    options: AUTHN_CONTEXTS,
};

static AUTHN_COMPARISON: Choice = Choice {
    field: ConfigField::RequestedAuthnContextComparison,
    label: "Requested Authn Comparison",
    title: "How should the requested Authn Context be compared? The value defaults to 'Exact'.",
    options: AUTHN_COMPARISONS,
};

impl ConfigField {
    /// The validator responsible for this field.
    pub fn validator(self) -> &'static dyn FieldValidator {
        match self {
            ConfigField::Id => &Identity,
            ConfigField::Enforced => &ENFORCED,
            ConfigField::Strict => &STRICT,
            ConfigField::Debug => &DEBUG,
            ConfigField::Jit => &JIT,
            ConfigField::SpCertificate => &SP_CERTIFICATE,
            ConfigField::SpCertificateKey => &SP_CERTIFICATE_KEY,
            ConfigField::SpNameIdFormat => &SP_NAMEID_FORMAT,
            ConfigField::IdpEntityId => &IDP_ENTITY_ID,
            ConfigField::IdpSsoUrl => &IDP_SSO_URL,
            ConfigField::IdpSloUrl => &IDP_SLO_URL,
            ConfigField::IdpCertificate => &IDP_CERTIFICATE,
            ConfigField::RequestedAuthnContext => &AUTHN_CONTEXT,
            ConfigField::RequestedAuthnContextComparison => &AUTHN_COMPARISON,
            ConfigField::NameIdEncrypted => &ENCRYPT_NAMEID,
            ConfigField::AuthnRequestsSigned => &SIGN_AUTHN_REQUESTS,
            ConfigField::LogoutRequestSigned => &SIGN_LOGOUT_REQUESTS,
            ConfigField::LogoutResponseSigned => &SIGN_LOGOUT_RESPONSES,
            ConfigField::Version => &ReleaseVersion,
        }
    }

    /// Validate a raw value for this field.
    pub fn validate(self, raw: &str) -> FieldOutcome {
        self.validator().validate(raw)
    }
}
