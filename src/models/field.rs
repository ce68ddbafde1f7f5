use serde::{Deserialize, Serialize};

/// A configuration item known to the configuration screen.
///
/// Each variant corresponds to one stored column of the SSO configuration
/// record and one submitted form field with the same name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigField {
    Id,
    Enforced,
    Strict,
    Debug,
    Jit,
    #[serde(rename = "saml_sp_certificate")]
    SpCertificate,
    #[serde(rename = "saml_sp_certificate_key")]
    SpCertificateKey,
    #[serde(rename = "saml_sp_nameid_format")]
    SpNameIdFormat,
    #[serde(rename = "saml_idp_entity_id")]
    IdpEntityId,
    #[serde(rename = "saml_idp_single_sign_on_service")]
    IdpSsoUrl,
    #[serde(rename = "saml_idp_single_logout_service")]
    IdpSloUrl,
    #[serde(rename = "saml_idp_certificate")]
    IdpCertificate,
    RequestedAuthnContext,
    RequestedAuthnContextComparison,
    #[serde(rename = "saml_security_nameidencrypted")]
    NameIdEncrypted,
    #[serde(rename = "saml_security_authnrequestssigned")]
    AuthnRequestsSigned,
    #[serde(rename = "saml_security_logoutrequestsigned")]
    LogoutRequestSigned,
    #[serde(rename = "saml_security_logoutresponsesigned")]
    LogoutResponseSigned,
    Version,
}

/// How a field's value is interpreted and rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// `0` or `1`, rendered as a Yes/No select.
    Flag,
    /// One value out of a fixed option list.
    Choice,
    /// Comma-joined subset of a fixed option list.
    MultiChoice,
    /// Free text (entity ids and service URLs).
    Text,
    /// PEM certificate.
    Certificate,
    /// PEM private key.
    PrivateKey,
    /// Numeric record identifier.
    Identity,
    /// Plugin version stored with the record.
    ReleaseVersion,
}

impl ConfigField {
    /// All fields in stored column order.
    pub const ALL: [ConfigField; 19] = [
        ConfigField::Id,
        ConfigField::Enforced,
        ConfigField::Strict,
        ConfigField::Debug,
        ConfigField::Jit,
        ConfigField::SpCertificate,
        ConfigField::SpCertificateKey,
        ConfigField::SpNameIdFormat,
        ConfigField::IdpEntityId,
        ConfigField::IdpSsoUrl,
        ConfigField::IdpSloUrl,
        ConfigField::IdpCertificate,
        ConfigField::RequestedAuthnContext,
        ConfigField::RequestedAuthnContextComparison,
        ConfigField::NameIdEncrypted,
        ConfigField::AuthnRequestsSigned,
        ConfigField::LogoutRequestSigned,
        ConfigField::LogoutResponseSigned,
        ConfigField::Version,
    ];

    /// The column / form field name.
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigField::Id => "id",
            ConfigField::Enforced => "enforced",
            ConfigField::Strict => "strict",
            ConfigField::Debug => "debug",
            ConfigField::Jit => "jit",
            ConfigField::SpCertificate => "saml_sp_certificate",
            ConfigField::SpCertificateKey => "saml_sp_certificate_key",
            ConfigField::SpNameIdFormat => "saml_sp_nameid_format",
            ConfigField::IdpEntityId => "saml_idp_entity_id",
            ConfigField::IdpSsoUrl => "saml_idp_single_sign_on_service",
            ConfigField::IdpSloUrl => "saml_idp_single_logout_service",
            ConfigField::IdpCertificate => "saml_idp_certificate",
            ConfigField::RequestedAuthnContext => "requested_authn_context",
            ConfigField::RequestedAuthnContextComparison => "requested_authn_context_comparison",
            ConfigField::NameIdEncrypted => "saml_security_nameidencrypted",
            ConfigField::AuthnRequestsSigned => "saml_security_authnrequestssigned",
            ConfigField::LogoutRequestSigned => "saml_security_logoutrequestsigned",
            ConfigField::LogoutResponseSigned => "saml_security_logoutresponsesigned",
            ConfigField::Version => "version",
        }
    }

    /// Prefix of the template placeholders owned by this field,
    /// e.g. `SP_CERT` for `[[SP_CERT_VALUE]]`.
    pub fn token_prefix(&self) -> &'static str {
        match self {
            ConfigField::Id => "ID",
            ConfigField::Enforced => "ENFORCED",
            ConfigField::Strict => "STRICT",
            ConfigField::Debug => "DEBUG",
            ConfigField::Jit => "JIT",
            ConfigField::SpCertificate => "SP_CERT",
            ConfigField::SpCertificateKey => "SP_KEY",
            ConfigField::SpNameIdFormat => "SP_ID",
            ConfigField::IdpEntityId => "IP_ID",
            ConfigField::IdpSsoUrl => "IP_SSO_URL",
            ConfigField::IdpSloUrl => "IP_SLS_URL",
            ConfigField::IdpCertificate => "IP_CERT",
            ConfigField::RequestedAuthnContext => "AUTHN",
            ConfigField::RequestedAuthnContextComparison => "AUTHN_COMPARE",
            ConfigField::NameIdEncrypted => "ENCR_NAMEID",
            ConfigField::AuthnRequestsSigned => "SIGN_AUTHN_REQ",
            ConfigField::LogoutRequestSigned => "SIGN_LOGOUT_REQ",
            ConfigField::LogoutResponseSigned => "SIGN_LOGOUT_RES",
            ConfigField::Version => "VERSION",
        }
    }

    pub fn kind(&self) -> FieldKind {
        match self {
            ConfigField::Enforced
            | ConfigField::Strict
            | ConfigField::Debug
            | ConfigField::Jit
            | ConfigField::NameIdEncrypted
            | ConfigField::AuthnRequestsSigned
            | ConfigField::LogoutRequestSigned
            | ConfigField::LogoutResponseSigned => FieldKind::Flag,
            ConfigField::SpNameIdFormat | ConfigField::RequestedAuthnContextComparison => {
                FieldKind::Choice
            }
            ConfigField::RequestedAuthnContext => FieldKind::MultiChoice,
            ConfigField::IdpEntityId | ConfigField::IdpSsoUrl | ConfigField::IdpSloUrl => {
                FieldKind::Text
            }
            ConfigField::SpCertificate | ConfigField::IdpCertificate => FieldKind::Certificate,
            ConfigField::SpCertificateKey => FieldKind::PrivateKey,
            ConfigField::Id => FieldKind::Identity,
            ConfigField::Version => FieldKind::ReleaseVersion,
        }
    }

    /// Placeholder that carries this field's inline error message.
    pub fn error_token(&self) -> String {
        format!("[[{}_ERROR]]", self.token_prefix())
    }
}

impl std::fmt::Display for ConfigField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ConfigField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ConfigField::ALL
            .iter()
            .copied()
            .find(|field| field.as_str() == s)
            .ok_or_else(|| format!("Unknown configuration item: {}", s))
    }
}
