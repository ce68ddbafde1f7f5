use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::ConfigField;

/// Name of the synthetic entry added to a loaded record to flag whether the
/// load succeeded. It has no handler and is never persisted.
pub const VALIDITY_MARKER: &str = "valid";

/// Number of entries a loaded record is expected to carry: every stored
/// column plus the validity marker.
pub const EXPECTED_ITEMS: usize = ConfigField::ALL.len() + 1;

/// Identifier of the configuration row used when none is supplied.
pub const DEFAULT_CONFIG_ID: i64 = 1;

/// An ordered field-name → raw value mapping.
///
/// Used both for records loaded from the store and for submitted form
/// values. Values are kept exactly as received; interpretation happens in
/// the field validators.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfigurationRecord {
    values: IndexMap<String, String>,
}

impl ConfigurationRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a loaded record: the validity marker comes first, followed by the
    /// stored columns in the order they are inserted.
    pub fn with_validity_marker(valid: bool) -> Self {
        let mut record = Self::new();
        record.insert(VALIDITY_MARKER, if valid { "1" } else { "0" });
        record
    }

    /// The default configuration written when a store is initialized.
    pub fn defaults(id: i64) -> Self {
        ConfigField::ALL
            .into_iter()
            .map(|field| {
                let value = match field {
                    ConfigField::Id => id.to_string(),
                    ConfigField::SpNameIdFormat => "unspecified".to_string(),
                    ConfigField::RequestedAuthnContext => "none".to_string(),
                    ConfigField::RequestedAuthnContextComparison => "exact".to_string(),
                    ConfigField::Version => env!("CARGO_PKG_VERSION").to_string(),
                    ConfigField::IdpEntityId
                    | ConfigField::IdpSsoUrl
                    | ConfigField::IdpSloUrl
                    | ConfigField::SpCertificate
                    | ConfigField::SpCertificateKey
                    | ConfigField::IdpCertificate => String::new(),
                    _ => "0".to_string(),
                };
                (field.as_str().to_string(), value)
            })
            .collect()
    }

    /// Insert or replace a value. Replacing keeps the original position.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn field(&self, field: ConfigField) -> Option<&str> {
        self.get(field.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Decode an `application/x-www-form-urlencoded` submission body.
    ///
    /// Repeated names keep the last value, in the position of the first.
    pub fn from_form_urlencoded(body: &str) -> Self {
        url::form_urlencoded::parse(body.trim().as_bytes())
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect()
    }

    /// A copy without the validity marker, suitable for persistence.
    pub fn without_marker(&self) -> Self {
        self.values
            .iter()
            .filter(|(name, _)| name.as_str() != VALIDITY_MARKER)
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ConfigurationRecord {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}
