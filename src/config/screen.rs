use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::{
    models::{DEFAULT_CONFIG_ID, EXPECTED_ITEMS},
    services::DEFAULT_FEED_URL,
};

/// Configuration form settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScreenConfig {
    /// Configuration row edited by the screen.
    #[serde(default = "default_config_id")]
    pub config_id: i64,

    /// Number of entries a loaded row must have, counting the validity
    /// marker. Anything else disables the form.
    #[serde(default = "default_expected_items")]
    pub expected_items: usize,

    /// HTML template to render instead of the built-in one.
    #[serde(default)]
    pub template: Option<PathBuf>,

    /// Base path of the host application, used in form actions.
    #[serde(default)]
    pub root_doc: String,
}

impl Default for ScreenConfig {
    fn default() -> Self {
        Self {
            config_id: default_config_id(),
            expected_items: default_expected_items(),
            template: None,
            root_doc: String::new(),
        }
    }
}

impl ScreenConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.config_id < 1 {
            return Err(ConfigError::Validation(format!(
                "screen.config_id must be positive, got {}",
                self.config_id
            )));
        }
        if self.expected_items == 0 {
            return Err(ConfigError::Validation(
                "screen.expected_items cannot be 0".into(),
            ));
        }
        Ok(())
    }
}

fn default_config_id() -> i64 {
    DEFAULT_CONFIG_ID
}

fn default_expected_items() -> usize {
    EXPECTED_ITEMS
}

/// Release feed check shown on the configuration form.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VersionCheckConfig {
    /// Query the release feed when the form is shown.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Atom feed to query.
    #[serde(default = "default_feed_url")]
    pub feed_url: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for VersionCheckConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            feed_url: default_feed_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl VersionCheckConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.enabled {
            return Ok(());
        }
        let url = url::Url::parse(&self.feed_url).map_err(|e| {
            ConfigError::Validation(format!(
                "version_check.feed_url '{}' is not a valid URL: {e}",
                self.feed_url
            ))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::Validation(format!(
                "version_check.feed_url must use http or https, got '{}'",
                url.scheme()
            )));
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "version_check.timeout_secs cannot be 0".into(),
            ));
        }
        Ok(())
    }
}

fn default_true() -> bool {
    true
}

fn default_feed_url() -> String {
    DEFAULT_FEED_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    10
}
