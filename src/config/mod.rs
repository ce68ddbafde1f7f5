//! Configuration for the SSO configuration screen.
//!
//! Configured via a TOML file, with support for environment variable
//! interpolation using `${VAR_NAME}` syntax. Every section is optional.
//!
//! # Example
//!
//! ```toml
//! [store]
//! type = "sqlite"
//! path = "${HELPDESK_DATA}/sso.db"
//!
//! [screen]
//! config_id = 1
//! root_doc = "/helpdesk"
//!
//! [version_check]
//! enabled = false
//!
//! [observability.logging]
//! level = "debug"
//! format = "json"
//! ```

mod observability;
mod screen;
mod store;

use std::path::Path;

pub use observability::*;
pub use screen::*;
use serde::{Deserialize, Serialize};
pub use store::*;

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Storage backend for configuration rows.
    #[serde(default)]
    pub store: StoreConfig,

    /// Form settings.
    #[serde(default)]
    pub screen: ScreenConfig,

    /// Release feed check.
    #[serde(default)]
    pub version_check: VersionCheckConfig,

    /// Logging.
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file.
    ///
    /// Environment variables in the format `${VAR_NAME}` are expanded.
    /// Missing required variables will cause an error.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::Io(e, path.as_ref().to_path_buf()))?;

        Self::from_str(&contents)
    }

    /// Parse configuration from a TOML string.
    pub fn from_str(contents: &str) -> Result<Self, ConfigError> {
        let expanded = expand_env_vars(contents)?;

        // Feature-gated values produce "unknown variant" errors from serde;
        // catch them first with a message naming the missing feature.
        let raw: toml::Value = toml::from_str(&expanded).map_err(ConfigError::Parse)?;
        check_disabled_features(&raw)?;

        let config: AppConfig = toml::from_str(&expanded).map_err(ConfigError::Parse)?;
        config.validate()?;

        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        self.store.validate()?;
        self.screen.validate()?;
        self.version_check.validate()?;
        Ok(())
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {1}: {0}")]
    Io(std::io::Error, std::path::PathBuf),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Environment variable not found: {0}")]
    EnvVarNotFound(String),

    #[error("Configuration validation error: {0}")]
    Validation(String),
}

/// Check for feature-gated configuration values before typed deserialization.
fn check_disabled_features(raw: &toml::Value) -> Result<(), ConfigError> {
    let mut issues: Vec<(String, &str)> = Vec::new();

    if let Some(type_val) = raw
        .get("store")
        .and_then(|v| v.get("type"))
        .and_then(|v| v.as_str())
    {
        check_store_feature(type_val, &mut issues);
    }

    if issues.is_empty() {
        return Ok(());
    }

    let details = issues
        .iter()
        .map(|(msg, _)| msg.as_str())
        .collect::<Vec<_>>()
        .join("\n  - ");
    let features = issues
        .iter()
        .map(|(_, feat)| *feat)
        .collect::<Vec<_>>()
        .join(",");

    Err(ConfigError::Validation(format!(
        "Configuration requires features not compiled in this build:\n  \
         - {details}\n\n\
         Rebuild with: cargo build --features {features}\n\
         Or use the 'full' profile: cargo build --features full"
    )))
}

fn check_store_feature(type_val: &str, _issues: &mut Vec<(String, &str)>) {
    match type_val {
        #[cfg(not(feature = "database-sqlite"))]
        "sqlite" => _issues.push((
            "store type 'sqlite' requires the 'database-sqlite' feature".into(),
            "database-sqlite",
        )),
        _ => {}
    }
}

/// Expand environment variables in the format `${VAR_NAME}`.
/// Skips commented lines (lines where content before the variable is a comment).
fn expand_env_vars(input: &str) -> Result<String, ConfigError> {
    let re = regex::Regex::new(r"\$\{([^}]+)\}").unwrap();
    let mut result = String::with_capacity(input.len());

    for line in input.lines() {
        let comment_pos = line.find('#');

        let mut line_result = String::with_capacity(line.len());
        let mut last_end = 0;

        for cap in re.captures_iter(line) {
            let whole = cap.get(0).unwrap();

            if let Some(pos) = comment_pos
                && whole.start() >= pos
            {
                continue;
            }

            line_result.push_str(&line[last_end..whole.start()]);

            let var_name = &cap[1];
            let value = std::env::var(var_name)
                .map_err(|_| ConfigError::EnvVarNotFound(var_name.to_string()))?;
            line_result.push_str(&value);

            last_end = whole.end();
        }

        line_result.push_str(&line[last_end..]);
        result.push_str(&line_result);
        result.push('\n');
    }

    // Remove trailing newline if input didn't have one
    if !input.ends_with('\n') && result.ends_with('\n') {
        result.pop();
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::models::EXPECTED_ITEMS;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = AppConfig::from_str("").unwrap();
        assert!(matches!(config.store, StoreConfig::Memory));
        assert_eq!(config.screen.config_id, 1);
        assert_eq!(config.screen.expected_items, EXPECTED_ITEMS);
        assert!(config.version_check.enabled);
        assert_eq!(config.observability.logging.format, LogFormat::Compact);
    }

    #[test]
    fn test_full_config() {
        let config = AppConfig::from_str(
            r#"
            [store]
            type = "memory"

            [screen]
            config_id = 3
            expected_items = 21
            template = "/etc/ssoconf/form.html"
            root_doc = "/helpdesk"

            [version_check]
            enabled = true
            feed_url = "https://example.com/releases.atom"
            timeout_secs = 3

            [observability.logging]
            level = "debug"
            format = "json"
            filter = "ssoconf=trace"
        "#,
        )
        .unwrap();

        assert_eq!(config.screen.config_id, 3);
        assert_eq!(config.screen.expected_items, 21);
        assert_eq!(config.screen.root_doc, "/helpdesk");
        assert_eq!(config.version_check.timeout_secs, 3);
        assert_eq!(config.observability.logging.level, LogLevel::Debug);
        assert_eq!(config.observability.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_unknown_key_rejected() {
        let err = AppConfig::from_str(
            r#"
            [screen]
            config_idd = 3
        "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_invalid_feed_url() {
        let err = AppConfig::from_str(
            r#"
            [version_check]
            feed_url = "ftp://example.com/feed"
        "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("http or https"), "{err}");
    }

    #[test]
    fn test_disabled_check_skips_url_validation() {
        let config = AppConfig::from_str(
            r#"
            [version_check]
            enabled = false
            feed_url = "not a url"
        "#,
        )
        .unwrap();
        assert!(!config.version_check.enabled);
    }

    #[test]
    fn test_non_positive_config_id() {
        let err = AppConfig::from_str("[screen]\nconfig_id = 0").unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[screen]\nroot_doc = \"/glpi\"").unwrap();
        let config = AppConfig::from_file(file.path()).unwrap();
        assert_eq!(config.screen.root_doc, "/glpi");
    }

    #[test]
    fn test_missing_file() {
        let err = AppConfig::from_file("/nonexistent/ssoconf.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_, _)));
    }

    #[test]
    fn test_env_var_expansion() {
        temp_env::with_var("TEST_ROOT_DOC", Some("/support"), || {
            let config = AppConfig::from_str("[screen]\nroot_doc = \"${TEST_ROOT_DOC}\"").unwrap();
            assert_eq!(config.screen.root_doc, "/support");
        });
    }

    #[test]
    fn test_missing_env_var() {
        temp_env::with_var_unset("TEST_SSOCONF_UNSET", || {
            let err = expand_env_vars("path = \"${TEST_SSOCONF_UNSET}\"").unwrap_err();
            assert!(matches!(err, ConfigError::EnvVarNotFound(ref v) if v == "TEST_SSOCONF_UNSET"));
        });
    }

    #[test]
    fn test_env_var_in_comment_ignored() {
        let result = expand_env_vars("# path = \"${NONEXISTENT_VAR}\"").unwrap();
        assert_eq!(result, "# path = \"${NONEXISTENT_VAR}\"");
    }

    #[test]
    fn test_env_var_after_comment_ignored() {
        let result = expand_env_vars("key = \"value\" # ${NONEXISTENT_VAR}").unwrap();
        assert_eq!(result, "key = \"value\" # ${NONEXISTENT_VAR}");
    }

    #[test]
    #[cfg(not(feature = "database-sqlite"))]
    fn test_disabled_store_sqlite_error() {
        let err = AppConfig::from_str(
            r#"
            [store]
            type = "sqlite"
            path = "sso.db"
        "#,
        )
        .unwrap_err();

        let msg = err.to_string();
        assert!(
            msg.contains("database-sqlite"),
            "should mention the required feature: {msg}"
        );
        assert!(
            msg.contains("cargo build --features"),
            "should include rebuild instructions: {msg}"
        );
    }

    #[test]
    #[cfg(feature = "database-sqlite")]
    fn test_sqlite_store_config() {
        let config = AppConfig::from_str(
            r#"
            [store]
            type = "sqlite"
            path = "sso.db"
        "#,
        )
        .unwrap();

        match config.store {
            StoreConfig::Sqlite(c) => {
                assert_eq!(c.path, "sso.db");
                assert!(c.create_if_missing);
            }
            other => panic!("unexpected store config: {other:?}"),
        }
    }

    #[test]
    #[cfg(feature = "database-sqlite")]
    fn test_sqlite_empty_path_rejected() {
        let err = AppConfig::from_str("[store]\ntype = \"sqlite\"\npath = \"\"").unwrap_err();
        assert!(err.to_string().contains("path cannot be empty"));
    }
}
