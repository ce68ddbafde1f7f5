//! Release feed client.
//!
//! Fetches the project's Atom release feed and compares the newest entry
//! against a given version. The feed is only consulted when the
//! configuration form is shown; failures are reported to the administrator
//! as a notice and never block anything.

use std::{sync::LazyLock, time::Duration};

use regex::Regex;
use reqwest::Client;
use serde::Serialize;

use crate::{
    models::{Finding, FindingKind},
    render::escape_html,
};

/// Feed consulted when none is configured explicitly.
pub const DEFAULT_FEED_URL: &str = "https://github.com/derricksmith/phpsaml/releases.atom";

/// The version is whatever follows the last space of the entry title,
/// e.g. `Release 1.3.0`.
static TITLE_VERSION: LazyLock<Regex> = LazyLock::new(|| Regex::new(r".* (.+)").unwrap());

const ATOM_NS: &str = "http://www.w3.org/2005/Atom";

#[derive(Debug, thiserror::Error)]
pub enum VersionCheckError {
    #[error("Could not retrieve version information from: {url}")]
    Unreachable {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Could not correctly parse version information from: {url} ({reason})")]
    Unparseable { url: String, reason: String },
}

impl VersionCheckError {
    /// The notice shown on the configuration form.
    pub fn to_finding(&self) -> Finding {
        let kind = match self {
            VersionCheckError::Unreachable { .. } => FindingKind::FeedUnreachable,
            VersionCheckError::Unparseable { .. } => FindingKind::FeedUnparseable,
        };
        Finding::global(kind, self.to_string())
    }
}

/// Result of a feed check, as handed to the reconciler.
pub type VersionOutcome = Result<VersionStatus, VersionCheckError>;

/// Newest release found in the feed compared to a given version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionStatus {
    pub remote_version: String,
    pub running_version: String,
    pub release_url: String,
    /// Set when the feed announces a different version than the one running.
    ///
    /// Versions are compared as plain strings, so a running version newer
    /// than the feed also reports an update.
    pub latest: bool,
}

impl VersionStatus {
    /// HTML banner for the `[[VERSION]]` placeholder.
    pub fn banner(&self) -> String {
        let href = escape_html(&self.release_url);
        let remote = escape_html(&self.remote_version);
        let running = escape_html(&self.running_version);
        if self.latest {
            format!(
                "<a href='{href}' target='_blank'>A new version is available</a>. \
                 Version {remote} was found in the repository, you are running {running}"
            )
        } else {
            format!(
                "You are using version {remote} which is also the \
                 <a href='{href}' target='_blank'>latest version</a>"
            )
        }
    }
}

/// Extract `(version, href)` of the first entry of an Atom feed.
pub fn parse_feed(xml: &str) -> Result<(String, String), String> {
    let doc = roxmltree::Document::parse(xml).map_err(|e| e.to_string())?;
    let root = doc.root_element();
    if root.tag_name().name() != "feed" {
        return Err(format!("unexpected root element <{}>", root.tag_name().name()));
    }

    let entry = child(root, "entry").ok_or("feed has no entries")?;
    let title = child(entry, "title")
        .and_then(|t| t.text())
        .ok_or("entry has no title")?;
    let version = TITLE_VERSION
        .captures(title.trim())
        .map(|caps| caps[1].to_string())
        .ok_or_else(|| format!("no version in title {title:?}"))?;
    let href = child(entry, "link")
        .and_then(|link| link.attribute("href"))
        .unwrap_or_default()
        .to_string();

    Ok((version, href))
}

/// First child element with the given local name, in the Atom namespace or
/// without one.
fn child<'a, 'input>(
    node: roxmltree::Node<'a, 'input>,
    name: &str,
) -> Option<roxmltree::Node<'a, 'input>> {
    node.children().find(|n| {
        n.is_element()
            && n.tag_name().name() == name
            && matches!(n.tag_name().namespace(), None | Some(ATOM_NS))
    })
}

/// HTTP client for the release feed.
#[derive(Debug, Clone)]
pub struct VersionChecker {
    http_client: Client,
    feed_url: String,
}

impl VersionChecker {
    pub fn new(feed_url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http_client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("ssoconf/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http_client,
            feed_url: feed_url.into(),
        })
    }

    /// Compare the newest release in the feed against `running`.
    pub async fn check(&self, running: &str) -> VersionOutcome {
        let body = self.fetch().await.map_err(|source| {
            tracing::warn!(url = %self.feed_url, error = %source, "Release feed unreachable");
            VersionCheckError::Unreachable {
                url: self.feed_url.clone(),
                source,
            }
        })?;

        let (remote_version, release_url) = parse_feed(&body).map_err(|reason| {
            tracing::warn!(url = %self.feed_url, reason = %reason, "Release feed unparseable");
            VersionCheckError::Unparseable {
                url: self.feed_url.clone(),
                reason,
            }
        })?;

        let status = VersionStatus {
            latest: remote_version != running,
            remote_version,
            running_version: running.to_string(),
            release_url,
        };
        tracing::debug!(
            remote = %status.remote_version,
            running = %status.running_version,
            latest = status.latest,
            "Checked release feed"
        );
        Ok(status)
    }

    async fn fetch(&self) -> Result<String, reqwest::Error> {
        self.http_client
            .get(&self.feed_url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await
    }
}

#[cfg(test)]
mod tests {
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{method, path},
    };

    use super::*;
    use crate::models::Severity;

    fn feed(title: &str, href: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Release notes</title>
  <entry>
    <title>{title}</title>
    <link rel="alternate" type="text/html" href="{href}"/>
  </entry>
  <entry>
    <title>Release 0.9.0</title>
    <link rel="alternate" type="text/html" href="https://example.com/0.9.0"/>
  </entry>
</feed>"#
        )
    }

    async fn checker_for(body: String) -> (MockServer, VersionChecker) {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/releases.atom"))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(&server)
            .await;
        let checker = VersionChecker::new(
            format!("{}/releases.atom", server.uri()),
            Duration::from_secs(5),
        )
        .unwrap();
        (server, checker)
    }

    #[test]
    fn test_parse_feed_first_entry() {
        let (version, href) =
            parse_feed(&feed("Release 1.3.0", "https://example.com/1.3.0")).unwrap();
        assert_eq!(version, "1.3.0");
        assert_eq!(href, "https://example.com/1.3.0");
    }

    #[test]
    fn test_parse_feed_title_without_space() {
        assert!(parse_feed(&feed("1.3.0", "https://example.com")).is_err());
    }

    #[test]
    fn test_parse_feed_rejects_non_xml() {
        assert!(parse_feed("<html><body>oops").is_err());
        assert!(parse_feed("<rss></rss>").is_err());
    }

    #[test]
    fn test_banner() {
        let status = VersionStatus {
            remote_version: "1.3.0".into(),
            running_version: "1.2.9".into(),
            release_url: "https://example.com/1.3.0".into(),
            latest: true,
        };
        assert!(status.banner().contains("Version 1.3.0 was found in the repository, you are running 1.2.9"));

        let current = VersionStatus {
            latest: false,
            running_version: "1.3.0".into(),
            ..status
        };
        assert!(current.banner().starts_with("You are using version 1.3.0"));
    }

    #[tokio::test]
    async fn test_same_version_is_not_an_update() {
        let (_server, checker) = checker_for(feed("Release 1.3.0", "https://example.com/1.3.0")).await;
        let status = checker.check("1.3.0").await.unwrap();
        assert!(!status.latest);
        assert_eq!(status.remote_version, "1.3.0");
        assert_eq!(status.release_url, "https://example.com/1.3.0");
    }

    #[tokio::test]
    async fn test_different_version_is_an_update() {
        let (_server, checker) = checker_for(feed("Release 1.3.0", "https://example.com/1.3.0")).await;
        let status = checker.check("1.2.9").await.unwrap();
        assert!(status.latest);
        assert_eq!(status.running_version, "1.2.9");
    }

    #[tokio::test]
    async fn test_unparseable_feed() {
        let (_server, checker) = checker_for("not xml at all".to_string()).await;
        let err = checker.check("1.3.0").await.unwrap_err();
        assert!(matches!(err, VersionCheckError::Unparseable { .. }));
        let finding = err.to_finding();
        assert_eq!(finding.kind, FindingKind::FeedUnparseable);
        assert_eq!(finding.severity, Severity::Notice);
    }

    #[tokio::test]
    async fn test_server_error_is_unreachable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;
        let checker = VersionChecker::new(server.uri(), Duration::from_secs(5)).unwrap();

        let err = checker.check("1.3.0").await.unwrap_err();
        assert!(matches!(err, VersionCheckError::Unreachable { .. }));
        assert!(err.to_string().starts_with("Could not retrieve version information from: "));
        assert_eq!(err.to_finding().kind, FindingKind::FeedUnreachable);
    }
}
