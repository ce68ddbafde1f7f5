//! Presentation helpers for the configuration form.
//!
//! The validation core produces a [`RenderMap`] of `[[TOKEN]]` placeholders
//! to substitution strings. [`FormTemplate`] consumes it together with the
//! "disable all controls" flag and produces the final HTML.

mod template;

use std::collections::BTreeMap;

use serde::Serialize;

pub use template::FormTemplate;

/// Placeholder token (including the surrounding `[[` `]]`) to substitution.
pub type RenderMap = BTreeMap<String, String>;

/// Everything the presentation layer needs for one form render.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RenderOutput {
    pub map: RenderMap,
    /// Render every input with the `DISABLED` attribute.
    pub disable_controls: bool,
}

impl RenderOutput {
    pub fn get(&self, token: &str) -> Option<&str> {
        self.map.get(token).map(String::as_str)
    }
}

/// Build a `[[PREFIX_SUFFIX]]` placeholder.
pub fn token(prefix: &str, suffix: &str) -> String {
    format!("[[{prefix}_{suffix}]]")
}

/// Render `<option>` elements, marking the one equal to `current` as selected.
pub fn select_options(options: &[(&str, &str)], current: Option<&str>) -> String {
    options
        .iter()
        .map(|(value, label)| {
            let selected = if current == Some(*value) { " selected" } else { "" };
            format!("<option value='{value}'{selected}>{label}</option>")
        })
        .collect()
}

/// Escape a value for use inside HTML text or a quoted attribute.
pub fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Labels that appear on every render regardless of field content.
pub fn general_tokens(root_doc: &str) -> RenderMap {
    [
        ("[[AVAILABLE]]", "Available"),
        ("[[SELECTED]]", "Selected"),
        ("[[ROOT_DOC]]", root_doc),
        ("[[TITLE]]", "SAML SSO Configuration"),
        ("[[HEADER_GENERAL]]", "General"),
        ("[[HEADER_PROVIDER]]", "Service Provider Configuration"),
        ("[[HEADER_PROVIDER_CONFIG]]", "Identity Provider Configuration"),
        ("[[HEADER_SECURITY]]", "Security"),
        ("[[SUBMIT]]", "Update"),
        ("[[CLOSE_FORM]]", "</form>"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}
