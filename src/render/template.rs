use std::{path::Path, sync::LazyLock};

use regex::{Captures, Regex};

use super::{RenderOutput, general_tokens};

/// Any `[[...]]` placeholder that does not span another placeholder.
static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[\[[^\[\]]*\]\]").unwrap());

const DISABLED_TOKEN: &str = "[[DISABLED]]";

const EMBEDDED_TEMPLATE: &str = include_str!("../../templates/config_form.html");

/// HTML form template with `[[TOKEN]]` placeholders.
#[derive(Debug, Clone)]
pub struct FormTemplate {
    source: String,
    root_doc: String,
}

impl FormTemplate {
    /// The template shipped with the crate.
    pub fn embedded() -> Self {
        Self::from_source(EMBEDDED_TEMPLATE)
    }

    pub fn from_source(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            root_doc: String::new(),
        }
    }

    pub fn from_file(path: impl AsRef<Path>) -> std::io::Result<Self> {
        Ok(Self::from_source(std::fs::read_to_string(path)?))
    }

    /// Base path of the host application, substituted for `[[ROOT_DOC]]`.
    pub fn with_root_doc(mut self, root_doc: impl Into<String>) -> Self {
        self.root_doc = root_doc.into();
        self
    }

    /// Substitute every placeholder in a single pass.
    ///
    /// Placeholders without a value are removed, so substituted values are
    /// never expanded a second time.
    pub fn render(&self, output: &RenderOutput) -> String {
        let mut map = general_tokens(&self.root_doc);
        map.extend(output.map.iter().map(|(k, v)| (k.clone(), v.clone())));

        PLACEHOLDER
            .replace_all(&self.source, |caps: &Captures<'_>| {
                let placeholder = &caps[0];
                if placeholder == DISABLED_TOKEN {
                    return if output.disable_controls {
                        "DISABLED".to_string()
                    } else {
                        String::new()
                    };
                }
                map.get(placeholder).cloned().unwrap_or_default()
            })
            .into_owned()
    }
}

impl Default for FormTemplate {
    fn default() -> Self {
        Self::embedded()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::RenderMap;

    fn output(pairs: &[(&str, &str)], disable_controls: bool) -> RenderOutput {
        RenderOutput {
            map: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<RenderMap>(),
            disable_controls,
        }
    }

    #[test]
    fn test_unresolved_placeholders_are_stripped() {
        let template = FormTemplate::from_source("<p>[[KNOWN]]|[[UNKNOWN]]</p>");
        let html = template.render(&output(&[("[[KNOWN]]", "value")], false));
        assert_eq!(html, "<p>value|</p>");
    }

    #[test]
    fn test_disabled_flag() {
        let template = FormTemplate::from_source("<input [[DISABLED]]>");
        assert_eq!(template.render(&output(&[], true)), "<input DISABLED>");
        assert_eq!(template.render(&output(&[], false)), "<input >");
    }

    #[test]
    fn test_values_are_not_expanded_twice() {
        let template = FormTemplate::from_source("[[A]]");
        let html = template.render(&output(&[("[[A]]", "[[B]]"), ("[[B]]", "oops")], false));
        assert_eq!(html, "[[B]]");
    }

    #[test]
    fn test_stripping_is_not_greedy() {
        let template = FormTemplate::from_source("[[X]] keep [[Y]]");
        assert_eq!(template.render(&output(&[], false)), " keep ");
    }

    #[test]
    fn test_general_tokens_and_root_doc() {
        let template = FormTemplate::from_source("[[TITLE]] at [[ROOT_DOC]]").with_root_doc("/app");
        assert_eq!(
            template.render(&output(&[], false)),
            "SAML SSO Configuration at /app"
        );
    }

    #[test]
    fn test_embedded_template_renders_without_placeholders() {
        let html = FormTemplate::embedded().render(&output(&[("[[ID]]", "1")], true));
        assert!(!html.contains("[["));
        assert!(html.contains("DISABLED"));
        assert!(html.contains("value='1'") || html.contains("value=\"1\""));
    }
}
