//! Pattern-matching rule rendering.
//!
//! Renders a fixed-template YARA rule for the built artifact: container
//! magic bytes at offset 0, presence of the manifest file name, and the
//! package name or publisher string.

use crate::pipeline::config::BuildConfiguration;
use crate::pipeline::error::{Error, Result};
use crate::pipeline::templates::escape::yara_escape;
use handlebars::Handlebars;
use serde_json::{Map, json};

const RULE_TEMPLATE: &str = r#"rule {{rule_name}}
{
    meta:
        description = "Detects the {{package_name}} instrumented test package"
        author = "msixforge"
        date = "{{date}}"
        reference = "https://github.com/msixforge/msixforge"

    strings:
        $manifest = "AppxManifest.xml"
        $name = "{{package_name}}"
        $publisher = "{{publisher}}"

    condition:
        uint16(0) == 0x4B50 and $manifest and ($name or $publisher)
}
"#;

/// Renders the detection rule text for the given build.
///
/// `date` is supplied by the caller so rendering stays a pure function of
/// its inputs.
pub fn render_rule(config: &BuildConfiguration, date: &str) -> Result<String> {
    let mut handlebars = Handlebars::new();
    handlebars.register_escape_fn(handlebars::no_escape);

    let mut data = Map::new();
    data.insert("rule_name".into(), json!(rule_name(config)));
    data.insert(
        "package_name".into(),
        json!(yara_escape(config.package_name())),
    );
    data.insert("publisher".into(), json!(yara_escape(config.publisher())));
    data.insert("date".into(), json!(date));

    handlebars
        .register_template_string("detection_rule", RULE_TEMPLATE)
        .map_err(|e| {
            Error::TemplateRenderFailed(format!("failed to register rule template: {}", e))
        })?;

    handlebars
        .render("detection_rule", &data)
        .map_err(|e| Error::TemplateRenderFailed(format!("failed to render rule: {}", e)))
}

/// YARA identifier for the rule: letters, digits, underscores only.
fn rule_name(config: &BuildConfiguration) -> String {
    let token: String = config
        .identity_token()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    format!("MSIX_TestPackage_{}", token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::config::ConfigBuilder;

    fn config() -> BuildConfiguration {
        ConfigBuilder::new()
            .package_name("Red Team Test")
            .publisher("SecurityResearch")
            .output_root("/tmp/out")
            .build()
            .unwrap()
    }

    #[test]
    fn rule_carries_all_four_conditions() {
        let rule = render_rule(&config(), "2026-08-26").unwrap();
        assert!(rule.contains("uint16(0) == 0x4B50"));
        assert!(rule.contains(r#"$manifest = "AppxManifest.xml""#));
        assert!(rule.contains(r#"$name = "Red Team Test""#));
        assert!(rule.contains(r#"$publisher = "SecurityResearch""#));
        assert!(rule.contains("$manifest and ($name or $publisher)"));
    }

    #[test]
    fn rule_name_is_a_valid_identifier() {
        let rule = render_rule(&config(), "2026-08-26").unwrap();
        assert!(rule.starts_with("rule MSIX_TestPackage_RedTeamTest"));
    }

    #[test]
    fn dotted_names_are_sanitized_in_identifier() {
        let cfg = ConfigBuilder::new()
            .package_name("pkg-2.1")
            .publisher("P")
            .output_root("/tmp/out")
            .build()
            .unwrap();
        assert_eq!(rule_name(&cfg), "MSIX_TestPackage_pkg_2_1");
    }
}
