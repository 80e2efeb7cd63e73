//! Package manifest generation.
//!
//! Renders the fixed-schema `AppxManifest.xml`: identity block, display
//! metadata, one platform-dependency bound, one application entry point,
//! and a single elevated-trust capability declaration.
//!
//! The entry-point path referenced here must exactly match the path the
//! payload was staged to, or the packager produces an artifact that fails
//! to install. The orchestrator enforces this by sequencing: payload
//! fallback resolution always completes before manifest generation, and
//! [`build_manifest`] takes the *actual* resolved executable name.

use crate::pipeline::config::BuildConfiguration;
use crate::pipeline::error::{Error, Result};
use crate::pipeline::templates::escape::xml_escape;
use handlebars::Handlebars;
use serde_json::{Map, json};

/// Fixed package version for test packages.
const PACKAGE_VERSION: &str = "1.0.0.0";

/// Platform-dependency bounds.
const MIN_PLATFORM_VERSION: &str = "10.0.17763.0";
const MAX_PLATFORM_VERSION: &str = "10.0.22621.0";

const MANIFEST_TEMPLATE: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<Package xmlns="http://schemas.microsoft.com/appx/manifest/foundation/windows10"
         xmlns:uap="http://schemas.microsoft.com/appx/manifest/uap/windows10"
         xmlns:rescap="http://schemas.microsoft.com/appx/manifest/foundation/windows10/restrictedcapabilities">
  <Identity Name="{{identity_name}}"
            Publisher="{{publisher_dn}}"
            Version="{{version}}"
            ProcessorArchitecture="x64" />
  <Properties>
    <DisplayName>{{display_name}}</DisplayName>
    <PublisherDisplayName>{{publisher_display}}</PublisherDisplayName>
    <Logo>Assets\StoreLogo.png</Logo>
    <Description>Instrumented test package generated for detection research.</Description>
  </Properties>
  <Dependencies>
    <TargetDeviceFamily Name="Windows.Desktop"
                        MinVersion="{{min_version}}"
                        MaxVersionTested="{{max_version}}" />
  </Dependencies>
  <Resources>
    <Resource Language="en-us" />
  </Resources>
  <Applications>
    <Application Id="{{application_id}}"
                 Executable="{{executable}}"
                 EntryPoint="Windows.FullTrustApplication">
      <uap:VisualElements DisplayName="{{display_name}}"
                          Description="Instrumented test application."
                          BackgroundColor="transparent"
                          Square150x150Logo="Assets\Square150x150Logo.png"
                          Square44x44Logo="Assets\Square44x44Logo.png">
        <uap:DefaultTile Wide310x150Logo="Assets\Wide310x150Logo.png" />
      </uap:VisualElements>
    </Application>
  </Applications>
  <Capabilities>
    <rescap:Capability Name="runFullTrust" />
  </Capabilities>
</Package>
"#;

/// Renders the package manifest document.
///
/// `executable_rel_path` is the package-relative path of the staged entry
/// executable (post-fallback), e.g.
/// `VFS\ProgramFilesX64\RedTeamTest\RedTeamTestLauncher.exe`.
pub fn build_manifest(config: &BuildConfiguration, executable_rel_path: &str) -> Result<String> {
    let mut handlebars = Handlebars::new();
    handlebars.register_escape_fn(handlebars::no_escape);

    let mut data = Map::new();
    data.insert(
        "identity_name".into(),
        json!(xml_escape(&config.identity_token())),
    );
    data.insert(
        "publisher_dn".into(),
        json!(xml_escape(&config.publisher_dn())),
    );
    data.insert("version".into(), json!(PACKAGE_VERSION));
    data.insert(
        "display_name".into(),
        json!(xml_escape(config.package_name())),
    );
    data.insert(
        "publisher_display".into(),
        json!(xml_escape(config.publisher())),
    );
    data.insert("min_version".into(), json!(MIN_PLATFORM_VERSION));
    data.insert("max_version".into(), json!(MAX_PLATFORM_VERSION));
    data.insert(
        "application_id".into(),
        json!(xml_escape(&config.identity_token())),
    );
    data.insert("executable".into(), json!(xml_escape(executable_rel_path)));

    handlebars
        .register_template_string("manifest", MANIFEST_TEMPLATE)
        .map_err(|e| {
            Error::TemplateRenderFailed(format!("failed to register manifest template: {}", e))
        })?;

    handlebars
        .render("manifest", &data)
        .map_err(|e| Error::TemplateRenderFailed(format!("failed to render manifest: {}", e)))
}

/// Extracts the application `Executable` attribute from a rendered manifest.
///
/// Used to verify the entry-point/staged-path invariant.
pub fn entry_point_of(manifest: &str) -> Option<String> {
    let start = manifest.find("Executable=\"")? + "Executable=\"".len();
    let rest = &manifest[start..];
    let end = rest.find('"')?;
    Some(rest[..end].to_string())
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
    fn entry_point_matches_supplied_path() {
        let rel = r"VFS\ProgramFilesX64\RedTeamTest\RedTeamTestLauncher.exe";
        let manifest = build_manifest(&config(), rel).unwrap();
        assert_eq!(entry_point_of(&manifest).unwrap(), rel);
    }

    #[test]
    fn identity_block_uses_token_and_dn() {
        let manifest = build_manifest(&config(), r"VFS\x\y.exe").unwrap();
        assert!(manifest.contains(r#"Name="RedTeamTest""#));
        assert!(manifest.contains(r#"Publisher="CN=SecurityResearch""#));
        assert!(manifest.contains(r#"Version="1.0.0.0""#));
    }

    #[test]
    fn fixed_schema_blocks_are_present() {
        let manifest = build_manifest(&config(), r"VFS\x\y.exe").unwrap();
        assert!(manifest.contains("TargetDeviceFamily"));
        assert!(manifest.contains(r#"MinVersion="10.0.17763.0""#));
        assert!(manifest.contains(r#"Name="runFullTrust""#));
        for logo in [
            "StoreLogo.png",
            "Square150x150Logo.png",
            "Square44x44Logo.png",
            "Wide310x150Logo.png",
        ] {
            assert!(manifest.contains(logo), "missing {}", logo);
        }
    }

    #[test]
    fn rendering_is_deterministic() {
        let a = build_manifest(&config(), r"VFS\a\b.exe").unwrap();
        let b = build_manifest(&config(), r"VFS\a\b.exe").unwrap();
        assert_eq!(a, b);
    }
}
