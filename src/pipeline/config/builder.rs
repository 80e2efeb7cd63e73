//! Builder and validation policy for BuildConfiguration.

use super::{BuildConfiguration, PayloadKind};
use crate::pipeline::error::{Context, Error, Result};
use path_absolutize::Absolutize;
use std::path::{Path, PathBuf};

/// Maximum accepted length for the package name and publisher.
const MAX_IDENTIFIER_LEN: usize = 64;

/// Builder for [`BuildConfiguration`].
///
/// Validation policy: the package name and publisher are interpolated into
/// generated source, the manifest, and the detection rule, so rather than
/// escaping arbitrary input at every render site the builder only admits
/// identifiers matching `[A-Za-z0-9][A-Za-z0-9 ._-]*` (at most 64 chars).
/// Escape functions at the render sites remain as a second layer.
#[derive(Default)]
pub struct ConfigBuilder {
    package_name: Option<String>,
    publisher: Option<String>,
    output_root: Option<PathBuf>,
    payload_kind: Option<PayloadKind>,
    telemetry: bool,
    detection_artifacts: bool,
    skip_downloads: bool,
}

impl ConfigBuilder {
    /// Creates a new configuration builder.
    pub fn new() -> Self {
        Default::default()
    }

    /// Sets the package name.
    ///
    /// # Required
    pub fn package_name<S: Into<String>>(mut self, name: S) -> Self {
        self.package_name = Some(name.into());
        self
    }

    /// Sets the publisher display name.
    ///
    /// # Required
    pub fn publisher<S: Into<String>>(mut self, publisher: S) -> Self {
        self.publisher = Some(publisher.into());
        self
    }

    /// Sets the output root directory.
    ///
    /// # Required
    pub fn output_root<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.output_root = Some(path.as_ref().to_path_buf());
        self
    }

    /// Sets the payload kind.
    ///
    /// Default: [`PayloadKind::CompiledAndScript`]
    pub fn payload_kind(mut self, kind: PayloadKind) -> Self {
        self.payload_kind = Some(kind);
        self
    }

    /// Enables the telemetry beacon in rendered payloads.
    pub fn telemetry(mut self, enabled: bool) -> Self {
        self.telemetry = enabled;
        self
    }

    /// Enables detection-artifact emission.
    pub fn detection_artifacts(mut self, enabled: bool) -> Self {
        self.detection_artifacts = enabled;
        self
    }

    /// Disables remediation downloads.
    pub fn skip_downloads(mut self, skip: bool) -> Self {
        self.skip_downloads = skip;
        self
    }

    /// Builds the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if a required field is missing or the package name
    /// or publisher fails identifier validation.
    pub fn build(self) -> Result<BuildConfiguration> {
        let package_name = self.package_name.context("package_name is required")?;
        let publisher = self.publisher.context("publisher is required")?;
        let output_root = self.output_root.context("output_root is required")?;

        validate_identifier("package name", &package_name)?;
        validate_identifier("publisher", &publisher)?;

        let output_root = output_root
            .absolutize()
            .map_err(|e| Error::GenericError(format!("invalid output path: {}", e)))?
            .to_path_buf();

        Ok(BuildConfiguration::new(
            package_name,
            publisher,
            output_root,
            self.payload_kind.unwrap_or(PayloadKind::CompiledAndScript),
            self.telemetry,
            self.detection_artifacts,
            self.skip_downloads,
        ))
    }
}

/// Validates a user-supplied identifier against the admission policy.
fn validate_identifier(field: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(Error::GenericError(format!("{} must not be empty", field)));
    }
    if value.len() > MAX_IDENTIFIER_LEN {
        return Err(Error::GenericError(format!(
            "{} exceeds {} characters",
            field, MAX_IDENTIFIER_LEN
        )));
    }

    let mut chars = value.chars();
    let first = chars.next().unwrap_or(' ');
    if !first.is_ascii_alphanumeric() {
        return Err(Error::GenericError(format!(
            "{} must start with an ASCII letter or digit: {:?}",
            field, value
        )));
    }
    if let Some(bad) = value
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, ' ' | '.' | '_' | '-')))
    {
        return Err(Error::GenericError(format!(
            "{} contains unsupported character {:?}: {:?}",
            field, bad, value
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> ConfigBuilder {
        ConfigBuilder::new()
            .package_name("RedTeamTest")
            .publisher("SecurityResearch")
            .output_root("/tmp/forge-out")
    }

    #[test]
    fn builds_with_defaults() {
        let cfg = base().build().unwrap();
        assert_eq!(cfg.payload_kind(), PayloadKind::CompiledAndScript);
        assert!(!cfg.telemetry());
        assert!(!cfg.detection_artifacts());
        assert!(!cfg.skip_downloads());
        assert!(cfg.output_root().is_absolute());
    }

    #[test]
    fn missing_required_fields_are_rejected() {
        assert!(ConfigBuilder::new().build().is_err());
        assert!(
            ConfigBuilder::new()
                .package_name("A")
                .publisher("B")
                .build()
                .is_err()
        );
    }

    #[test]
    fn rejects_empty_and_oversized_names() {
        assert!(base().package_name("").build().is_err());
        assert!(base().package_name("x".repeat(65)).build().is_err());
    }

    #[test]
    fn rejects_injection_prone_characters() {
        for bad in [
            "Evil\"Name",
            "a<script>",
            "name;rm -rf",
            "$(whoami)",
            "back\\slash",
            "quo'te",
            "{brace}",
        ] {
            assert!(base().package_name(bad).build().is_err(), "{}", bad);
            assert!(base().publisher(bad).build().is_err(), "{}", bad);
        }
    }

    #[test]
    fn accepts_printable_identifiers() {
        for ok in ["Red Team Test", "pkg-2.1_b", "A"] {
            assert!(base().package_name(ok).build().is_ok(), "{}", ok);
        }
    }

    #[test]
    fn rejects_leading_punctuation() {
        assert!(base().package_name("-lead").build().is_err());
        assert!(base().package_name(" lead").build().is_err());
    }
}
