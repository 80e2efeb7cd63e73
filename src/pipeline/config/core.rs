//! Core BuildConfiguration struct and derived-name accessors.

use super::PayloadKind;
use std::path::{Path, PathBuf};

/// Immutable input configuration for one pipeline run.
///
/// Owned by the caller and only read by the pipeline. Constructed via
/// [`super::ConfigBuilder`], which validates the package name and publisher
/// before this type can exist; every accessor below may therefore assume
/// printable, shell-safe identifiers.
#[derive(Clone, Debug)]
pub struct BuildConfiguration {
    /// Human-readable package name.
    package_name: String,

    /// Publisher display name. Also keys the signing identity subject.
    publisher: String,

    /// Output root; the staging tree and Output directory live under it.
    output_root: PathBuf,

    /// Requested payload kind. May be degraded by the orchestrator.
    payload_kind: PayloadKind,

    /// Whether payloads carry the local telemetry beacon.
    telemetry: bool,

    /// Whether to emit the detection record and pattern-matching rule.
    detection_artifacts: bool,

    /// Whether remediation downloads are disabled for this run.
    skip_downloads: bool,
}

impl BuildConfiguration {
    /// Returns the package name as supplied.
    pub fn package_name(&self) -> &str {
        &self.package_name
    }

    /// Returns the publisher display name.
    pub fn publisher(&self) -> &str {
        &self.publisher
    }

    /// Returns the output root directory.
    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    /// Returns the requested payload kind.
    pub fn payload_kind(&self) -> PayloadKind {
        self.payload_kind
    }

    /// Whether the rendered payloads include the telemetry beacon.
    pub fn telemetry(&self) -> bool {
        self.telemetry
    }

    /// Whether detection artifacts are emitted after a successful build.
    pub fn detection_artifacts(&self) -> bool {
        self.detection_artifacts
    }

    /// Whether remediation downloads are skipped.
    pub fn skip_downloads(&self) -> bool {
        self.skip_downloads
    }

    /// Identity token: the package name with whitespace stripped.
    ///
    /// Used as the manifest identity name, generated-source namespace, and
    /// payload file-name stem.
    pub fn identity_token(&self) -> String {
        self.package_name
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect()
    }

    /// Publisher distinguished-name string for the manifest identity block
    /// and the signing-certificate subject.
    pub fn publisher_dn(&self) -> String {
        format!("CN={}", self.publisher)
    }

    /// File name of the compiled payload executable.
    pub fn compiled_executable_name(&self) -> String {
        format!("{}.exe", self.identity_token())
    }

    /// File name of the script payload.
    pub fn script_name(&self) -> String {
        format!("{}.ps1", self.identity_token())
    }

    /// File name of the compiled script launcher.
    pub fn launcher_executable_name(&self) -> String {
        format!("{}Launcher.exe", self.identity_token())
    }

    /// File name of the batch launcher shim used when no compiler is available.
    pub fn launcher_shim_name(&self) -> String {
        format!("{}Launcher.cmd", self.identity_token())
    }

    /// Install-path directory name under the virtualized ProgramFiles tree.
    pub fn install_dir_name(&self) -> String {
        self.identity_token()
    }

    /// Target install path as seen after package installation.
    pub fn install_path(&self) -> String {
        format!("C:\\Program Files\\{}", self.identity_token())
    }

    pub(super) fn new(
        package_name: String,
        publisher: String,
        output_root: PathBuf,
        payload_kind: PayloadKind,
        telemetry: bool,
        detection_artifacts: bool,
        skip_downloads: bool,
    ) -> Self {
        Self {
            package_name,
            publisher,
            output_root,
            payload_kind,
            telemetry,
            detection_artifacts,
            skip_downloads,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::pipeline::config::{ConfigBuilder, PayloadKind};

    fn config() -> super::BuildConfiguration {
        ConfigBuilder::new()
            .package_name("Red Team Test")
            .publisher("SecurityResearch")
            .output_root("/tmp/forge-out")
            .payload_kind(PayloadKind::ScriptOnly)
            .build()
            .unwrap()
    }

    #[test]
    fn identity_token_strips_whitespace() {
        assert_eq!(config().identity_token(), "RedTeamTest");
    }

    #[test]
    fn derived_names_follow_token() {
        let cfg = config();
        assert_eq!(cfg.compiled_executable_name(), "RedTeamTest.exe");
        assert_eq!(cfg.script_name(), "RedTeamTest.ps1");
        assert_eq!(cfg.launcher_executable_name(), "RedTeamTestLauncher.exe");
        assert_eq!(cfg.launcher_shim_name(), "RedTeamTestLauncher.cmd");
        assert_eq!(cfg.publisher_dn(), "CN=SecurityResearch");
    }
}
