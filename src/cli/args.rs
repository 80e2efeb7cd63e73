//! Command line argument parsing and validation.

use clap::Parser;
use std::path::PathBuf;

/// Build-and-sign pipeline for instrumented MSIX test packages
#[derive(Parser, Debug)]
#[command(
    name = "msixforge",
    version,
    about = "Builds signed, instrumented MSIX test packages",
    long_about = "Assembles a signed, installable application container package from a \
declarative configuration.

The pipeline resolves the external toolchain (compiler, packager, signer), renders \
the payload from fixed templates, generates the package manifest, provisions a \
throwaway signing identity, and invokes the external packaging and signing tools. \
Missing compilers degrade the payload to script-only; a missing packager is fatal; \
a missing signer produces an unsigned artifact.

Usage:
  msixforge --package-name RedTeamTest --publisher SecurityResearch --output ./out
  msixforge -n \"Red Team Test\" -p SecurityResearch -o ./out -k script --detection-artifacts

Exit code 0 = pipeline succeeded (possibly degraded/unsigned; see the report)."
)]
pub struct Args {
    /// Package name (printable identifier, up to 64 characters)
    #[arg(short = 'n', long, value_name = "NAME")]
    pub package_name: String,

    /// Publisher name; also keys the signing identity subject
    #[arg(short = 'p', long, value_name = "PUBLISHER")]
    pub publisher: String,

    /// Output root directory for the staging tree and final artifact
    ///
    /// Recreated from scratch on every run. Concurrent runs against the
    /// same output path are not supported; derive unique paths per run.
    #[arg(short = 'o', long, value_name = "PATH")]
    pub output: PathBuf,

    /// Payload kind: compiled, script, or compiled-and-script
    #[arg(short = 'k', long, value_name = "KIND", default_value = "compiled-and-script")]
    pub payload_kind: String,

    /// Include the local telemetry beacon in the payload
    #[arg(long)]
    pub telemetry: bool,

    /// Emit DetectionLog.json and DetectionRule.yar alongside the artifact
    #[arg(long)]
    pub detection_artifacts: bool,

    /// Never download missing toolchain components
    #[arg(long)]
    pub skip_downloads: bool,
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate arguments for consistency
    pub fn validate(&self) -> Result<(), String> {
        if self.package_name.is_empty() {
            return Err("Package name cannot be empty".to_string());
        }
        if self.publisher.is_empty() {
            return Err("Publisher cannot be empty".to_string());
        }

        let valid_kinds = ["compiled", "script", "compiled-and-script"];
        if !valid_kinds.contains(&self.payload_kind.as_str()) {
            return Err(format!(
                "Invalid payload kind: {}. Valid kinds: {}",
                self.payload_kind,
                valid_kinds.join(", ")
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(kind: &str) -> Args {
        Args {
            package_name: "RedTeamTest".into(),
            publisher: "SecurityResearch".into(),
            output: "/tmp/out".into(),
            payload_kind: kind.into(),
            telemetry: false,
            detection_artifacts: false,
            skip_downloads: false,
        }
    }

    #[test]
    fn accepts_known_payload_kinds() {
        for kind in ["compiled", "script", "compiled-and-script"] {
            assert!(args(kind).validate().is_ok(), "{}", kind);
        }
    }

    #[test]
    fn rejects_unknown_payload_kind() {
        assert!(args("msi").validate().is_err());
    }

    #[test]
    fn rejects_empty_identifiers() {
        let mut a = args("script");
        a.package_name.clear();
        assert!(a.validate().is_err());
    }
}
