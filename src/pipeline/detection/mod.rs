//! Detection/audit artifact emission.
//!
//! Only invoked when the detection-artifact option is enabled. Purely
//! additive: emission never affects build success or failure.
//!
//! # Module Organization
//!
//! - [`record`] - the write-once [`DetectionRecord`] value object
//! - [`yara`] - pattern-matching rule rendering

pub mod record;
pub mod yara;

pub use record::DetectionRecord;

use crate::pipeline::config::{BuildConfiguration, PayloadKind};
use crate::pipeline::error::{ErrorExt, Result};
use crate::pipeline::identity::SigningIdentity;
use crate::pipeline::utils::checksum;
use chrono::Utc;
use std::path::{Path, PathBuf};

/// File name of the serialized detection record.
pub const LOG_FILE_NAME: &str = "DetectionLog.json";

/// File name of the rendered pattern-matching rule.
pub const RULE_FILE_NAME: &str = "DetectionRule.yar";

/// Computes the artifact hash, assembles the detection record, and writes
/// both artifacts into `output_dir`.
///
/// Returns `(json_path, rule_path)`.
pub async fn write_artifacts(
    config: &BuildConfiguration,
    identity: &SigningIdentity,
    effective_kind: PayloadKind,
    entry_executable: &str,
    artifact: &Path,
    output_dir: &Path,
) -> Result<(PathBuf, PathBuf)> {
    let sha256 = checksum::calculate_sha256(artifact).await?;
    let artifact_file = artifact
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let record = DetectionRecord::new(
        config,
        identity,
        effective_kind,
        entry_executable,
        &artifact_file,
        sha256,
    );

    let json_path = output_dir.join(LOG_FILE_NAME);
    let json = serde_json::to_string_pretty(&record)?;
    tokio::fs::write(&json_path, json)
        .await
        .fs_context("writing detection record", &json_path)?;

    let rule_path = output_dir.join(RULE_FILE_NAME);
    let rule = yara::render_rule(config, &Utc::now().format("%Y-%m-%d").to_string())?;
    tokio::fs::write(&rule_path, rule)
        .await
        .fs_context("writing detection rule", &rule_path)?;

    log::info!(
        "✓ Detection artifacts: {}, {}",
        json_path.display(),
        rule_path.display()
    );

    Ok((json_path, rule_path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::config::ConfigBuilder;

    #[tokio::test]
    async fn writes_record_and_rule() {
        let tmp = tempfile::tempdir().unwrap();
        let artifact = tmp.path().join("RedTeamTest.msix");
        tokio::fs::write(&artifact, b"PK\x03\x04fake").await.unwrap();

        let config = ConfigBuilder::new()
            .package_name("RedTeamTest")
            .publisher("SecurityResearch")
            .output_root(tmp.path())
            .payload_kind(PayloadKind::ScriptOnly)
            .telemetry(true)
            .detection_artifacts(true)
            .build()
            .unwrap();
        let identity = SigningIdentity {
            subject: "CN=SecurityResearch".into(),
            thumbprint: "A1B2C3D4E5F60718293A4B5C6D7E8F9012345678".into(),
            pfx_path: tmp.path().join("TestCert.pfx"),
            cer_path: tmp.path().join("TestCert.cer"),
        };

        let (json_path, rule_path) = write_artifacts(
            &config,
            &identity,
            PayloadKind::ScriptOnly,
            "RedTeamTestLauncher.exe",
            &artifact,
            tmp.path(),
        )
        .await
        .unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&tokio::fs::read_to_string(&json_path).await.unwrap()).unwrap();
        assert_eq!(value["payloadKind"], "PowerShell");
        assert_eq!(value["iocs"]["fileHashes"][0]["file"], "RedTeamTest.msix");
        assert_eq!(
            value["iocs"]["fileHashes"][0]["sha256"]
                .as_str()
                .unwrap()
                .len(),
            64
        );

        let rule = tokio::fs::read_to_string(&rule_path).await.unwrap();
        assert!(rule.contains("uint16(0) == 0x4B50"));
    }
}
