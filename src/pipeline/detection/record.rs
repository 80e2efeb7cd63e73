//! Detection record value object.
//!
//! Write-once description of a completed build: configuration summary,
//! identity fingerprint, enumerated detection points, and artifact IOCs.
//! Serialized to `DetectionLog.json` for defenders.

use crate::pipeline::config::{BuildConfiguration, PayloadKind};
use crate::pipeline::identity::SigningIdentity;
use chrono::{SecondsFormat, Utc};
use serde::Serialize;

/// One file-hash IOC entry.
#[derive(Debug, Serialize)]
pub struct FileHash {
    /// File name of the artifact.
    pub file: String,
    /// Hex-encoded SHA-256 of the artifact contents.
    pub sha256: String,
}

/// Indicators of compromise for the built artifact.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Iocs {
    /// Artifact content hashes.
    pub file_hashes: Vec<FileHash>,
    /// Process names the payload creates when executed.
    pub process_names: Vec<String>,
}

/// Structured audit record describing a completed build.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionRecord {
    /// ISO-8601 build timestamp.
    pub timestamp: String,
    /// Package name as configured.
    pub package_name: String,
    /// Publisher display name.
    pub publisher: String,
    /// Target install path of the package payload.
    pub install_path: String,
    /// Thumbprint of the signing identity.
    pub certificate_fingerprint: String,
    /// Effective payload kind (post-degrade).
    pub payload_kind: PayloadKind,
    /// Fixed human-readable detection points for the payload behavior.
    pub detection_points: Vec<String>,
    /// Artifact indicators.
    pub iocs: Iocs,
}

impl DetectionRecord {
    /// Assembles the record for a completed build.
    ///
    /// `entry_executable` is the staged entry-point file name (post
    /// fallback); it is the one process name the payload runs as.
    pub fn new(
        config: &BuildConfiguration,
        identity: &SigningIdentity,
        effective_kind: PayloadKind,
        entry_executable: &str,
        artifact_file: &str,
        artifact_sha256: String,
    ) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            package_name: config.package_name().to_string(),
            publisher: config.publisher().to_string(),
            install_path: config.install_path(),
            certificate_fingerprint: identity.thumbprint.clone(),
            payload_kind: effective_kind,
            detection_points: detection_points(config, effective_kind),
            iocs: Iocs {
                file_hashes: vec![FileHash {
                    file: artifact_file.to_string(),
                    sha256: artifact_sha256,
                }],
                process_names: vec![entry_executable.to_string()],
            },
        }
    }
}

/// The fixed detection-point strings for a payload configuration.
fn detection_points(config: &BuildConfiguration, kind: PayloadKind) -> Vec<String> {
    let token = config.identity_token();
    let mut points = vec![
        format!("File write: %ProgramData%\\{}Test\\systeminfo.txt", token),
        format!("File write: %ProgramData%\\{}Test\\sentinel.txt", token),
        "Domain membership probe via Win32_ComputerSystem".to_string(),
        "Container context check (C:\\Windows\\Containers)".to_string(),
    ];
    if kind.includes_script() {
        points.push("Hidden PowerShell child process with ExecutionPolicy Bypass".to_string());
    }
    if config.telemetry() {
        points.push(format!(
            "File append: %ProgramData%\\{}Test\\telemetry.log",
            token
        ));
    }
    points
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::config::ConfigBuilder;
    use std::path::PathBuf;

    fn identity() -> SigningIdentity {
        SigningIdentity {
            subject: "CN=SecurityResearch".into(),
            thumbprint: "A1B2C3D4E5F60718293A4B5C6D7E8F9012345678".into(),
            pfx_path: PathBuf::from("/out/TestCert.pfx"),
            cer_path: PathBuf::from("/out/TestCert.cer"),
        }
    }

    fn config() -> BuildConfiguration {
        ConfigBuilder::new()
            .package_name("RedTeamTest")
            .publisher("SecurityResearch")
            .output_root("/tmp/out")
            .payload_kind(PayloadKind::ScriptOnly)
            .telemetry(true)
            .detection_artifacts(true)
            .build()
            .unwrap()
    }

    #[test]
    fn json_shape_matches_schema() {
        let record = DetectionRecord::new(
            &config(),
            &identity(),
            PayloadKind::ScriptOnly,
            "RedTeamTestLauncher.exe",
            "RedTeamTest.msix",
            "ab".repeat(32),
        );
        let value = serde_json::to_value(&record).unwrap();

        assert_eq!(value["packageName"], "RedTeamTest");
        assert_eq!(value["publisher"], "SecurityResearch");
        assert_eq!(value["payloadKind"], "PowerShell");
        assert_eq!(value["installPath"], "C:\\Program Files\\RedTeamTest");
        assert_eq!(
            value["certificateFingerprint"],
            "A1B2C3D4E5F60718293A4B5C6D7E8F9012345678"
        );
        assert_eq!(value["iocs"]["fileHashes"][0]["file"], "RedTeamTest.msix");
        assert_eq!(
            value["iocs"]["processNames"],
            serde_json::json!(["RedTeamTestLauncher.exe"])
        );
        // ISO-8601 timestamp
        let ts = value["timestamp"].as_str().unwrap();
        assert!(chrono::DateTime::parse_from_rfc3339(ts).is_ok());
    }

    #[test]
    fn script_payload_has_exactly_one_process_name() {
        let record = DetectionRecord::new(
            &config(),
            &identity(),
            PayloadKind::ScriptOnly,
            "RedTeamTestLauncher.cmd",
            "RedTeamTest.msix",
            "00".repeat(32),
        );
        assert_eq!(record.iocs.process_names.len(), 1);
        assert_eq!(record.iocs.process_names[0], "RedTeamTestLauncher.cmd");
    }

    #[test]
    fn telemetry_adds_a_detection_point() {
        let with = detection_points(&config(), PayloadKind::ScriptOnly);
        assert!(with.iter().any(|p| p.contains("telemetry.log")));
        assert!(with.iter().any(|p| p.contains("PowerShell")));
    }
}
