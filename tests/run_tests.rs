//! End-to-end pipeline runs against a stand-in toolchain.
//!
//! A private bin directory with shell-script stand-ins for the packager and
//! the identity store is installed as PATH, with no compiler and no signer
//! present. That is exactly the degraded host the fallback policy is built
//! for, so a full run must still reach the succeeded terminal state.

#![cfg(unix)]

use msixforge::Pipeline;
use msixforge::pipeline::config::{ConfigBuilder, PayloadKind};
use msixforge::pipeline::orchestrator::{DegradeEvent, Stage};
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock};

/// Packager stand-in: creates the file named after `/p`, like a packager
/// that succeeded.
const FAKE_PACKAGER: &str = "#!/bin/sh
out=
prev=
for arg in \"$@\"; do
    [ \"$prev\" = \"/p\" ] && out=$arg
    prev=$arg
done
: > \"$out\"
";

/// Identity-store stand-in: reports a fixed thumbprint as its final line.
const FAKE_IDENTITY_STORE: &str = "#!/bin/sh
echo A1B2C3D4E5F60718293A4B5C6D7E8F9012345678
";

static TOOLS: OnceLock<PathBuf> = OnceLock::new();

/// Installs the stand-in tools and points PATH at them (once per process).
fn fake_toolchain() -> &'static Path {
    TOOLS.get_or_init(|| {
        let dir = std::env::temp_dir().join(format!("msixforge-tools-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        install_tool(&dir, "makeappx", FAKE_PACKAGER);
        install_tool(&dir, "powershell", FAKE_IDENTITY_STORE);
        // Sole PATH entry, so csc and signtool stay unresolved.
        unsafe { std::env::set_var("PATH", &dir) };
        dir
    })
}

fn install_tool(dir: &Path, name: &str, body: &str) {
    let path = dir.join(name);
    std::fs::write(&path, body).unwrap();
    let mut perms = std::fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&path, perms).unwrap();
}

fn config(root: &Path, kind: PayloadKind) -> msixforge::BuildConfiguration {
    ConfigBuilder::new()
        .package_name("RedTeamTest")
        .publisher("SecurityResearch")
        .output_root(root)
        .payload_kind(kind)
        .telemetry(true)
        .detection_artifacts(true)
        .skip_downloads(true)
        .build()
        .unwrap()
}

#[tokio::test]
async fn run_without_compiler_and_signer_succeeds_degraded_and_unsigned() {
    fake_toolchain();
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path().join("run");

    let seen = Arc::new(Mutex::new(Vec::new()));
    let record = seen.clone();
    let pipeline = Pipeline::new(config(&root, PayloadKind::CompiledAndScript)).on_progress(
        move |_, _, stage| {
            record.lock().unwrap().push(stage);
        },
    );
    let report = pipeline.run().await.unwrap();

    // Succeeded, but honestly: unsigned, degraded to script-only, with the
    // batch shim as the entry point.
    assert!(!report.signed);
    assert_eq!(report.effective_kind, PayloadKind::ScriptOnly);
    assert_eq!(report.entry_executable, "RedTeamTestLauncher.cmd");
    assert!(report.artifact_path.is_file());
    assert_eq!(report.artifact_sha256.len(), 64);
    assert!(report.degrade_events.iter().any(|e| matches!(
        e,
        DegradeEvent::PayloadDegraded {
            to: PayloadKind::ScriptOnly,
            ..
        }
    )));
    assert!(
        report
            .degrade_events
            .iter()
            .any(|e| matches!(e, DegradeEvent::SignerUnavailable))
    );

    // The manifest references the staged shim, not the compiled executable.
    let manifest = std::fs::read_to_string(root.join("Package/AppxManifest.xml")).unwrap();
    assert!(manifest.contains(r"VFS\ProgramFilesX64\RedTeamTest\RedTeamTestLauncher.cmd"));
    assert!(!manifest.contains("RedTeamTest.exe"));
    assert!(
        root.join("Package/VFS/ProgramFilesX64/RedTeamTest/RedTeamTestLauncher.cmd")
            .is_file()
    );

    // The detection record reflects the effective kind and entry point.
    let log: serde_json::Value = serde_json::from_str(
        &std::fs::read_to_string(report.detection_log.as_ref().unwrap()).unwrap(),
    )
    .unwrap();
    assert_eq!(log["payloadKind"], "PowerShell");
    assert_eq!(
        log["iocs"]["processNames"],
        serde_json::json!(["RedTeamTestLauncher.cmd"])
    );
    assert_eq!(
        log["certificateFingerprint"],
        "A1B2C3D4E5F60718293A4B5C6D7E8F9012345678"
    );
    assert!(report.detection_rule.as_ref().unwrap().is_file());

    // Every stage ran, in order.
    assert_eq!(seen.lock().unwrap().as_slice(), &Stage::SEQUENCE[..]);
}

#[tokio::test]
async fn detection_emission_failure_degrades_instead_of_failing() {
    fake_toolchain();
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path().join("run");

    // Occupy the record path with a directory right before emission, so the
    // write fails while everything earlier succeeds.
    let blocker = root.join("Output/DetectionLog.json");
    let pipeline =
        Pipeline::new(config(&root, PayloadKind::ScriptOnly)).on_progress(move |_, _, stage| {
            if stage == Stage::EmitDetectionArtifacts {
                std::fs::create_dir_all(&blocker).unwrap();
            }
        });
    let report = pipeline.run().await.unwrap();

    assert!(report.detection_log.is_none());
    assert!(report.detection_rule.is_none());
    assert!(
        report
            .degrade_events
            .iter()
            .any(|e| matches!(e, DegradeEvent::DetectionEmissionFailed { .. }))
    );
    // The artifact itself is untouched by the emission failure.
    assert!(report.artifact_path.is_file());
}
