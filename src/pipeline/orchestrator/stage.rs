//! Pipeline stage sequence and degrade planning.

use crate::pipeline::config::PayloadKind;
use crate::pipeline::toolchain::ToolchainDescriptor;

/// The strictly ordered pipeline stages. No stage branches back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Resolve external tools, run remediation, settle the payload plan.
    CheckToolchain,
    /// Destroy and recreate the staging tree.
    StageDirectories,
    /// Render payload source, compile where required, stage payload files.
    GeneratePayload,
    /// Render placeholder logos.
    GenerateAssets,
    /// Render and write the package manifest.
    GenerateManifest,
    /// Look up or create the signing identity and export it.
    ProvisionIdentity,
    /// Invoke the packager.
    BuildArtifact,
    /// Invoke the signer (failure continuable: unsigned artifact).
    SignArtifact,
    /// Emit the detection record and rule, when enabled (failure
    /// continuable: the build stands without them).
    EmitDetectionArtifacts,
    /// Assemble the final report.
    Report,
}

impl Stage {
    /// The full stage sequence, in execution order.
    pub const SEQUENCE: [Stage; 10] = [
        Stage::CheckToolchain,
        Stage::StageDirectories,
        Stage::GeneratePayload,
        Stage::GenerateAssets,
        Stage::GenerateManifest,
        Stage::ProvisionIdentity,
        Stage::BuildArtifact,
        Stage::SignArtifact,
        Stage::EmitDetectionArtifacts,
        Stage::Report,
    ];

    /// Stage name as reported to the caller.
    pub fn name(self) -> &'static str {
        match self {
            Stage::CheckToolchain => "CheckToolchain",
            Stage::StageDirectories => "StageDirectories",
            Stage::GeneratePayload => "GeneratePayload",
            Stage::GenerateAssets => "GenerateAssets",
            Stage::GenerateManifest => "GenerateManifest",
            Stage::ProvisionIdentity => "ProvisionIdentity",
            Stage::BuildArtifact => "BuildArtifact",
            Stage::SignArtifact => "SignArtifact",
            Stage::EmitDetectionArtifacts => "EmitDetectionArtifacts",
            Stage::Report => "Report",
        }
    }

    /// One-based position in the sequence, for "stage N of M" progress.
    pub fn position(self) -> usize {
        Self::SEQUENCE
            .iter()
            .position(|s| *s == self)
            .map(|i| i + 1)
            .unwrap_or(0)
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A recorded capability downgrade.
///
/// Degrades are reported explicitly so the caller is never silently given
/// a different artifact than requested.
#[derive(Debug, Clone)]
pub enum DegradeEvent {
    /// The payload kind was substituted for a lesser one.
    PayloadDegraded {
        /// Originally requested kind.
        from: PayloadKind,
        /// Kind actually built.
        to: PayloadKind,
        /// Why the downgrade happened.
        reason: String,
    },
    /// The script launcher could not be compiled; a batch shim was staged.
    LauncherShimSubstituted {
        /// Why the launcher compile was skipped or failed.
        reason: String,
    },
    /// No signer was resolved; the artifact ships unsigned.
    SignerUnavailable,
    /// The signer ran and failed; the artifact ships unsigned.
    SigningFailed {
        /// Signer error excerpt.
        reason: String,
    },
    /// Detection artifacts could not be written; the build itself stands.
    DetectionEmissionFailed {
        /// Emission error excerpt.
        reason: String,
    },
}

impl std::fmt::Display for DegradeEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DegradeEvent::PayloadDegraded { from, to, reason } => {
                write!(f, "payload degraded {} -> {}: {}", from, to, reason)
            }
            DegradeEvent::LauncherShimSubstituted { reason } => {
                write!(f, "batch launcher shim substituted: {}", reason)
            }
            DegradeEvent::SignerUnavailable => {
                write!(f, "no signer available; artifact left unsigned")
            }
            DegradeEvent::SigningFailed { reason } => {
                write!(f, "signing failed; artifact left unsigned: {}", reason)
            }
            DegradeEvent::DetectionEmissionFailed { reason } => {
                write!(f, "detection artifact emission failed: {}", reason)
            }
        }
    }
}

/// Decides the effective payload kind for the resolved toolchain.
///
/// This is the compiler-side half of the design asymmetry: a missing
/// compiler degrades the payload kind to ScriptOnly instead of aborting,
/// because the compiler is one of two interchangeable payload strategies.
/// (The packager, by contrast, is structurally required and handled as
/// fatal by the orchestrator.)
pub fn plan_payload(
    requested: PayloadKind,
    toolchain: &ToolchainDescriptor,
) -> (PayloadKind, Vec<DegradeEvent>) {
    if requested.includes_compiled() && toolchain.compiler.is_none() {
        let event = DegradeEvent::PayloadDegraded {
            from: requested,
            to: PayloadKind::ScriptOnly,
            reason: "no payload compiler is available".to_string(),
        };
        return (PayloadKind::ScriptOnly, vec![event]);
    }
    (requested, Vec::new())
}
