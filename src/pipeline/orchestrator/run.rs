//! Pipeline runner.
//!
//! Executes the stage sequence strictly in order. Each stage either
//! completes and hands its output to the next, or raises a stage-scoped
//! failure; only CheckToolchain's compiler-missing case, SignArtifact's
//! failure case, and EmitDetectionArtifacts' failure case are continuable.
//! The pipeline itself is single-threaded
//! and sequential; callers wanting responsiveness run it as a background
//! task and observe the coarse progress callback.

use super::stage::{DegradeEvent, Stage, plan_payload};
use crate::pipeline::assemble::{StagingTree, assets, build, sign};
use crate::pipeline::config::{BuildConfiguration, PayloadKind};
use crate::pipeline::error::{Error, ErrorExt, Result};
use crate::pipeline::identity::{self, SigningIdentity};
use crate::pipeline::utils::checksum;
use crate::pipeline::{detection, manifest, templates, toolchain};
use crate::pipeline::toolchain::{ToolchainDescriptor, remediation};
use std::path::PathBuf;
use thiserror::Error as ThisError;
use tokio_util::sync::CancellationToken;

/// Coarse progress callback: (stage position, stage count, stage).
pub type ProgressFn = dyn Fn(usize, usize, Stage) + Send + Sync;

/// A fatal, stage-scoped pipeline failure.
///
/// Carries the stage at which the run failed, the causing error, and the
/// partial staging tree location (when one was created) for manual
/// inspection.
#[derive(Debug, ThisError)]
#[error("stage {stage} failed: {source}")]
pub struct StageFailure {
    /// Stage at which the run failed.
    pub stage: Stage,
    /// Causing error.
    #[source]
    pub source: Error,
    /// Partial staging tree, surfaced for inspection.
    pub staging_root: Option<PathBuf>,
}

/// Final report of a successful pipeline run.
#[derive(Debug)]
pub struct PipelineReport {
    /// Whether the artifact carries an embedded signature.
    pub signed: bool,
    /// Payload kind actually built (post-degrade).
    pub effective_kind: PayloadKind,
    /// Staged entry-point file name referenced by the manifest.
    pub entry_executable: String,
    /// Final artifact location.
    pub artifact_path: PathBuf,
    /// Hex-encoded SHA-256 of the artifact.
    pub artifact_sha256: String,
    /// Provisioned signing identity.
    pub identity: SigningIdentity,
    /// Capability downgrades recorded during the run.
    pub degrade_events: Vec<DegradeEvent>,
    /// Detection record path, when emission was enabled.
    pub detection_log: Option<PathBuf>,
    /// Detection rule path, when emission was enabled.
    pub detection_rule: Option<PathBuf>,
}

/// The pipeline orchestrator.
///
/// Owns one immutable [`BuildConfiguration`] and runs the stage sequence
/// against it. Cancellation is cooperative between stages; an in-flight
/// external tool is only ever killed by its own timeout.
pub struct Pipeline {
    config: BuildConfiguration,
    cancel: CancellationToken,
    progress: Option<Box<ProgressFn>>,
}

impl Pipeline {
    /// Creates a pipeline for the given configuration.
    pub fn new(config: BuildConfiguration) -> Self {
        Self {
            config,
            cancel: CancellationToken::new(),
            progress: None,
        }
    }

    /// Returns a token that cancels the run between stages.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Installs a coarse progress callback ("stage N of M").
    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(usize, usize, Stage) + Send + Sync + 'static,
    {
        self.progress = Some(Box::new(callback));
        self
    }

    /// Returns the configuration this pipeline runs against.
    pub fn config(&self) -> &BuildConfiguration {
        &self.config
    }

    /// Runs the pipeline to completion.
    pub async fn run(&self) -> std::result::Result<PipelineReport, StageFailure> {
        let config = &self.config;

        // CheckToolchain
        self.enter(Stage::CheckToolchain, None)?;
        let (toolchain, planned_kind, mut degrade_events) = self
            .check_toolchain()
            .await
            .map_err(|e| self.fail(Stage::CheckToolchain, e, None))?;
        let packager = toolchain
            .packager
            .clone()
            .ok_or(Error::ToolchainUnavailable {
                tool: toolchain::PACKAGER_TOOL,
            })
            .map_err(|e| self.fail(Stage::CheckToolchain, e, None))?;

        // StageDirectories
        self.enter(Stage::StageDirectories, None)?;
        let tree = StagingTree::create(config)
            .await
            .map_err(|e| self.fail(Stage::StageDirectories, e, None))?;

        // GeneratePayload
        self.enter(Stage::GeneratePayload, Some(&tree))?;
        let (effective_kind, entry_executable, payload_events) = self
            .generate_payload(&tree, &toolchain, planned_kind)
            .await
            .map_err(|e| self.fail(Stage::GeneratePayload, e, Some(&tree)))?;
        degrade_events.extend(payload_events);

        // GenerateAssets
        self.enter(Stage::GenerateAssets, Some(&tree))?;
        assets::generate_assets(tree.assets_dir())
            .await
            .map_err(|e| self.fail(Stage::GenerateAssets, e, Some(&tree)))?;

        // GenerateManifest
        self.enter(Stage::GenerateManifest, Some(&tree))?;
        self.generate_manifest(&tree, &entry_executable)
            .await
            .map_err(|e| self.fail(Stage::GenerateManifest, e, Some(&tree)))?;

        // ProvisionIdentity
        self.enter(Stage::ProvisionIdentity, Some(&tree))?;
        let identity = identity::provision(config, tree.output_dir())
            .await
            .map_err(|e| self.fail(Stage::ProvisionIdentity, e, Some(&tree)))?;

        // BuildArtifact
        self.enter(Stage::BuildArtifact, Some(&tree))?;
        let artifact_path = tree.artifact_path(config);
        build::build_package(&packager, tree.package_dir(), &artifact_path)
            .await
            .map_err(|e| self.fail(Stage::BuildArtifact, e, Some(&tree)))?;

        // SignArtifact - failure is continuable: unsigned artifact
        self.enter(Stage::SignArtifact, Some(&tree))?;
        let signed = match &toolchain.signer {
            Some(signer) => match sign::sign_package(signer, &artifact_path, &identity).await {
                Ok(()) => true,
                Err(e) => {
                    log::warn!("signing failed; continuing with unsigned artifact: {}", e);
                    degrade_events.push(DegradeEvent::SigningFailed {
                        reason: e.to_string(),
                    });
                    false
                }
            },
            None => {
                log::warn!("no signer resolved; artifact will be unsigned");
                degrade_events.push(DegradeEvent::SignerUnavailable);
                false
            }
        };

        // EmitDetectionArtifacts - emission is additive and never fails the run
        self.enter(Stage::EmitDetectionArtifacts, Some(&tree))?;
        let (detection_log, detection_rule) = if config.detection_artifacts() {
            match detection::write_artifacts(
                config,
                &identity,
                effective_kind,
                &entry_executable,
                &artifact_path,
                tree.output_dir(),
            )
            .await
            {
                Ok((json_path, rule_path)) => (Some(json_path), Some(rule_path)),
                Err(e) => {
                    log::warn!("detection artifact emission failed: {}", e);
                    degrade_events.push(DegradeEvent::DetectionEmissionFailed {
                        reason: e.to_string(),
                    });
                    (None, None)
                }
            }
        } else {
            log::debug!("detection artifacts disabled; skipping");
            (None, None)
        };

        // Report
        self.enter(Stage::Report, Some(&tree))?;
        let artifact_sha256 = checksum::calculate_sha256(&artifact_path)
            .await
            .map_err(|e| self.fail(Stage::Report, e, Some(&tree)))?;

        let report = PipelineReport {
            signed,
            effective_kind,
            entry_executable,
            artifact_path,
            artifact_sha256,
            identity,
            degrade_events,
            detection_log,
            detection_rule,
        };

        log::info!(
            "✓ Succeeded (signed={}, payload={}): {}",
            report.signed,
            report.effective_kind,
            report.artifact_path.display()
        );
        for event in &report.degrade_events {
            log::warn!("degraded: {}", event);
        }

        Ok(report)
    }

    /// Resolves the toolchain, runs the per-tool remediation policy, and
    /// settles the payload plan.
    ///
    /// Packager still missing after its single remediation is fatal; a
    /// missing compiler degrades; a missing signer is deferred to the
    /// SignArtifact stage.
    async fn check_toolchain(
        &self,
    ) -> Result<(ToolchainDescriptor, PayloadKind, Vec<DegradeEvent>)> {
        let config = &self.config;
        let mut descriptor = toolchain::resolve();
        let mut sdk_remediated = false;

        if descriptor.packager.is_none() {
            if config.skip_downloads() {
                log::warn!("packager missing and remediation downloads are disabled");
            } else {
                log::warn!("packager missing; attempting SDK remediation");
                match remediation::acquire_packaging_tools().await {
                    Ok(()) => {
                        sdk_remediated = true;
                        descriptor = toolchain::resolve();
                    }
                    Err(e) => log::warn!("packager remediation failed: {}", e),
                }
            }
        }
        if descriptor.packager.is_none() {
            // The packager is structurally required to produce the deliverable.
            return Err(Error::ToolchainUnavailable {
                tool: toolchain::PACKAGER_TOOL,
            });
        }

        if descriptor.signer.is_none() && !config.skip_downloads() && !sdk_remediated {
            log::warn!("signer missing; attempting SDK remediation");
            match remediation::acquire_packaging_tools().await {
                Ok(()) => descriptor = toolchain::resolve(),
                Err(e) => log::warn!("signer remediation failed: {}", e),
            }
        }

        if config.payload_kind().includes_compiled()
            && descriptor.compiler.is_none()
            && !config.skip_downloads()
        {
            log::warn!("compiler missing; attempting Build Tools remediation");
            match remediation::acquire_compiler().await {
                Ok(()) => descriptor = toolchain::resolve(),
                Err(e) => log::warn!("compiler remediation failed: {}", e),
            }
        }

        let (planned, events) = plan_payload(config.payload_kind(), &descriptor);
        for event in &events {
            log::warn!("degraded: {}", event);
        }
        Ok((descriptor, planned, events))
    }

    /// Renders, compiles where required, and stages the payload files.
    ///
    /// Returns the effective payload kind, the staged entry-point file
    /// name, and any degrade events raised by compile fallbacks.
    async fn generate_payload(
        &self,
        tree: &StagingTree,
        toolchain: &ToolchainDescriptor,
        planned: PayloadKind,
    ) -> Result<(PayloadKind, String, Vec<DegradeEvent>)> {
        match planned {
            PayloadKind::CompiledOnly => {
                let entry = self.build_compiled_payload(tree, toolchain).await?;
                Ok((planned, entry, Vec::new()))
            }
            PayloadKind::ScriptOnly => {
                let (entry, events) = self.build_script_payload(tree, toolchain).await?;
                Ok((planned, entry, events))
            }
            PayloadKind::CompiledAndScript => {
                let (script_entry, mut events) = self.build_script_payload(tree, toolchain).await?;
                match self.build_compiled_payload(tree, toolchain).await {
                    Ok(compiled_entry) => Ok((planned, compiled_entry, events)),
                    Err(e @ Error::CompileFailed { .. }) => {
                        // Fall back to the variant that did succeed.
                        log::warn!("compiled variant failed; using script payload: {}", e);
                        events.push(DegradeEvent::PayloadDegraded {
                            from: planned,
                            to: PayloadKind::ScriptOnly,
                            reason: e.to_string(),
                        });
                        Ok((PayloadKind::ScriptOnly, script_entry, events))
                    }
                    Err(e) => Err(e),
                }
            }
        }
    }

    /// Renders, compiles, and stages the compiled payload executable.
    async fn build_compiled_payload(
        &self,
        tree: &StagingTree,
        toolchain: &ToolchainDescriptor,
    ) -> Result<String> {
        let config = &self.config;
        let compiler = toolchain
            .compiler
            .as_ref()
            .ok_or(Error::ToolchainUnavailable {
                tool: toolchain::COMPILER_TOOL,
            })?;

        let source = templates::render_compiled(config)?;
        let source_path = tree
            .appsource_dir()
            .join(format!("{}.cs", config.identity_token()));
        tokio::fs::write(&source_path, &source)
            .await
            .fs_context("writing compiled payload source", &source_path)?;

        let exe_path = tree
            .appsource_dir()
            .join(config.compiled_executable_name());
        templates::compile_source(compiler, &source_path, &exe_path).await?;
        tree.stage_payload_binary(&exe_path).await?;

        Ok(config.compiled_executable_name())
    }

    /// Renders and stages the script payload plus its launcher.
    ///
    /// The launcher is compiled when a compiler is present; otherwise (or
    /// when the launcher compile fails) the batch shim is staged instead.
    async fn build_script_payload(
        &self,
        tree: &StagingTree,
        toolchain: &ToolchainDescriptor,
    ) -> Result<(String, Vec<DegradeEvent>)> {
        let config = &self.config;
        let (script, launcher_source) = templates::render_script(config)?;
        tree.stage_payload_text(&config.script_name(), &script)
            .await?;

        let shim_reason = if let Some(compiler) = &toolchain.compiler {
            let source_path = tree
                .appsource_dir()
                .join(format!("{}Launcher.cs", config.identity_token()));
            tokio::fs::write(&source_path, &launcher_source)
                .await
                .fs_context("writing launcher source", &source_path)?;

            let exe_path = tree
                .appsource_dir()
                .join(config.launcher_executable_name());
            match templates::compile_source(compiler, &source_path, &exe_path).await {
                Ok(()) => {
                    tree.stage_payload_binary(&exe_path).await?;
                    return Ok((config.launcher_executable_name(), Vec::new()));
                }
                Err(e @ Error::CompileFailed { .. }) => e.to_string(),
                Err(e) => return Err(e),
            }
        } else {
            "no payload compiler is available".to_string()
        };

        log::warn!("staging batch launcher shim: {}", shim_reason);
        let shim = templates::render_launcher_shim(config)?;
        tree.stage_payload_text(&config.launcher_shim_name(), &shim)
            .await?;
        let events = vec![DegradeEvent::LauncherShimSubstituted {
            reason: shim_reason,
        }];
        Ok((config.launcher_shim_name(), events))
    }

    /// Renders and writes the manifest, enforcing the entry-point
    /// invariant against the actually staged payload file.
    async fn generate_manifest(&self, tree: &StagingTree, entry_executable: &str) -> Result<()> {
        let config = &self.config;
        let staged = tree.vfs_app_dir().join(entry_executable);
        let entry_rel = tree.entry_point_rel_path(config, entry_executable);
        if !staged.is_file() {
            return Err(Error::ManifestInvariantViolation {
                entry_point: entry_rel,
                staged,
            });
        }

        let rendered = manifest::build_manifest(config, &entry_rel)?;
        let manifest_path = tree.manifest_path();
        tokio::fs::write(&manifest_path, rendered)
            .await
            .fs_context("writing package manifest", &manifest_path)?;
        Ok(())
    }

    /// Records stage entry: cancellation check, progress, logging.
    fn enter(
        &self,
        stage: Stage,
        tree: Option<&StagingTree>,
    ) -> std::result::Result<(), StageFailure> {
        if self.cancel.is_cancelled() {
            return Err(self.fail(stage, Error::Cancelled, tree));
        }
        let total = Stage::SEQUENCE.len();
        log::info!("stage {}/{}: {}", stage.position(), total, stage);
        if let Some(callback) = &self.progress {
            callback(stage.position(), total, stage);
        }
        Ok(())
    }

    /// Builds a stage-scoped failure, surfacing the partial staging tree.
    fn fail(&self, stage: Stage, source: Error, tree: Option<&StagingTree>) -> StageFailure {
        let staging_root = tree.map(|t| t.root().to_path_buf());
        if let Some(root) = &staging_root {
            log::error!(
                "stage {} failed: {} (partial staging tree at {})",
                stage,
                source,
                root.display()
            );
        } else {
            log::error!("stage {} failed: {}", stage, source);
        }
        StageFailure {
            stage,
            source,
            staging_root,
        }
    }
}
