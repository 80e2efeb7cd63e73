//! Staging tree layout.
//!
//! The on-disk layout produced for assembly:
//!
//! ```text
//! <output>/Package/Assets/*.png
//! <output>/Package/VFS/ProgramFilesX64/<name>/<payload files>
//! <output>/Package/AppxManifest.xml
//! <output>/AppSource/*            pre-staged source and compiled artifacts
//! <output>/Output/*               final artifact, certificates, detection files
//! ```
//!
//! Owned exclusively by the assembler; destroyed and recreated wholesale on
//! each run so no stale files contaminate the build. The design assumes no
//! two runs target the same output path concurrently; callers must derive
//! unique output paths.

use crate::pipeline::config::BuildConfiguration;
use crate::pipeline::error::{ErrorExt, Result};
use crate::pipeline::utils::fs as forge_fs;
use std::path::{Path, PathBuf};

/// The staged directory layout for one pipeline run.
#[derive(Debug, Clone)]
pub struct StagingTree {
    root: PathBuf,
    package_dir: PathBuf,
    assets_dir: PathBuf,
    vfs_app_dir: PathBuf,
    appsource_dir: PathBuf,
    output_dir: PathBuf,
}

impl StagingTree {
    /// Creates the staging tree, erasing any prior contents of the root.
    pub async fn create(config: &BuildConfiguration) -> Result<Self> {
        let root = config.output_root().to_path_buf();
        let package_dir = root.join("Package");
        let assets_dir = package_dir.join("Assets");
        let vfs_app_dir = package_dir
            .join("VFS")
            .join("ProgramFilesX64")
            .join(config.install_dir_name());
        let appsource_dir = root.join("AppSource");
        let output_dir = root.join("Output");

        forge_fs::create_dir_all(&root, true).await?;
        for dir in [&assets_dir, &vfs_app_dir, &appsource_dir, &output_dir] {
            forge_fs::create_dir_all(dir, false).await?;
        }

        log::debug!("staging tree created at {}", root.display());

        Ok(Self {
            root,
            package_dir,
            assets_dir,
            vfs_app_dir,
            appsource_dir,
            output_dir,
        })
    }

    /// Staging root (the configured output root).
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory handed to the packager.
    pub fn package_dir(&self) -> &Path {
        &self.package_dir
    }

    /// Placeholder asset directory inside the package.
    pub fn assets_dir(&self) -> &Path {
        &self.assets_dir
    }

    /// Application directory under the virtualized ProgramFiles tree.
    pub fn vfs_app_dir(&self) -> &Path {
        &self.vfs_app_dir
    }

    /// Scratch directory for rendered source and compiled intermediates.
    pub fn appsource_dir(&self) -> &Path {
        &self.appsource_dir
    }

    /// Final output directory (artifact, certificates, detection files).
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Path of the manifest file inside the package.
    pub fn manifest_path(&self) -> PathBuf {
        self.package_dir.join("AppxManifest.xml")
    }

    /// Path of the final artifact for the given configuration.
    pub fn artifact_path(&self, config: &BuildConfiguration) -> PathBuf {
        self.output_dir
            .join(format!("{}.msix", config.identity_token()))
    }

    /// Package-relative entry-point path for a payload file staged in the
    /// VFS application directory, in the backslash form the manifest uses.
    pub fn entry_point_rel_path(&self, config: &BuildConfiguration, file_name: &str) -> String {
        format!(
            "VFS\\ProgramFilesX64\\{}\\{}",
            config.install_dir_name(),
            file_name
        )
    }

    /// Writes a rendered payload file into both the scratch source
    /// directory and the VFS application directory, returning the staged
    /// VFS path.
    pub async fn stage_payload_text(&self, file_name: &str, content: &str) -> Result<PathBuf> {
        let source_copy = self.appsource_dir.join(file_name);
        tokio::fs::write(&source_copy, content)
            .await
            .fs_context("writing payload source", &source_copy)?;

        let staged = self.vfs_app_dir.join(file_name);
        tokio::fs::write(&staged, content)
            .await
            .fs_context("staging payload file", &staged)?;
        Ok(staged)
    }

    /// Copies a compiled payload binary from the scratch directory into the
    /// VFS application directory, returning the staged path.
    pub async fn stage_payload_binary(&self, built: &Path) -> Result<PathBuf> {
        let file_name = built
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        let staged = self.vfs_app_dir.join(&file_name);
        forge_fs::copy_file(built, &staged).await?;
        Ok(staged)
    }
}
