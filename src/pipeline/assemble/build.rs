//! Package build execution.
//!
//! Invokes the external packager with the staging directory and output
//! path. Success is defined by the output artifact file existing
//! afterward, not by the packager's exit status alone.

use crate::pipeline::error::{Error, Result};
use crate::pipeline::utils::proc;
use std::path::Path;

/// Runs the packager to produce the container artifact.
pub async fn build_package(packager: &Path, package_dir: &Path, artifact: &Path) -> Result<()> {
    log::info!("Running packager for {}", artifact.display());

    let dir_arg = package_dir.display().to_string();
    let out_arg = artifact.display().to_string();

    let output = proc::run_tool(
        packager,
        ["pack", "/o", "/d", &dir_arg, "/p", &out_arg],
        proc::TOOL_TIMEOUT,
    )
    .await?;

    if !artifact.is_file() {
        return Err(Error::PackageBuildFailed(output.error_excerpt()));
    }

    if !output.success() {
        log::warn!(
            "packager exited with code {:?} but produced {}",
            output.code,
            artifact.display()
        );
    }

    log::info!("✓ Created package: {}", artifact.display());
    Ok(())
}
