//! One-shot toolchain remediation.
//!
//! When a required tool is missing and downloads are not skipped, the
//! orchestrator asks this module to acquire it: download the vendor
//! bootstrapper into the cache directory and launch it with its silent
//! flags. At most one attempt per run; the descriptor is re-resolved by
//! the orchestrator afterward.

use crate::pipeline::error::{Error, Result};
use crate::pipeline::utils::{http, proc};
use std::path::PathBuf;

/// Build Tools bootstrapper (provides the csc compiler).
const BUILD_TOOLS_URL: &str = "https://aka.ms/vs/17/release/vs_BuildTools.exe";

/// Windows SDK bootstrapper (provides makeappx and signtool).
const SDK_SETUP_URL: &str = "https://go.microsoft.com/fwlink/?linkid=2196241";

/// Attempts to acquire the payload source compiler.
///
/// Failure here is not fatal by itself; the orchestrator degrades the
/// payload kind if the compiler is still absent afterward.
pub async fn acquire_compiler() -> Result<()> {
    let installer = download_cached(BUILD_TOOLS_URL, "vs_BuildTools.exe")
        .await
        .map_err(|e| remediation_failed(super::COMPILER_TOOL, e))?;

    let output = proc::run_tool(
        &installer,
        [
            "--quiet",
            "--wait",
            "--norestart",
            "--add",
            "Microsoft.Component.MSBuild",
            "--add",
            "Microsoft.Net.Component.4.8.SDK",
        ],
        proc::INSTALLER_TIMEOUT,
    )
    .await
    .map_err(|e| remediation_failed(super::COMPILER_TOOL, e))?;

    if !output.success() {
        return Err(Error::RemediationFailed {
            tool: super::COMPILER_TOOL,
            reason: output.error_excerpt(),
        });
    }
    Ok(())
}

/// Attempts to acquire the packaging tools (package maker and signer).
pub async fn acquire_packaging_tools() -> Result<()> {
    let installer = download_cached(SDK_SETUP_URL, "winsdksetup.exe")
        .await
        .map_err(|e| remediation_failed(super::PACKAGER_TOOL, e))?;

    let output = proc::run_tool(
        &installer,
        [
            "/features",
            "OptionId.SigningTools",
            "OptionId.MSIXPackagingTools",
            "/quiet",
            "/norestart",
        ],
        proc::INSTALLER_TIMEOUT,
    )
    .await
    .map_err(|e| remediation_failed(super::PACKAGER_TOOL, e))?;

    if !output.success() {
        return Err(Error::RemediationFailed {
            tool: super::PACKAGER_TOOL,
            reason: output.error_excerpt(),
        });
    }
    Ok(())
}

/// Downloads a bootstrapper into the cache directory, reusing a previous
/// download when present.
async fn download_cached(url: &str, file_name: &str) -> Result<PathBuf> {
    let cache_root = dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("msixforge");
    let dest = cache_root.join(file_name);

    if !dest.is_file() {
        http::download_to(url, &dest).await?;
    } else {
        log::debug!("reusing cached bootstrapper at {}", dest.display());
    }
    Ok(dest)
}

fn remediation_failed(tool: &'static str, cause: Error) -> Error {
    Error::RemediationFailed {
        tool,
        reason: cause.to_string(),
    }
}
