//! HTTP utilities for remediation downloads.

use crate::pipeline::error::{Error, ErrorExt, Result};
use std::path::Path;

/// Downloads a file from a URL to the given destination path.
///
/// Used only by toolchain remediation (compiler / SDK bootstrappers).
/// Parent directories are created as needed.
pub async fn download_to(url: &str, dest: &Path) -> Result<()> {
    log::info!("Downloading {}", url);

    let response = reqwest::get(url)
        .await
        .map_err(|e| Error::GenericError(format!("Download failed: {}", e)))?;

    if !response.status().is_success() {
        return Err(Error::GenericError(format!(
            "Download of {} failed with HTTP {}",
            url,
            response.status()
        )));
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| Error::GenericError(format!("Failed to read response: {}", e)))?;

    if let Some(parent) = dest.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .fs_context("creating download directory", parent)?;
    }
    tokio::fs::write(dest, &bytes)
        .await
        .fs_context("writing downloaded file", dest)?;

    Ok(())
}
