//! Artifact signing.
//!
//! Invokes the external signer against the built artifact, which embeds a
//! signature block in place rather than producing a new file. Failure is
//! always non-fatal at the pipeline level: an unsigned artifact is still a
//! valid deliverable and the run is reported as succeeded-but-unsigned.

use crate::pipeline::error::{Error, Result};
use crate::pipeline::identity::{PLACEHOLDER_PASSPHRASE, SigningIdentity};
use crate::pipeline::utils::proc;
use std::path::Path;

/// Signs the artifact in place with the provisioned identity.
pub async fn sign_package(
    signer: &Path,
    artifact: &Path,
    identity: &SigningIdentity,
) -> Result<()> {
    log::info!(
        "Signing {} as {}",
        artifact.display(),
        identity.subject
    );

    let pfx_arg = identity.pfx_path.display().to_string();
    let artifact_arg = artifact.display().to_string();

    let output = proc::run_tool(
        signer,
        [
            "sign",
            "/fd",
            "SHA256",
            "/f",
            &pfx_arg,
            "/p",
            PLACEHOLDER_PASSPHRASE,
            &artifact_arg,
        ],
        proc::TOOL_TIMEOUT,
    )
    .await?;

    if !output.success() {
        return Err(Error::SignFailed(output.error_excerpt()));
    }

    log::info!("✓ Signed artifact: {}", artifact.display());
    Ok(())
}
