//! Signing identity provisioning.
//!
//! Obtains or creates a self-issued code-signing identity keyed by the
//! publisher-derived subject, and exports it as a protected private bundle
//! plus a public certificate. Lookup goes against the caller's identity
//! store; an existing identity with the same subject is reused, so
//! provisioning the same publisher twice yields the same fingerprint.
//! Inserting into the store is the one cross-run shared state the design
//! accepts, to avoid proliferating throwaway identities per run.
//!
//! The private bundle is protected with a fixed placeholder passphrase.
//! That is acceptable only because the artifact is explicitly a disposable
//! test credential, never a production signing key.

use crate::pipeline::config::BuildConfiguration;
use crate::pipeline::error::{Error, Result};
use crate::pipeline::templates::escape::ps_escape;
use crate::pipeline::utils::proc;
use std::path::{Path, PathBuf};

/// Fixed placeholder passphrase protecting the exported private bundle.
pub const PLACEHOLDER_PASSPHRASE: &str = "MsixForgeTest123!";

/// File name of the exported private-key bundle.
pub const PFX_FILE_NAME: &str = "TestCert.pfx";

/// File name of the exported public certificate.
pub const CER_FILE_NAME: &str = "TestCert.cer";

/// A provisioned signing identity.
#[derive(Debug, Clone)]
pub struct SigningIdentity {
    /// Certificate subject (`CN=<publisher>`).
    pub subject: String,
    /// SHA-1 certificate thumbprint as reported by the identity store.
    pub thumbprint: String,
    /// Exported private-key bundle, protected with [`PLACEHOLDER_PASSPHRASE`].
    pub pfx_path: PathBuf,
    /// Exported public certificate.
    pub cer_path: PathBuf,
}

/// Provisions a signing identity for the configured publisher.
///
/// Looks up the identity store by exact subject; creates a self-issued
/// code-signing identity if none matches; exports both bundle files into
/// `output_dir`.
pub async fn provision(
    config: &BuildConfiguration,
    output_dir: &Path,
) -> Result<SigningIdentity> {
    let store = locate_identity_store()?;
    let subject = config.publisher_dn();
    let pfx_path = output_dir.join(PFX_FILE_NAME);
    let cer_path = output_dir.join(CER_FILE_NAME);

    let script = provisioning_script(&subject, &pfx_path, &cer_path);
    let output = proc::run_tool(
        &store,
        ["-NoProfile", "-NonInteractive", "-Command", &script],
        proc::TOOL_TIMEOUT,
    )
    .await?;

    if !output.success() {
        return Err(Error::IdentityProvisionFailed(output.error_excerpt()));
    }

    let thumbprint = parse_thumbprint(&output.stdout).ok_or_else(|| {
        Error::IdentityProvisionFailed(format!(
            "identity store did not report a thumbprint: {}",
            output.error_excerpt()
        ))
    })?;

    log::info!("✓ signing identity {} ({})", subject, thumbprint);

    Ok(SigningIdentity {
        subject,
        thumbprint,
        pfx_path,
        cer_path,
    })
}

/// Locates the identity-store collaborator (PowerShell).
fn locate_identity_store() -> Result<PathBuf> {
    which::which("powershell")
        .or_else(|_| which::which("pwsh"))
        .map_err(|_| {
            Error::IdentityProvisionFailed(
                "no PowerShell host found; the identity store is unavailable".into(),
            )
        })
}

/// Builds the lookup-or-create-then-export script.
///
/// Lookup is by exact subject match; creation is idempotent per subject
/// because an existing match short-circuits it.
fn provisioning_script(subject: &str, pfx_path: &Path, cer_path: &Path) -> String {
    format!(
        "$ErrorActionPreference = 'Stop'\n\
         $subject = '{subject}'\n\
         $cert = Get-ChildItem -Path Cert:\\CurrentUser\\My -CodeSigningCert |\n\
             Where-Object {{ $_.Subject -eq $subject }} |\n\
             Sort-Object -Property NotAfter -Descending |\n\
             Select-Object -First 1\n\
         if (-not $cert) {{\n\
             $cert = New-SelfSignedCertificate -Type CodeSigningCert -Subject $subject `\n\
                 -CertStoreLocation Cert:\\CurrentUser\\My -FriendlyName 'msixforge test signing'\n\
         }}\n\
         $password = ConvertTo-SecureString -String '{passphrase}' -Force -AsPlainText\n\
         Export-PfxCertificate -Cert $cert -FilePath '{pfx}' -Password $password | Out-Null\n\
         Export-Certificate -Cert $cert -FilePath '{cer}' | Out-Null\n\
         $cert.Thumbprint\n",
        subject = ps_escape(subject),
        passphrase = PLACEHOLDER_PASSPHRASE,
        pfx = ps_escape(&pfx_path.display().to_string()),
        cer = ps_escape(&cer_path.display().to_string()),
    )
}

/// Extracts the thumbprint from the identity-store output.
///
/// The script prints the thumbprint as its final line; anything that is
/// not 40 hex characters is rejected.
fn parse_thumbprint(stdout: &str) -> Option<String> {
    let line = stdout.lines().rev().map(str::trim).find(|l| !l.is_empty())?;
    if line.len() == 40 && line.chars().all(|c| c.is_ascii_hexdigit()) {
        Some(line.to_ascii_uppercase())
    } else {
        None
    }
}
