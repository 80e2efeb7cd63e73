//! Error taxonomy for the build-and-sign pipeline.
//!
//! Components report failures through these variants; only the orchestrator
//! decides fatal-vs-degrade, because only it has the cross-stage context.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, Error>;

/// Pipeline error taxonomy.
#[derive(Error, Debug)]
pub enum Error {
    /// A tool required for the requested payload kind could not be resolved.
    #[error("required tool unavailable: {tool}")]
    ToolchainUnavailable {
        /// Tool name (e.g. "makeappx")
        tool: &'static str,
    },

    /// The single remediation attempt for a missing tool did not succeed.
    #[error("remediation for {tool} failed: {reason}")]
    RemediationFailed {
        /// Tool the remediation tried to acquire
        tool: &'static str,
        /// Reason for the failure
        reason: String,
    },

    /// Template rendering failed. Indicates a configuration invariant
    /// violation; should not occur with validated input.
    #[error("template rendering failed: {0}")]
    TemplateRenderFailed(String),

    /// The external compiler did not produce the expected output binary.
    #[error("compiling {source_file} failed: {detail}")]
    CompileFailed {
        /// Source file that failed to compile
        source_file: String,
        /// Tool output excerpt
        detail: String,
    },

    /// The external packager did not produce the output artifact.
    #[error("package build failed: {0}")]
    PackageBuildFailed(String),

    /// The external signer reported failure. Always non-fatal: the artifact
    /// is reported as succeeded-but-unsigned.
    #[error("signing failed: {0}")]
    SignFailed(String),

    /// The manifest entry point does not match the staged executable path.
    #[error("manifest entry point {entry_point:?} does not match staged executable {staged:?}")]
    ManifestInvariantViolation {
        /// Executable path referenced by the manifest
        entry_point: String,
        /// Path the payload was actually staged to
        staged: PathBuf,
    },

    /// The signing identity could not be looked up, created, or exported.
    #[error("identity provisioning failed: {0}")]
    IdentityProvisionFailed(String),

    /// An external tool exceeded its bounded timeout and was killed.
    #[error("{command} timed out after {seconds}s and was killed")]
    ToolTimedOut {
        /// Command that timed out
        command: String,
        /// Timeout bound in seconds
        seconds: u64,
    },

    /// An external tool could not be spawned.
    #[error("failed to run {command}: {error}")]
    CommandFailed {
        /// Command that failed to start
        command: String,
        /// Underlying error
        #[source]
        error: std::io::Error,
    },

    /// Filesystem operation failure with context
    #[error("{context} ({path:?}): {error}")]
    FsError {
        /// What was being attempted
        context: String,
        /// Path involved
        path: PathBuf,
        /// Underlying error
        #[source]
        error: std::io::Error,
    },

    /// IO errors without richer context
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The run was cancelled cooperatively between stages.
    #[error("pipeline run cancelled")]
    Cancelled,

    /// Generic errors
    #[error("{0}")]
    GenericError(String),
}

/// Early-return with a [`Error::GenericError`] built from format args.
#[macro_export]
macro_rules! bail {
    ($($arg:tt)*) => {
        return Err($crate::pipeline::Error::GenericError(format!($($arg)*)).into())
    };
}

/// Extension trait adding filesystem context to `io::Result`.
pub trait ErrorExt<T> {
    /// Wrap an io error with a description of the operation and the path.
    fn fs_context(self, context: &str, path: &std::path::Path) -> Result<T>;
}

impl<T> ErrorExt<T> for std::result::Result<T, std::io::Error> {
    fn fs_context(self, context: &str, path: &std::path::Path) -> Result<T> {
        self.map_err(|error| Error::FsError {
            context: context.to_string(),
            path: path.to_path_buf(),
            error,
        })
    }
}

/// Extension trait converting `Option` into pipeline results.
pub trait Context<T> {
    /// Convert `None` into a [`Error::GenericError`] with the given message.
    fn context(self, msg: &str) -> Result<T>;
}

impl<T> Context<T> for Option<T> {
    fn context(self, msg: &str) -> Result<T> {
        self.ok_or_else(|| Error::GenericError(msg.to_string()))
    }
}
