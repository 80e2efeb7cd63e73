//! Uniform external-tool execution.
//!
//! Every external invocation made by the pipeline (compiler, packager,
//! signer, identity store, remediation installers) goes through
//! [`run_tool`]: spawn with captured output, await with a bounded timeout,
//! kill outright on expiry. Retries are a caller-level decision; partial
//! toolchain invocations are not safely resumable.

use crate::pipeline::error::{Error, Result};
use std::ffi::OsStr;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

/// Timeout bound for compile/package/sign invocations.
pub const TOOL_TIMEOUT: Duration = Duration::from_secs(300);

/// Timeout bound for remediation installer invocations.
pub const INSTALLER_TIMEOUT: Duration = Duration::from_secs(600);

/// Maximum length of the stderr excerpt carried in error messages.
const STDERR_EXCERPT_LEN: usize = 800;

/// Captured result of an external tool invocation.
#[derive(Debug)]
pub struct ToolOutput {
    /// Exit code, if the process exited normally.
    pub code: Option<i32>,
    /// Captured standard output (lossy UTF-8).
    pub stdout: String,
    /// Captured standard error (lossy UTF-8).
    pub stderr: String,
}

impl ToolOutput {
    /// Whether the process exited with status zero.
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// A readable excerpt of the tool's error output for failure reports.
    ///
    /// Prefers stderr, falls back to stdout; truncated to a fixed length
    /// on a character boundary.
    pub fn error_excerpt(&self) -> String {
        let text = if self.stderr.trim().is_empty() {
            self.stdout.trim()
        } else {
            self.stderr.trim()
        };
        let mut excerpt: String = text.chars().take(STDERR_EXCERPT_LEN).collect();
        if excerpt.len() < text.len() {
            excerpt.push_str(" [...]");
        }
        if excerpt.is_empty() {
            excerpt.push_str("(no tool output)");
        }
        excerpt
    }
}

/// Runs an external tool to completion with a bounded timeout.
///
/// On timeout the child process is killed (`kill_on_drop`) and
/// [`Error::ToolTimedOut`] is returned; the stage treats this as failed
/// without retrying.
pub async fn run_tool<I, S>(program: &Path, args: I, timeout: Duration) -> Result<ToolOutput>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let command_name = program.display().to_string();
    log::debug!("running external tool: {}", command_name);

    let child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|error| Error::CommandFailed {
            command: command_name.clone(),
            error,
        })?;

    let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
        Ok(result) => result.map_err(|error| Error::CommandFailed {
            command: command_name.clone(),
            error,
        })?,
        // Dropping the wait future drops the child handle, which kills the
        // process via kill_on_drop.
        Err(_elapsed) => {
            return Err(Error::ToolTimedOut {
                command: command_name,
                seconds: timeout.as_secs(),
            });
        }
    };

    let result = ToolOutput {
        code: output.status.code(),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    };

    log::debug!(
        "{} exited with code {:?} ({} bytes stdout, {} bytes stderr)",
        command_name,
        result.code,
        result.stdout.len(),
        result.stderr.len()
    );

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn error_excerpt_prefers_stderr_and_truncates() {
        let out = ToolOutput {
            code: Some(1),
            stdout: "ignored".into(),
            stderr: "e".repeat(2000),
        };
        let excerpt = out.error_excerpt();
        assert!(excerpt.ends_with(" [...]"));
        assert!(excerpt.len() < 900);
    }

    #[test]
    fn error_excerpt_falls_back_to_stdout() {
        let out = ToolOutput {
            code: Some(1),
            stdout: "from stdout".into(),
            stderr: "   ".into(),
        };
        assert_eq!(out.error_excerpt(), "from stdout");
    }

    #[tokio::test]
    async fn missing_program_reports_command_failed() {
        let err = run_tool(
            &PathBuf::from("/definitely/not/a/tool"),
            ["--version"],
            Duration::from_secs(5),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Error::CommandFailed { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn captures_exit_code_and_output() {
        let out = run_tool(
            &PathBuf::from("/bin/sh"),
            ["-c", "echo hi; exit 3"],
            Duration::from_secs(5),
        )
        .await
        .unwrap();
        assert_eq!(out.code, Some(3));
        assert!(!out.success());
        assert_eq!(out.stdout.trim(), "hi");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn kills_on_timeout() {
        let err = run_tool(
            &PathBuf::from("/bin/sh"),
            ["-c", "sleep 30"],
            Duration::from_millis(100),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Error::ToolTimedOut { .. }));
    }
}
