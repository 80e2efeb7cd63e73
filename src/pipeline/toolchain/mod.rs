//! External toolchain resolution.
//!
//! Locates the three external tools the pipeline can use: the payload
//! source compiler (`csc`), the package maker (`makeappx`), and the code
//! signer (`signtool`). Resolution is read-only filesystem probing and
//! never fails; absent tools are reported as `None` and the orchestrator
//! owns the degrade-or-abort decision.

pub mod remediation;

use std::path::PathBuf;

/// Binary name of the payload source compiler.
pub const COMPILER_TOOL: &str = "csc";
/// Binary name of the package maker.
pub const PACKAGER_TOOL: &str = "makeappx";
/// Binary name of the code signer.
pub const SIGNER_TOOL: &str = "signtool";

/// Known install-root glob patterns per tool, ordered by preference.
///
/// Within a pattern, matches are sorted lexically descending so the
/// highest-versioned install wins (SDK and .NET version directories sort
/// that way).
const COMPILER_PATTERNS: &[&str] = &[
    r"C:\Program Files (x86)\Microsoft Visual Studio\*\BuildTools\MSBuild\*\Bin\Roslyn\csc.exe",
    r"C:\Program Files\Microsoft Visual Studio\*\*\MSBuild\*\Bin\Roslyn\csc.exe",
    r"C:\Windows\Microsoft.NET\Framework64\v*\csc.exe",
    r"C:\Windows\Microsoft.NET\Framework\v*\csc.exe",
];

const PACKAGER_PATTERNS: &[&str] = &[
    r"C:\Program Files (x86)\Windows Kits\10\bin\*\x64\makeappx.exe",
    r"C:\Program Files (x86)\Windows Kits\10\bin\x64\makeappx.exe",
];

const SIGNER_PATTERNS: &[&str] = &[
    r"C:\Program Files (x86)\Windows Kits\10\bin\*\x64\signtool.exe",
    r"C:\Program Files (x86)\Windows Kits\10\bin\x64\signtool.exe",
];

/// Resolved, nullable paths to the external tools.
///
/// Computed once at pipeline start and re-resolved only if a remediation
/// step may have changed the environment; read-only afterward.
#[derive(Debug, Clone, Default)]
pub struct ToolchainDescriptor {
    /// Payload source compiler, if found.
    pub compiler: Option<PathBuf>,
    /// Package maker, if found.
    pub packager: Option<PathBuf>,
    /// Code signer, if found.
    pub signer: Option<PathBuf>,
}

impl ToolchainDescriptor {
    /// Builds a descriptor with explicit paths. Intended for tests and for
    /// callers that manage tool locations themselves.
    pub fn with_tools(
        compiler: Option<PathBuf>,
        packager: Option<PathBuf>,
        signer: Option<PathBuf>,
    ) -> Self {
        Self {
            compiler,
            packager,
            signer,
        }
    }
}

/// Resolves the external toolchain.
///
/// Per tool: PATH probe first, then the ordered install-root glob patterns
/// with lexical descending sort of matches. Never errors.
pub fn resolve() -> ToolchainDescriptor {
    let descriptor = ToolchainDescriptor {
        compiler: locate(COMPILER_TOOL, COMPILER_PATTERNS),
        packager: locate(PACKAGER_TOOL, PACKAGER_PATTERNS),
        signer: locate(SIGNER_TOOL, SIGNER_PATTERNS),
    };

    for (name, path) in [
        (COMPILER_TOOL, &descriptor.compiler),
        (PACKAGER_TOOL, &descriptor.packager),
        (SIGNER_TOOL, &descriptor.signer),
    ] {
        match path {
            Some(p) => log::info!("✓ {} available: {}", name, p.display()),
            None => log::debug!("{} not found", name),
        }
    }

    descriptor
}

/// Locates one tool: PATH first, then install-root patterns.
fn locate(binary: &str, patterns: &[&str]) -> Option<PathBuf> {
    match which::which(binary) {
        Ok(path) => {
            log::debug!("Found {} on PATH at: {}", binary, path.display());
            return Some(path);
        }
        Err(e) => {
            log::debug!("{} not on PATH: {}", binary, e);
        }
    }

    locate_in_patterns(patterns)
}

/// Returns the lexically greatest existing match across the ordered patterns.
fn locate_in_patterns(patterns: &[&str]) -> Option<PathBuf> {
    for pattern in patterns {
        let Ok(entries) = glob::glob(pattern) else {
            log::debug!("invalid tool pattern skipped: {}", pattern);
            continue;
        };

        let mut matches: Vec<PathBuf> = entries.filter_map(|e| e.ok()).collect();
        // Highest version first
        matches.sort();
        matches.reverse();

        if let Some(found) = matches.into_iter().find(|p| p.is_file()) {
            log::debug!("Found tool via pattern {}: {}", pattern, found.display());
            return Some(found);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn resolve_never_panics_without_tools() {
        // On hosts without the Windows toolchain this exercises the
        // all-absent path end to end.
        let _ = resolve();
    }

    #[test]
    fn pattern_matching_prefers_highest_version() {
        let tmp = tempfile::tempdir().unwrap();
        for version in ["10.0.17763.0", "10.0.22621.0", "10.0.19041.0"] {
            let dir = tmp.path().join(version).join("x64");
            fs::create_dir_all(&dir).unwrap();
            fs::write(dir.join("makeappx.exe"), b"").unwrap();
        }

        let pattern = format!("{}/*/x64/makeappx.exe", tmp.path().display());
        let found = locate_in_patterns(&[&pattern]).unwrap();
        assert!(found.to_string_lossy().contains("10.0.22621.0"));
    }

    #[test]
    fn earlier_patterns_win_over_later_ones() {
        let tmp = tempfile::tempdir().unwrap();
        let first = tmp.path().join("kits/x64");
        let second = tmp.path().join("legacy/x64");
        for dir in [&first, &second] {
            fs::create_dir_all(dir).unwrap();
            fs::write(dir.join("signtool.exe"), b"").unwrap();
        }

        let p1 = format!("{}/kits/*/signtool.exe", tmp.path().display());
        let p2 = format!("{}/legacy/*/signtool.exe", tmp.path().display());
        let found = locate_in_patterns(&[&p1, &p2]).unwrap();
        assert!(found.starts_with(first.parent().unwrap()));
    }

    #[test]
    fn directories_matching_a_pattern_are_skipped() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir_all(tmp.path().join("v4/csc.exe")).unwrap();
        let pattern = format!("{}/v*/csc.exe", tmp.path().display());
        assert!(locate_in_patterns(&[&pattern]).is_none());
    }
}
