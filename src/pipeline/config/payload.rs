//! Payload kind enumeration.

use serde::Serialize;

/// Kind of test payload embedded in the built package.
///
/// `CompiledOnly` and `ScriptOnly` are the two interchangeable payload
/// strategies; `CompiledAndScript` carries both. The orchestrator may
/// substitute `ScriptOnly` for a compiled kind when no compiler is
/// available (degrade-not-abort).
///
/// The serialized names are the values written into detection records:
/// `"DotNet"`, `"PowerShell"`, `"DotNetAndPowerShell"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PayloadKind {
    /// Compiled executable payload only.
    #[serde(rename = "DotNet")]
    CompiledOnly,

    /// Script payload plus its launcher only.
    #[serde(rename = "PowerShell")]
    ScriptOnly,

    /// Both a compiled executable and a script payload.
    #[serde(rename = "DotNetAndPowerShell")]
    CompiledAndScript,
}

impl PayloadKind {
    /// Whether this kind includes a compiled component (and so wants the compiler).
    pub fn includes_compiled(self) -> bool {
        matches!(self, Self::CompiledOnly | Self::CompiledAndScript)
    }

    /// Whether this kind includes a script component.
    pub fn includes_script(self) -> bool {
        matches!(self, Self::ScriptOnly | Self::CompiledAndScript)
    }

    /// Parse the CLI spelling of a payload kind.
    pub fn parse_cli(value: &str) -> Option<Self> {
        match value {
            "compiled" => Some(Self::CompiledOnly),
            "script" => Some(Self::ScriptOnly),
            "compiled-and-script" => Some(Self::CompiledAndScript),
            _ => None,
        }
    }
}

impl std::fmt::Display for PayloadKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::CompiledOnly => "CompiledOnly",
            Self::ScriptOnly => "ScriptOnly",
            Self::CompiledAndScript => "CompiledAndScript",
        };
        write!(f, "{}", name)
    }
}
