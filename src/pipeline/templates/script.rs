//! Script payload, launcher source, and batch shim templates.
//!
//! The script payload carries the same fixed instrumentation set as the
//! compiled payload. Its launcher comes in two shapes: a compiled launcher
//! executable (when a compiler is available) that starts the script
//! interpreter hidden, and a batch shim used when no compiler can be had,
//! which is what keeps ScriptOnly buildable under compiler degradation.

use super::template_values;
use crate::pipeline::config::BuildConfiguration;
use crate::pipeline::error::Result;
use serde_json::json;

const SCRIPT_TEMPLATE: &str = r#"# Instrumented test payload for '{{package_name_ps}}' ({{publisher_ps}})
$ErrorActionPreference = 'SilentlyContinue'

$testRoot = Join-Path $env:ProgramData '{{token}}Test'
New-Item -ItemType Directory -Path $testRoot -Force | Out-Null

$domainJoined = $false
try {
    $domainJoined = (Get-CimInstance -ClassName Win32_ComputerSystem).PartOfDomain
} catch { }

$container = (Test-Path 'C:\Windows\Containers') -or ($null -ne $env:CONTAINER_SANDBOX_MOUNT_POINT)

$report = @(
    "package: {{package_name_ps}}"
    "publisher: {{publisher_ps}}"
    "host: $env:COMPUTERNAME"
    "user: $env:USERNAME"
    "os: $([System.Environment]::OSVersion.VersionString)"
    "domain-joined: $domainJoined"
    "container: $container"
    "executed-utc: $([DateTime]::UtcNow.ToString('o'))"
)
$report | Set-Content -Path (Join-Path $testRoot 'systeminfo.txt')

"{{package_name_ps}} executed at $([DateTime]::UtcNow.ToString('o'))" |
    Set-Content -Path (Join-Path $testRoot 'sentinel.txt')
{{#if telemetry}}

"$([DateTime]::UtcNow.ToString('o')) beacon {{package_name_ps}}" |
    Add-Content -Path (Join-Path $testRoot 'telemetry.log')
{{/if}}
"#;

const LAUNCHER_TEMPLATE: &str = r#"using System;
using System.Diagnostics;
using System.IO;

namespace {{token}}Launcher
{
    internal static class Program
    {
        private static void Main()
        {
            var baseDir = AppDomain.CurrentDomain.BaseDirectory;
            var script = Path.Combine(baseDir, "{{script_name}}");

            var startInfo = new ProcessStartInfo
            {
                FileName = "powershell.exe",
                Arguments =
                    "-NoProfile -ExecutionPolicy Bypass -WindowStyle Hidden -File \"" + script + "\"",
                UseShellExecute = false,
                CreateNoWindow = true
            };

            using (var process = Process.Start(startInfo))
            {
                if (process != null)
                {
                    process.WaitForExit();
                }
            }
        }
    }
}
"#;

const SHIM_TEMPLATE: &str = "@echo off\r\npowershell.exe -NoProfile -ExecutionPolicy Bypass -WindowStyle Hidden -File \"%~dp0{{script_name}}\"\r\n";

/// Renders the script payload and its launcher source.
///
/// Returns `(script_text, launcher_source_text)`.
pub fn render_script(config: &BuildConfiguration) -> Result<(String, String)> {
    let mut data = template_values(config);
    data.insert("script_name".into(), json!(config.script_name()));

    let script = super::render("script_payload", SCRIPT_TEMPLATE, &data)?;
    let launcher = super::render("script_launcher", LAUNCHER_TEMPLATE, &data)?;
    Ok((script, launcher))
}

/// Renders the batch launcher shim used when no compiler is available.
pub fn render_launcher_shim(config: &BuildConfiguration) -> Result<String> {
    let mut data = template_values(config);
    data.insert("script_name".into(), json!(config.script_name()));
    super::render("launcher_shim", SHIM_TEMPLATE, &data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::config::ConfigBuilder;

    fn config() -> BuildConfiguration {
        ConfigBuilder::new()
            .package_name("Red Team Test")
            .publisher("SecurityResearch")
            .output_root("/tmp/out")
            .build()
            .unwrap()
    }

    #[test]
    fn launcher_references_the_script_by_name() {
        let cfg = config();
        let (_, launcher) = render_script(&cfg).unwrap();
        assert!(launcher.contains("RedTeamTest.ps1"));
        assert!(launcher.contains("namespace RedTeamTestLauncher"));
    }

    #[test]
    fn script_writes_into_package_test_directory() {
        let (script, _) = render_script(&config()).unwrap();
        assert!(script.contains("RedTeamTestTest"));
        assert!(script.contains("sentinel.txt"));
        assert!(script.contains("systeminfo.txt"));
        assert!(script.contains("PartOfDomain"));
    }

    #[test]
    fn shim_invokes_interpreter_hidden() {
        let shim = render_launcher_shim(&config()).unwrap();
        assert!(shim.starts_with("@echo off"));
        assert!(shim.contains("-WindowStyle Hidden"));
        assert!(shim.contains("%~dp0RedTeamTest.ps1"));
    }
}
