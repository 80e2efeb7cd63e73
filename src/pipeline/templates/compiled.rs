//! Compiled payload source template.
//!
//! The rendered program performs the fixed instrumentation set: system
//! info dump, domain-membership probe, sentinel file writes into the
//! per-package test directory, and a container-context check. With the
//! telemetry flag set it also appends a local beacon line per run.

use super::template_values;
use crate::pipeline::config::BuildConfiguration;
use crate::pipeline::error::Result;

const COMPILED_TEMPLATE: &str = r#"using System;
using System.IO;
using System.Text;

namespace {{token}}App
{
    internal static class Program
    {
        private const string PackageName = "{{package_name_cs}}";
        private const string Publisher = "{{publisher_cs}}";

        private static readonly string TestRoot = Path.Combine(
            Environment.GetFolderPath(Environment.SpecialFolder.CommonApplicationData),
            "{{token}}Test");

        private static void Main()
        {
            Directory.CreateDirectory(TestRoot);

            var report = new StringBuilder();
            report.AppendLine("package: " + PackageName);
            report.AppendLine("publisher: " + Publisher);
            report.AppendLine("host: " + Environment.MachineName);
            report.AppendLine("user: " + Environment.UserName);
            report.AppendLine("os: " + Environment.OSVersion);
            report.AppendLine("domain-joined: " + ProbeDomainMembership());
            report.AppendLine("container: " + ProbeContainerContext());
            report.AppendLine("executed-utc: " + DateTime.UtcNow.ToString("o"));
            File.WriteAllText(Path.Combine(TestRoot, "systeminfo.txt"), report.ToString());

            File.WriteAllText(
                Path.Combine(TestRoot, "sentinel.txt"),
                PackageName + " executed at " + DateTime.UtcNow.ToString("o"));
{{#if telemetry}}
            File.AppendAllText(
                Path.Combine(TestRoot, "telemetry.log"),
                DateTime.UtcNow.ToString("o") + " beacon " + PackageName + Environment.NewLine);
{{/if}}
        }

        private static bool ProbeDomainMembership()
        {
            try
            {
                return !string.Equals(
                    Environment.UserDomainName,
                    Environment.MachineName,
                    StringComparison.OrdinalIgnoreCase);
            }
            catch
            {
                return false;
            }
        }

        private static bool ProbeContainerContext()
        {
            return Directory.Exists(@"C:\Windows\Containers")
                || Environment.GetEnvironmentVariable("CONTAINER_SANDBOX_MOUNT_POINT") != null;
        }
    }
}
"#;

/// Renders the compiled payload source for the given configuration.
pub fn render_compiled(config: &BuildConfiguration) -> Result<String> {
    super::render("compiled_payload", COMPILED_TEMPLATE, &template_values(config))
}
