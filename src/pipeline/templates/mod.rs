//! Payload source templating and compilation.
//!
//! Renders payload source text from fixed template bodies with a narrow,
//! fixed set of interpolations (identity token, package name, publisher,
//! telemetry flag). Rendering is deterministic: the same configuration
//! always yields byte-identical text. Timestamps in payload output are
//! written by the *executed* payload at run time, never at render time.
//!
//! # Module Organization
//!
//! - [`escape`] - per-context escaping of user-supplied strings
//! - [`compiled`] - compiled payload source template
//! - [`script`] - script payload, launcher source, and batch shim templates

pub mod compiled;
pub mod escape;
pub mod script;

use crate::pipeline::config::BuildConfiguration;
use crate::pipeline::error::{Error, Result};
use crate::pipeline::utils::proc;
use handlebars::Handlebars;
use serde_json::{Map, Value, json};
use std::path::Path;

pub use compiled::render_compiled;
pub use script::{render_launcher_shim, render_script};

/// Renders one named template with the standard interpolation values.
fn render(name: &str, template: &str, data: &Map<String, Value>) -> Result<String> {
    let mut handlebars = Handlebars::new();
    handlebars.register_escape_fn(handlebars::no_escape);

    handlebars
        .register_template_string(name, template)
        .map_err(|e| Error::TemplateRenderFailed(format!("failed to register {}: {}", name, e)))?;

    handlebars
        .render(name, data)
        .map_err(|e| Error::TemplateRenderFailed(format!("failed to render {}: {}", name, e)))
}

/// Standard interpolation values shared by the payload templates.
fn template_values(config: &BuildConfiguration) -> Map<String, Value> {
    let mut data = Map::new();
    data.insert("token".into(), json!(config.identity_token()));
    data.insert(
        "package_name_cs".into(),
        json!(escape::cs_escape(config.package_name())),
    );
    data.insert(
        "publisher_cs".into(),
        json!(escape::cs_escape(config.publisher())),
    );
    data.insert(
        "package_name_ps".into(),
        json!(escape::ps_escape(config.package_name())),
    );
    data.insert(
        "publisher_ps".into(),
        json!(escape::ps_escape(config.publisher())),
    );
    data.insert("telemetry".into(), json!(config.telemetry()));
    data
}

/// Compiles one rendered source file with the resolved compiler.
///
/// Success is defined as the expected output binary existing after the
/// invocation completes, not solely by process exit code: the external
/// compiler's exit-code semantics are not trusted as the sole signal.
pub async fn compile_source(compiler: &Path, source: &Path, output: &Path) -> Result<()> {
    let source_arg = source.display().to_string();
    let out_arg = format!("/out:{}", output.display());

    let result = proc::run_tool(
        compiler,
        ["/nologo", "/target:exe", "/optimize+", &out_arg, &source_arg],
        proc::TOOL_TIMEOUT,
    )
    .await?;

    if !output.is_file() {
        return Err(Error::CompileFailed {
            source_file: source
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| source_arg.clone()),
            detail: result.error_excerpt(),
        });
    }

    if !result.success() {
        // Output exists despite a nonzero exit; keep it but note the oddity.
        log::warn!(
            "compiler exited with code {:?} but produced {}",
            result.code,
            output.display()
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::config::{ConfigBuilder, PayloadKind};

    fn config(telemetry: bool) -> BuildConfiguration {
        ConfigBuilder::new()
            .package_name("Red Team Test")
            .publisher("SecurityResearch")
            .output_root("/tmp/out")
            .payload_kind(PayloadKind::CompiledAndScript)
            .telemetry(telemetry)
            .build()
            .unwrap()
    }

    #[test]
    fn rendering_is_deterministic() {
        let cfg = config(true);
        assert_eq!(
            render_compiled(&cfg).unwrap(),
            render_compiled(&cfg).unwrap()
        );
        assert_eq!(render_script(&cfg).unwrap(), render_script(&cfg).unwrap());
        assert_eq!(
            render_launcher_shim(&cfg).unwrap(),
            render_launcher_shim(&cfg).unwrap()
        );
    }

    #[test]
    fn telemetry_flag_gates_beacon_lines() {
        let with = render_compiled(&config(true)).unwrap();
        let without = render_compiled(&config(false)).unwrap();
        assert!(with.contains("telemetry.log"));
        assert!(!without.contains("telemetry.log"));

        let (script_with, _) = render_script(&config(true)).unwrap();
        let (script_without, _) = render_script(&config(false)).unwrap();
        assert!(script_with.contains("telemetry.log"));
        assert!(!script_without.contains("telemetry.log"));
    }

    #[test]
    fn no_placeholders_survive_rendering() {
        let cfg = config(true);
        let (script, launcher) = render_script(&cfg).unwrap();
        for text in [
            render_compiled(&cfg).unwrap(),
            script,
            launcher,
            render_launcher_shim(&cfg).unwrap(),
        ] {
            assert!(!text.contains("{{"), "unrendered placeholder in:\n{}", text);
        }
    }
}
