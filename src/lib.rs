//! Build-and-sign pipeline for instrumented MSIX test packages.
//!
//! This library provides the core pipeline for producing reproducible,
//! instrumented test packages:
//! - External toolchain resolution with graceful degradation
//! - Payload source templating (compiled and script payloads)
//! - Package manifest generation
//! - Signing identity provisioning
//! - External packager/signer invocation
//! - Detection/audit artifact emission
//!
//! It can be used both as a CLI tool and as a library dependency.

pub mod cli;
pub mod error;
pub mod pipeline;

// Re-export commonly used types
pub use error::{CliError, ForgeError, Result};
pub use pipeline::{BuildConfiguration, PayloadKind, Pipeline, PipelineReport};
