//! Build-and-sign pipeline for instrumented test packages.
//!
//! The pipeline sequences a fixed set of components:
//! 1. [`toolchain`] - resolves external tools and drives remediation
//! 2. [`templates`] - renders payload source from fixed templates
//! 3. [`manifest`] - renders the package manifest document
//! 4. [`identity`] - provisions the signing identity
//! 5. [`assemble`] - stages the package tree and invokes packager/signer
//! 6. [`detection`] - emits audit artifacts describing the build
//!
//! Data flows strictly forward: configuration, resolved toolchain, staged
//! tree, built artifact, signed artifact, audit record. No component reads
//! back from a later stage. The [`orchestrator`] owns the fallback policy
//! (compiler-missing degrades, packager-missing is fatal, sign failure is
//! non-fatal).

pub mod assemble;
pub mod config;
pub mod detection;
pub mod error;
pub mod identity;
pub mod manifest;
pub mod orchestrator;
pub mod templates;
pub mod toolchain;
pub mod utils;

pub use config::{BuildConfiguration, ConfigBuilder, PayloadKind};
pub use error::{Error, Result};
pub use identity::SigningIdentity;
pub use orchestrator::{DegradeEvent, Pipeline, PipelineReport, Stage, StageFailure};
pub use toolchain::ToolchainDescriptor;
