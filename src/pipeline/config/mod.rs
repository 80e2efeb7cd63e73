//! Build configuration for the pipeline.
//!
//! Configuration is explicit and immutable: every component takes
//! [`BuildConfiguration`] (or the slice it needs) as an argument, never
//! ambient state. Construction goes through [`ConfigBuilder`], which
//! enforces the identifier validation policy up front.

mod builder;
mod core;
mod payload;

pub use builder::ConfigBuilder;
pub use core::BuildConfiguration;
pub use payload::PayloadKind;
