//! Package assembly: staging tree layout, placeholder assets, packager
//! invocation, and signing.
//!
//! # Module Organization
//!
//! - [`staging`] - on-disk staging tree, recreated wholesale per run
//! - [`assets`] - placeholder logo generation
//! - [`build`] - packager invocation (success = output artifact exists)
//! - [`sign`] - signer invocation (failure is non-fatal)

pub mod assets;
pub mod build;
pub mod sign;
pub mod staging;

pub use staging::StagingTree;
