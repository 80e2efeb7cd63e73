//! Pipeline orchestration.
//!
//! The orchestrator sequences the pipeline components, owns the
//! fallback/remediation policy, and produces the final status and output
//! locations consumed by the caller. It is the only place permitted to
//! decide fatal-vs-degrade, because only it has the cross-stage context.
//!
//! # Module Organization
//!
//! - [`stage`] - the [`Stage`] state machine and degrade planning
//! - [`run`] - the [`Pipeline`] runner

mod run;
mod stage;

pub use run::{Pipeline, PipelineReport, StageFailure};
pub use stage::{DegradeEvent, Stage, plan_payload};
