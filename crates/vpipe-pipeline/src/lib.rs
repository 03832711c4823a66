//! Per-job orchestration for the vpipe media pipeline.
//!
//! This crate provides:
//! - Pipeline configuration
//! - Scratch workspaces that are always cleaned up
//! - The orchestrator driving fetch, processing and upload
//! - Job reports and the pipeline error taxonomy
//! - Structured job logging

pub mod config;
pub mod error;
pub mod logging;
pub mod orchestrator;
pub mod report;
pub mod workspace;

pub use config::PipelineConfig;
pub use error::{JobFailure, PipelineError, PipelineResult};
pub use logging::JobLogger;
pub use orchestrator::Pipeline;
pub use report::{ArtifactReport, JobReport};
pub use workspace::Workspace;
