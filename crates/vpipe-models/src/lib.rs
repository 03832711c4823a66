//! Shared data models for the vpipe media pipeline.
//!
//! This crate provides Serde-serializable types for:
//! - Jobs, job modes and pipeline stages
//! - Artifacts and upload results
//! - Segment plans for splitting long recordings
//! - Source descriptors for fetched inputs
//! - Encoding profiles
//! - Inbound job requests and their validation
//! - The failure taxonomy reported to callers

pub mod artifact;
pub mod encoding;
pub mod error_kind;
pub mod job;
pub mod request;
pub mod segment;
pub mod source;
pub mod utils;

// Re-export common types
pub use artifact::{AccessUrl, Artifact, ArtifactKind, UploadResult};
pub use encoding::{EncodingOverride, EncodingProfile};
pub use error_kind::ErrorKind;
pub use job::{Job, JobId, JobMode, JobStage, StageTransitionError};
pub use request::{JobRequest, RequestError};
pub use segment::{SegmentPlan, SegmentPlanError, SegmentSpan, DEFAULT_SEGMENT_SECONDS};
pub use source::{ContainerHint, ContentFamily, SourceDescriptor};
pub use utils::{default_output_name, destination_path, ensure_extension, file_stem, safe_name};
