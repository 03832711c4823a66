//! Job definitions for a single pipeline run.

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::Artifact;

/// Unique identifier for a job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    /// Generate a new random job ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short form used in scratch directory names and log lines.
    pub fn short(&self) -> &str {
        let end = self.0.len().min(8);
        &self.0[..end]
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What a job does with its inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum JobMode {
    /// Cut one long recording into fixed-length segments
    Split,
    /// Merge several clips into one output
    Concat,
}

impl JobMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobMode::Split => "split",
            JobMode::Concat => "concat",
        }
    }
}

impl fmt::Display for JobMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pipeline stage of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobStage {
    #[default]
    Created,
    Fetching,
    Processing,
    Uploading,
    Done,
    Failed,
}

impl JobStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStage::Created => "created",
            JobStage::Fetching => "fetching",
            JobStage::Processing => "processing",
            JobStage::Uploading => "uploading",
            JobStage::Done => "done",
            JobStage::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStage::Done | JobStage::Failed)
    }

    /// Whether moving from `self` to `next` is a legal transition.
    ///
    /// `Uploading` may be skipped when the caller opted out of upload.
    pub fn can_transition_to(&self, next: JobStage) -> bool {
        use JobStage::*;
        match (self, next) {
            (from, Failed) => !from.is_terminal(),
            (Created, Fetching)
            | (Fetching, Processing)
            | (Processing, Uploading)
            | (Processing, Done)
            | (Uploading, Done) => true,
            _ => false,
        }
    }
}

impl fmt::Display for JobStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("illegal job stage transition {from} -> {to}")]
pub struct StageTransitionError {
    pub from: JobStage,
    pub to: JobStage,
}

/// One invocation of the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Job {
    /// Unique job ID
    pub id: JobId,

    /// Split or concat
    pub mode: JobMode,

    /// Source URLs in caller order
    pub sources: Vec<String>,

    /// Sanitised output base name
    pub output_name: String,

    /// Destination prefix inside the bucket
    pub dest_prefix: String,

    /// Scratch directory, set once the workspace exists
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scratch_dir: Option<PathBuf>,

    /// Produced artifacts in report order
    #[serde(default)]
    pub artifacts: Vec<Artifact>,

    /// Current stage
    #[serde(default)]
    pub stage: JobStage,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Completed or failed at
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,

    /// Error message (if failed)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl Job {
    /// Create a job in the `Created` stage.
    pub fn new(
        mode: JobMode,
        sources: Vec<String>,
        output_name: impl Into<String>,
        dest_prefix: impl Into<String>,
    ) -> Self {
        Self {
            id: JobId::new(),
            mode,
            sources,
            output_name: output_name.into(),
            dest_prefix: dest_prefix.into(),
            scratch_dir: None,
            artifacts: Vec::new(),
            stage: JobStage::Created,
            created_at: Utc::now(),
            finished_at: None,
            error_message: None,
        }
    }

    /// Move the job to `next`, rejecting illegal transitions.
    pub fn advance(&mut self, next: JobStage) -> Result<(), StageTransitionError> {
        if !self.stage.can_transition_to(next) {
            return Err(StageTransitionError {
                from: self.stage,
                to: next,
            });
        }
        self.stage = next;
        if next.is_terminal() {
            self.finished_at = Some(Utc::now());
        }
        Ok(())
    }

    /// Mark job as failed from whatever non-terminal stage it is in.
    pub fn fail(&mut self, message: impl Into<String>) {
        if !self.stage.is_terminal() {
            self.stage = JobStage::Failed;
            self.finished_at = Some(Utc::now());
        }
        self.error_message = Some(message.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_id_is_unique_and_short() {
        let a = JobId::new();
        let b = JobId::new();
        assert_ne!(a, b);
        assert_eq!(a.short().len(), 8);
        assert!(a.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_happy_path_transitions() {
        let mut job = Job::new(JobMode::Split, vec!["https://a/b.mp4".into()], "b", "x/");
        job.advance(JobStage::Fetching).unwrap();
        job.advance(JobStage::Processing).unwrap();
        job.advance(JobStage::Uploading).unwrap();
        job.advance(JobStage::Done).unwrap();
        assert!(job.finished_at.is_some());
    }

    #[test]
    fn test_upload_stage_can_be_skipped() {
        assert!(JobStage::Processing.can_transition_to(JobStage::Done));
    }

    #[test]
    fn test_illegal_transitions_rejected() {
        let mut job = Job::new(JobMode::Concat, vec![], "out", "");
        let err = job.advance(JobStage::Processing).unwrap_err();
        assert_eq!(err.from, JobStage::Created);
        assert!(!JobStage::Done.can_transition_to(JobStage::Failed));
        assert!(!JobStage::Failed.can_transition_to(JobStage::Fetching));
    }

    #[test]
    fn test_fail_from_any_live_stage() {
        for stage in [
            JobStage::Created,
            JobStage::Fetching,
            JobStage::Processing,
            JobStage::Uploading,
        ] {
            assert!(stage.can_transition_to(JobStage::Failed));
        }

        let mut job = Job::new(JobMode::Split, vec![], "out", "");
        job.fail("boom");
        assert_eq!(job.stage, JobStage::Failed);
        assert_eq!(job.error_message.as_deref(), Some("boom"));
    }

    #[test]
    fn test_mode_serialization() {
        assert_eq!(serde_json::to_string(&JobMode::Concat).unwrap(), "\"concat\"");
        let mode: JobMode = serde_json::from_str("\"split\"").unwrap();
        assert_eq!(mode, JobMode::Split);
    }
}
