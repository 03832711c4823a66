//! Pipeline error types.

use thiserror::Error;
use vpipe_media::MediaError;
use vpipe_models::{ErrorKind, JobId, JobStage, RequestError, StageTransitionError};
use vpipe_storage::StorageError;

pub type PipelineResult<T> = Result<T, PipelineError>;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("{0}")]
    InvalidRequest(#[from] RequestError),

    #[error(transparent)]
    Media(#[from] MediaError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("processing produced no artifacts: {0}")]
    EmptyResult(String),

    #[error("upload requested but no object store is configured")]
    StoreNotConfigured,

    #[error("workspace error: {0}")]
    Workspace(String),

    #[error(transparent)]
    Stage(#[from] StageTransitionError),
}

impl PipelineError {
    pub fn empty_result(msg: impl Into<String>) -> Self {
        Self::EmptyResult(msg.into())
    }

    pub fn workspace(msg: impl Into<String>) -> Self {
        Self::Workspace(msg.into())
    }

    /// Caller-facing failure kind.
    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::InvalidRequest(_) => ErrorKind::InvalidRequest,
            PipelineError::Media(e) => e.kind(),
            PipelineError::Storage(e) => e.kind(),
            PipelineError::EmptyResult(_) => ErrorKind::EmptyResult,
            PipelineError::StoreNotConfigured
            | PipelineError::Workspace(_)
            | PipelineError::Stage(_) => ErrorKind::Internal,
        }
    }
}

/// A job that did not reach `Done`.
#[derive(Debug, Error)]
#[error("{error}")]
pub struct JobFailure {
    /// Absent when the request was refused before a job existed
    pub job_id: Option<JobId>,
    /// Stage the job was in when it failed
    pub stage: JobStage,
    #[source]
    pub error: PipelineError,
}

impl JobFailure {
    pub fn kind(&self) -> ErrorKind {
        self.error.kind()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_passes_through() {
        let err: PipelineError = MediaError::timeout("ffmpeg", 900).into();
        assert_eq!(err.kind(), ErrorKind::Timeout);

        let err: PipelineError = StorageError::upload_failed("403").into();
        assert_eq!(err.kind(), ErrorKind::UploadError);

        let err: PipelineError = RequestError::MissingSources.into();
        assert_eq!(err.kind(), ErrorKind::InvalidRequest);
        assert_eq!(err.to_string(), "sources (array) required");

        assert_eq!(
            PipelineError::empty_result("split").kind(),
            ErrorKind::EmptyResult
        );
    }
}
