//! Structured job logging utilities.
//!
//! Provides consistent, structured logging for job processing with
//! tracing spans and contextual information.

use tracing::{error, info, warn, Span};
use vpipe_models::{JobId, JobMode, JobStage};

/// Job logger for structured logging with consistent formatting.
///
/// Every line carries the job ID and the job mode.
#[derive(Debug, Clone)]
pub struct JobLogger {
    job_id: String,
    mode: JobMode,
}

impl JobLogger {
    pub fn new(job_id: &JobId, mode: JobMode) -> Self {
        Self {
            job_id: job_id.to_string(),
            mode,
        }
    }

    /// Log the start of a job.
    pub fn log_start(&self, sources: usize) {
        info!(
            job_id = %self.job_id,
            mode = %self.mode,
            sources,
            "Job started"
        );
    }

    /// Log a stage transition.
    pub fn log_stage(&self, stage: JobStage) {
        info!(
            job_id = %self.job_id,
            mode = %self.mode,
            stage = %stage,
            "Job stage"
        );
    }

    /// Log a progress update during job execution.
    pub fn log_progress(&self, message: &str) {
        info!(
            job_id = %self.job_id,
            mode = %self.mode,
            "Job progress: {}", message
        );
    }

    /// Log a warning during job execution.
    pub fn log_warning(&self, message: &str) {
        warn!(
            job_id = %self.job_id,
            mode = %self.mode,
            "Job warning: {}", message
        );
    }

    /// Log a job failure.
    pub fn log_error(&self, stage: JobStage, kind: &str, message: &str) {
        error!(
            job_id = %self.job_id,
            mode = %self.mode,
            stage = %stage,
            kind,
            "Job failed: {}", message
        );
    }

    /// Log the completion of a job.
    pub fn log_completion(&self, artifacts: usize, elapsed_ms: u64) {
        info!(
            job_id = %self.job_id,
            mode = %self.mode,
            artifacts,
            elapsed_ms,
            "Job completed"
        );
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    pub fn mode(&self) -> JobMode {
        self.mode
    }

    /// Create a tracing span for this job.
    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "job",
            job_id = %self.job_id,
            mode = %self.mode
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_logger_creation() {
        let job_id = JobId::new();
        let logger = JobLogger::new(&job_id, JobMode::Split);

        assert_eq!(logger.job_id(), job_id.to_string());
        assert_eq!(logger.mode(), JobMode::Split);
    }
}
