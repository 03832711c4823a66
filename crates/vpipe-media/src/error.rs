//! Error types for media operations.

use thiserror::Error;
use vpipe_models::ErrorKind;

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors that can occur during fetching and media processing.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("{0} not found in PATH")]
    ToolNotFound(String),

    #[error("{program} exited with status {}: {stderr}", exit_code.map(|c| c.to_string()).unwrap_or_else(|| "signal".into()))]
    ToolFailed {
        program: String,
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("{what} timed out after {secs} seconds")]
    Timeout { what: String, secs: u64 },

    #[error("could not determine duration: {0}")]
    ProbeFailed(String),

    #[error("invalid content: {0}")]
    InvalidContent(String),

    #[error("fetch failed: {0}")]
    FetchFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl MediaError {
    /// Create a tool failure error; stderr is truncated to [`MAX_STDERR_CHARS`].
    ///
    /// [`MAX_STDERR_CHARS`]: crate::command::MAX_STDERR_CHARS
    pub fn tool_failed(program: impl Into<String>, exit_code: Option<i32>, stderr: &str) -> Self {
        Self::ToolFailed {
            program: program.into(),
            exit_code,
            stderr: truncate_tail(stderr.trim(), crate::command::MAX_STDERR_CHARS),
        }
    }

    pub fn timeout(what: impl Into<String>, secs: u64) -> Self {
        Self::Timeout {
            what: what.into(),
            secs,
        }
    }

    pub fn probe_failed(message: impl Into<String>) -> Self {
        Self::ProbeFailed(message.into())
    }

    pub fn invalid_content(message: impl Into<String>) -> Self {
        Self::InvalidContent(message.into())
    }

    pub fn fetch_failed(message: impl Into<String>) -> Self {
        Self::FetchFailed(message.into())
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Caller-facing failure kind.
    pub fn kind(&self) -> ErrorKind {
        match self {
            MediaError::ToolNotFound(_) => ErrorKind::Internal,
            MediaError::ToolFailed { .. } => ErrorKind::ToolError,
            MediaError::Timeout { .. } => ErrorKind::Timeout,
            MediaError::ProbeFailed(_) => ErrorKind::ProbeError,
            MediaError::InvalidContent(_) => ErrorKind::InvalidContent,
            MediaError::FetchFailed(_) => ErrorKind::FetchFailed,
            MediaError::Io(_) | MediaError::Internal(_) => ErrorKind::Internal,
        }
    }
}

/// Keep the last `max` characters: ffmpeg reports the fatal line last.
fn truncate_tail(s: &str, max: usize) -> String {
    let count = s.chars().count();
    if count <= max {
        s.to_string()
    } else {
        s.chars().skip(count - max).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stderr_truncation_keeps_tail() {
        let long = format!("{}FATAL", "x".repeat(5000));
        let err = MediaError::tool_failed("ffmpeg", Some(1), &long);
        match err {
            MediaError::ToolFailed { stderr, .. } => {
                assert_eq!(stderr.chars().count(), crate::command::MAX_STDERR_CHARS);
                assert!(stderr.ends_with("FATAL"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_kinds() {
        assert_eq!(MediaError::tool_failed("ffmpeg", Some(1), "").kind(), ErrorKind::ToolError);
        assert_eq!(MediaError::timeout("ffmpeg", 5).kind(), ErrorKind::Timeout);
        assert_eq!(MediaError::probe_failed("N/A").kind(), ErrorKind::ProbeError);
        assert_eq!(MediaError::ToolNotFound("ffmpeg".into()).kind(), ErrorKind::Internal);
        assert_eq!(MediaError::fetch_failed("404").kind(), ErrorKind::FetchFailed);
    }

    #[test]
    fn test_tool_failed_display() {
        let err = MediaError::tool_failed("ffmpeg", None, "killed");
        assert_eq!(err.to_string(), "ffmpeg exited with status signal: killed");
    }
}
