//! Machine-distinguishable failure kinds reported to callers.

use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Missing or malformed job parameters; no job was started
    InvalidRequest,
    /// Fetched payload failed content, size or type checks
    InvalidContent,
    /// Remote source answered with an error status or was unreachable
    FetchFailed,
    /// A stage exceeded its time budget
    Timeout,
    /// Source duration could not be determined
    ProbeError,
    /// External tool exited non-zero
    ToolError,
    /// Processing produced no artifacts
    EmptyResult,
    /// Object store rejected a write or a signing request
    UploadError,
    /// Anything unanticipated
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidRequest => "invalid_request",
            ErrorKind::InvalidContent => "invalid_content",
            ErrorKind::FetchFailed => "fetch_failed",
            ErrorKind::Timeout => "timeout",
            ErrorKind::ProbeError => "probe_error",
            ErrorKind::ToolError => "tool_error",
            ErrorKind::EmptyResult => "empty_result",
            ErrorKind::UploadError => "upload_error",
            ErrorKind::Internal => "internal",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
