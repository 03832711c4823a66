//! Produced files and their upload results.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Logical kind of a produced file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Video,
    Audio,
}

impl ArtifactKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactKind::Video => "video",
            ArtifactKind::Audio => "audio",
        }
    }

    /// MIME type sent to the object store.
    pub fn content_type(&self) -> &'static str {
        match self {
            ArtifactKind::Video => "video/mp4",
            ArtifactKind::Audio => "audio/mpeg",
        }
    }

    /// File extension (without the dot).
    pub fn extension(&self) -> &'static str {
        match self {
            ArtifactKind::Video => "mp4",
            ArtifactKind::Audio => "mp3",
        }
    }
}

/// One produced file ready for upload.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Artifact {
    /// 1-based sequence index, stable across video/audio pairs
    pub index: u32,
    /// Video or audio
    pub kind: ArtifactKind,
    /// File name (also the last component of the destination key)
    pub name: String,
    /// Local path inside the job workspace
    #[serde(skip)]
    pub path: PathBuf,
    /// Size on disk in bytes
    pub size_bytes: u64,
    /// Covered source duration (segments only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_secs: Option<f64>,
    /// Object store path (relative to the bucket)
    pub destination: String,
}

impl Artifact {
    pub fn new(
        index: u32,
        kind: ArtifactKind,
        path: impl Into<PathBuf>,
        size_bytes: u64,
        destination: impl Into<String>,
    ) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        Self {
            index,
            kind,
            name,
            path,
            size_bytes,
            duration_secs: None,
            destination: destination.into(),
        }
    }

    pub fn with_duration(mut self, secs: f64) -> Self {
        self.duration_secs = Some(secs);
        self
    }
}

/// How an uploaded object can be accessed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "access", rename_all = "snake_case")]
pub enum AccessUrl {
    /// Deterministic URL of an object in a public bucket
    Public { url: String },
    /// Time-limited URL of an object in a private bucket
    Signed {
        url: String,
        expires_at: DateTime<Utc>,
    },
}

impl AccessUrl {
    pub fn url(&self) -> &str {
        match self {
            AccessUrl::Public { url } | AccessUrl::Signed { url, .. } => url,
        }
    }

    pub fn is_signed(&self) -> bool {
        matches!(self, AccessUrl::Signed { .. })
    }
}

/// Result of uploading one artifact. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct UploadResult {
    /// `<bucket>/<path>`
    pub key: String,
    /// Access URL
    #[serde(flatten)]
    pub access: AccessUrl,
}
