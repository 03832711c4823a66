//! Validated remote inputs.

use std::path::PathBuf;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Accepted content-type families for a fetched source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ContentFamily {
    /// `video/*`
    Video,
    /// `application/octet-stream` (or no declared type)
    OctetStream,
}

impl ContentFamily {
    /// Classify a `Content-Type` header value. `None` means not acceptable.
    ///
    /// A missing header counts as `application/octet-stream`.
    pub fn classify(content_type: Option<&str>) -> Option<Self> {
        let Some(raw) = content_type else {
            return Some(ContentFamily::OctetStream);
        };
        let essence = raw
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        if essence.starts_with("video/") {
            Some(ContentFamily::Video)
        } else if essence == "application/octet-stream" || essence.is_empty() {
            Some(ContentFamily::OctetStream)
        } else {
            None
        }
    }
}

/// What the first bytes of a fetched file look like.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ContainerHint {
    /// ISO-BMFF (`ftyp` box near the start): mp4, mov, m4v, 3gp
    Mp4,
    /// EBML header: mkv, webm
    Matroska,
    /// No known marker in the sampled prefix
    Unknown,
}

/// A remote reference that has been fetched and checked.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SourceDescriptor {
    /// Remote URL that was actually fetched (may carry a provider hint)
    pub url: String,
    /// Content family reported by the server
    pub family: ContentFamily,
    /// Local file inside the job workspace
    pub local_path: PathBuf,
    /// Size on disk in bytes
    pub size_bytes: u64,
    /// Sniffed container
    pub container: ContainerHint,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_content_types() {
        assert_eq!(
            ContentFamily::classify(Some("video/mp4")),
            Some(ContentFamily::Video)
        );
        assert_eq!(
            ContentFamily::classify(Some("Video/QuickTime; charset=binary")),
            Some(ContentFamily::Video)
        );
        assert_eq!(
            ContentFamily::classify(Some("application/octet-stream")),
            Some(ContentFamily::OctetStream)
        );
        assert_eq!(ContentFamily::classify(None), Some(ContentFamily::OctetStream));
        assert_eq!(ContentFamily::classify(Some("text/html; charset=utf-8")), None);
        assert_eq!(ContentFamily::classify(Some("application/json")), None);
    }
}
