//! Inbound job parameters and their validation.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;
use validator::Validate;

use crate::utils::{default_output_name, ensure_extension, file_stem, safe_name};
use crate::{EncodingOverride, JobMode};

/// Base name used for split artifacts when nothing better is known.
const DEFAULT_SPLIT_BASE: &str = "video";

/// Why a request was refused before any job started.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    #[error("sources (array) required")]
    MissingSources,

    #[error("invalid URL in sources[{index}]: {url}")]
    InvalidUrl { index: usize, url: String },

    #[error("split mode takes exactly one source, got {0}")]
    SplitNeedsOneSource(usize),

    #[error("segment_seconds must be positive")]
    InvalidSegmentLength,

    #[error("invalid encoding: {0}")]
    InvalidEncoding(String),
}

/// Parameters for one pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Validate)]
pub struct JobRequest {
    /// Source URLs in timeline order
    pub sources: Vec<String>,

    /// Split or concat
    pub mode: JobMode,

    /// Output name (concat) or base name (split)
    #[serde(default)]
    pub output: Option<String>,

    /// Re-encode on concat (default true)
    #[serde(default)]
    pub reencode: Option<bool>,

    /// Upload artifacts (default true)
    #[serde(default)]
    pub upload: Option<bool>,

    /// Destination prefix inside the bucket
    #[serde(default)]
    pub dest_prefix: Option<String>,

    /// Segment length override in seconds (split only)
    #[serde(default)]
    #[validate(range(min = 1))]
    pub segment_seconds: Option<u32>,

    /// Produce an audio-only companion per segment (default true)
    #[serde(default)]
    pub extract_audio: Option<bool>,

    /// Quality overrides
    #[serde(default)]
    pub encoding: Option<EncodingOverride>,
}

impl JobRequest {
    pub fn new(mode: JobMode, sources: Vec<String>) -> Self {
        Self {
            sources,
            mode,
            output: None,
            reencode: None,
            upload: None,
            dest_prefix: None,
            segment_seconds: None,
            extract_audio: None,
            encoding: None,
        }
    }

    /// Check every parameter; the first problem wins.
    pub fn check(&self) -> Result<(), RequestError> {
        if self.sources.is_empty() {
            return Err(RequestError::MissingSources);
        }

        for (index, raw) in self.sources.iter().enumerate() {
            if !is_fetchable_url(raw) {
                return Err(RequestError::InvalidUrl {
                    index,
                    url: raw.clone(),
                });
            }
        }

        if self.mode == JobMode::Split && self.sources.len() != 1 {
            return Err(RequestError::SplitNeedsOneSource(self.sources.len()));
        }

        if self.validate().is_err() {
            return Err(RequestError::InvalidSegmentLength);
        }

        if let Some(encoding) = &self.encoding {
            encoding.check().map_err(RequestError::InvalidEncoding)?;
        }

        Ok(())
    }

    pub fn reencode(&self) -> bool {
        self.reencode.unwrap_or(true)
    }

    pub fn upload(&self) -> bool {
        self.upload.unwrap_or(true)
    }

    pub fn extract_audio(&self) -> bool {
        self.extract_audio.unwrap_or(true)
    }

    /// Sanitised output naming for this request.
    ///
    /// Concat: the merged file name, `.mp4` appended when missing.
    /// Split: the base name artifacts are numbered from.
    pub fn resolved_output_name(&self) -> String {
        match self.mode {
            JobMode::Concat => {
                let raw = self.output.clone().unwrap_or_else(default_output_name);
                ensure_extension(&safe_name(&raw), "mp4")
            }
            JobMode::Split => {
                let raw = self
                    .output
                    .clone()
                    .or_else(|| self.sources.first().and_then(|u| url_file_stem(u)))
                    .unwrap_or_else(|| DEFAULT_SPLIT_BASE.to_string());
                safe_name(file_stem(&raw))
            }
        }
    }
}

fn is_fetchable_url(raw: &str) -> bool {
    if !raw.starts_with("http") {
        return false;
    }
    match Url::parse(raw) {
        Ok(url) => matches!(url.scheme(), "http" | "https") && url.host_str().is_some(),
        Err(_) => false,
    }
}

fn url_file_stem(raw: &str) -> Option<String> {
    let url = Url::parse(raw).ok()?;
    let last = url.path_segments()?.filter(|s| !s.is_empty()).last()?;
    let stem = file_stem(last);
    if stem.is_empty() {
        None
    } else {
        Some(stem.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn concat(sources: &[&str]) -> JobRequest {
        JobRequest::new(
            JobMode::Concat,
            sources.iter().map(|s| s.to_string()).collect(),
        )
    }

    #[test]
    fn test_valid_concat_request() {
        let req = concat(&["https://cdn.example.com/a.mp4", "http://cdn.example.com/b.mp4"]);
        assert!(req.check().is_ok());
        assert!(req.reencode());
        assert!(req.upload());
    }

    #[test]
    fn test_empty_sources_rejected() {
        assert_eq!(concat(&[]).check(), Err(RequestError::MissingSources));
    }

    #[test]
    fn test_invalid_url_names_index() {
        let req = concat(&["https://ok.example.com/a.mp4", "ftp://nope/b.mp4"]);
        assert_eq!(
            req.check(),
            Err(RequestError::InvalidUrl {
                index: 1,
                url: "ftp://nope/b.mp4".to_string()
            })
        );
        assert!(concat(&["httpx"]).check().is_err());
        assert!(concat(&["http://"]).check().is_err());
    }

    #[test]
    fn test_split_takes_one_source() {
        let mut req = concat(&["https://a.example.com/1.mp4", "https://a.example.com/2.mp4"]);
        req.mode = JobMode::Split;
        assert_eq!(req.check(), Err(RequestError::SplitNeedsOneSource(2)));
    }

    #[test]
    fn test_zero_segment_length_rejected() {
        let mut req = JobRequest::new(JobMode::Split, vec!["https://a.example.com/1.mp4".into()]);
        req.segment_seconds = Some(0);
        assert_eq!(req.check(), Err(RequestError::InvalidSegmentLength));
        req.segment_seconds = Some(300);
        assert!(req.check().is_ok());
    }

    #[test]
    fn test_bad_encoding_rejected() {
        let mut req = concat(&["https://a.example.com/1.mp4"]);
        req.encoding = Some(EncodingOverride {
            preset: Some("lightspeed".into()),
            ..Default::default()
        });
        assert!(matches!(req.check(), Err(RequestError::InvalidEncoding(_))));
    }

    #[test]
    fn test_concat_output_naming() {
        let mut req = concat(&["https://a.example.com/1.mp4"]);
        req.output = Some("my final cut".into());
        assert_eq!(req.resolved_output_name(), "myfinalcut.mp4");

        req.output = None;
        assert!(req.resolved_output_name().starts_with("final_"));
    }

    #[test]
    fn test_split_base_name() {
        let mut req = JobRequest::new(
            JobMode::Split,
            vec!["https://x.example.com/media/Live%20Talk.mp4?token=1".into()],
        );
        assert_eq!(req.resolved_output_name(), "Live20Talk");

        req.output = Some("episode-7.mp4".into());
        assert_eq!(req.resolved_output_name(), "episode-7");

        let bare = JobRequest::new(JobMode::Split, vec!["https://x.example.com/".into()]);
        assert_eq!(bare.resolved_output_name(), "video");
    }

    #[test]
    fn test_request_deserialization_defaults() {
        let req: JobRequest = serde_json::from_str(
            r#"{"sources":["https://a.example.com/x.mp4"],"mode":"split"}"#,
        )
        .unwrap();
        assert!(req.extract_audio());
        assert!(req.upload());
        assert!(req.segment_seconds.is_none());
    }
}
