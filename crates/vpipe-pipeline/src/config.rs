//! Pipeline configuration.

use std::path::PathBuf;
use std::time::Duration;

use vpipe_media::{ConcatOptions, FetchConfig, SegmentOptions, ToolPaths};
use vpipe_models::{EncodingProfile, JobRequest, DEFAULT_SEGMENT_SECONDS};

/// Pipeline configuration.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Parent directory for per-job workspaces
    pub work_dir: PathBuf,
    /// Segment length for split jobs
    pub segment_seconds: u32,
    /// Budget for one source download
    pub fetch_timeout: Duration,
    /// Connect budget for one source download
    pub fetch_connect_timeout: Duration,
    /// Smaller downloads are rejected
    pub min_source_bytes: u64,
    /// Budget for cutting one segment
    pub segment_timeout: Duration,
    /// Budget for one audio extraction
    pub audio_timeout: Duration,
    /// Budget for the concatenation
    pub concat_timeout: Duration,
    /// Budget for the duration probe
    pub probe_timeout: Duration,
    /// FFmpeg and FFprobe binaries
    pub tools: ToolPaths,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            work_dir: std::env::temp_dir(),
            segment_seconds: DEFAULT_SEGMENT_SECONDS,
            fetch_timeout: Duration::from_secs(600),
            fetch_connect_timeout: Duration::from_secs(30),
            min_source_bytes: 10 * 1024,
            segment_timeout: Duration::from_secs(900),
            audio_timeout: Duration::from_secs(300),
            concat_timeout: Duration::from_secs(3600),
            probe_timeout: Duration::from_secs(60),
            tools: ToolPaths::default(),
        }
    }
}

fn env_secs(key: &str, default: u64) -> Duration {
    Duration::from_secs(
        std::env::var(key)
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(default),
    )
}

impl PipelineConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            work_dir: std::env::var("PIPELINE_WORK_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.work_dir),
            segment_seconds: std::env::var("SEGMENT_SECONDS")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|&s: &u32| s > 0)
                .unwrap_or(DEFAULT_SEGMENT_SECONDS),
            fetch_timeout: env_secs("FETCH_TIMEOUT_SECS", 600),
            fetch_connect_timeout: env_secs("FETCH_CONNECT_TIMEOUT_SECS", 30),
            min_source_bytes: std::env::var("MIN_SOURCE_BYTES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.min_source_bytes),
            segment_timeout: env_secs("SEGMENT_TIMEOUT_SECS", 900),
            audio_timeout: env_secs("AUDIO_TIMEOUT_SECS", 300),
            concat_timeout: env_secs("CONCAT_TIMEOUT_SECS", 3600),
            probe_timeout: env_secs("PROBE_TIMEOUT_SECS", 60),
            tools: ToolPaths {
                ffmpeg: std::env::var("FFMPEG_BIN").unwrap_or(defaults.tools.ffmpeg),
                ffprobe: std::env::var("FFPROBE_BIN").unwrap_or(defaults.tools.ffprobe),
            },
        }
    }

    pub fn fetch_config(&self) -> FetchConfig {
        FetchConfig {
            timeout: self.fetch_timeout,
            connect_timeout: self.fetch_connect_timeout,
            min_bytes: self.min_source_bytes,
            ..Default::default()
        }
    }

    /// Segmentation options with the request's overrides applied.
    pub fn segment_options(&self, request: &JobRequest) -> SegmentOptions {
        SegmentOptions {
            segment_seconds: f64::from(request.segment_seconds.unwrap_or(self.segment_seconds)),
            extract_audio: request.extract_audio(),
            profile: EncodingProfile::segment().with_override(request.encoding.as_ref()),
            segment_timeout: self.segment_timeout,
            audio_timeout: self.audio_timeout,
            probe_timeout: self.probe_timeout,
        }
    }

    /// Concatenation options with the request's overrides applied.
    pub fn concat_options(&self, request: &JobRequest) -> ConcatOptions {
        ConcatOptions {
            reencode: request.reencode(),
            profile: EncodingProfile::concat_reencode().with_override(request.encoding.as_ref()),
            timeout: self.concat_timeout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vpipe_models::{EncodingOverride, JobMode};

    #[test]
    fn test_request_overrides() {
        let config = PipelineConfig::default();
        let mut request = JobRequest::new(JobMode::Split, vec!["https://a.example.com/x.mp4".into()]);
        request.segment_seconds = Some(120);
        request.extract_audio = Some(false);
        request.encoding = Some(EncodingOverride {
            crf: Some(20),
            ..Default::default()
        });

        let options = config.segment_options(&request);
        assert_eq!(options.segment_seconds, 120.0);
        assert!(!options.extract_audio);
        assert_eq!(options.profile.crf, 20);
        assert_eq!(options.profile.preset, "ultrafast");
    }

    #[test]
    fn test_defaults_follow_config() {
        let config = PipelineConfig {
            segment_seconds: 300,
            ..Default::default()
        };
        let request = JobRequest::new(JobMode::Concat, vec!["https://a.example.com/x.mp4".into()]);
        assert_eq!(config.segment_options(&request).segment_seconds, 300.0);

        let concat = config.concat_options(&request);
        assert!(concat.reencode);
        assert_eq!(concat.timeout, Duration::from_secs(3600));
    }
}
