//! Video encoding profiles.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Default video codec (H.264)
pub const DEFAULT_VIDEO_CODEC: &str = "libx264";
/// Default audio codec
pub const DEFAULT_AUDIO_CODEC: &str = "aac";

/// Segment cuts favour speed: the pieces are working copies.
pub const SEGMENT_PRESET: &str = "ultrafast";
pub const SEGMENT_CRF: u8 = 28;

/// Concat re-encode produces the final deliverable.
pub const CONCAT_PRESET: &str = "veryfast";
pub const CONCAT_CRF: u8 = 23;
pub const CONCAT_AUDIO_BITRATE: &str = "160k";

/// Audio companion quality (`-q:a`, VBR scale, lower is better)
pub const AUDIO_EXTRACT_QUALITY: u8 = 2;

/// x264 presets a caller may pick.
pub const X264_PRESETS: &[&str] = &[
    "ultrafast",
    "superfast",
    "veryfast",
    "faster",
    "fast",
    "medium",
    "slow",
    "slower",
    "veryslow",
];

/// Fixed re-encoding profile handed to FFmpeg.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct EncodingProfile {
    /// Video codec (e.g., "libx264")
    pub codec: String,

    /// Encoding preset (e.g., "ultrafast", "veryfast")
    pub preset: String,

    /// Constant Rate Factor (quality, 0-51, lower is better)
    pub crf: u8,

    /// Audio codec
    pub audio_codec: String,

    /// Audio bitrate, encoder default when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_bitrate: Option<String>,

    /// Additional FFmpeg output arguments owned by the profile
    #[serde(default)]
    pub extra_args: Vec<String>,
}

impl EncodingProfile {
    /// Profile used for every split segment.
    ///
    /// Output timestamps are normalised to start at zero because the seek
    /// happens before the input.
    pub fn segment() -> Self {
        Self {
            codec: DEFAULT_VIDEO_CODEC.to_string(),
            preset: SEGMENT_PRESET.to_string(),
            crf: SEGMENT_CRF,
            audio_codec: DEFAULT_AUDIO_CODEC.to_string(),
            audio_bitrate: None,
            extra_args: vec![
                "-avoid_negative_ts".to_string(),
                "make_zero".to_string(),
                "-fflags".to_string(),
                "+genpts".to_string(),
            ],
        }
    }

    /// Profile used when concatenation re-encodes its inputs.
    pub fn concat_reencode() -> Self {
        Self {
            codec: DEFAULT_VIDEO_CODEC.to_string(),
            preset: CONCAT_PRESET.to_string(),
            crf: CONCAT_CRF,
            audio_codec: DEFAULT_AUDIO_CODEC.to_string(),
            audio_bitrate: Some(CONCAT_AUDIO_BITRATE.to_string()),
            extra_args: Vec::new(),
        }
    }

    /// Returns a new profile with caller overrides applied.
    pub fn with_override(mut self, overrides: Option<&EncodingOverride>) -> Self {
        if let Some(o) = overrides {
            if let Some(preset) = &o.preset {
                self.preset = preset.clone();
            }
            if let Some(crf) = o.crf {
                self.crf = crf;
            }
            if let Some(bitrate) = &o.audio_bitrate {
                self.audio_bitrate = Some(bitrate.clone());
            }
        }
        self
    }

    /// Convert to FFmpeg output arguments.
    pub fn to_ffmpeg_args(&self) -> Vec<String> {
        let mut args = vec![
            "-c:v".to_string(),
            self.codec.clone(),
            "-preset".to_string(),
            self.preset.clone(),
            "-crf".to_string(),
            self.crf.to_string(),
            "-c:a".to_string(),
            self.audio_codec.clone(),
        ];

        if let Some(bitrate) = &self.audio_bitrate {
            args.push("-b:a".to_string());
            args.push(bitrate.clone());
        }

        args.extend(self.extra_args.clone());

        args
    }
}

/// Quality knobs a caller may adjust.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema, Validate)]
pub struct EncodingOverride {
    /// x264 preset name
    #[serde(default)]
    pub preset: Option<String>,

    /// Constant Rate Factor
    #[serde(default)]
    #[validate(range(min = 0, max = 51))]
    pub crf: Option<u8>,

    /// Audio bitrate such as `128k`
    #[serde(default)]
    #[validate(length(min = 2, max = 8))]
    pub audio_bitrate: Option<String>,
}

impl EncodingOverride {
    /// Full check: derived range rules plus preset and bitrate syntax.
    pub fn check(&self) -> Result<(), String> {
        self.validate().map_err(|e| e.to_string())?;

        if let Some(preset) = &self.preset {
            if !X264_PRESETS.contains(&preset.as_str()) {
                return Err(format!("unknown preset '{}'", preset));
            }
        }

        if let Some(bitrate) = &self.audio_bitrate {
            let digits = bitrate.strip_suffix('k').unwrap_or_default();
            if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
                return Err(format!("audio bitrate '{}' must look like 160k", bitrate));
            }
        }

        Ok(())
    }
}
