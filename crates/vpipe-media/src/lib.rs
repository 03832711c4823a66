#![deny(unreachable_patterns)]
//! FFmpeg CLI wrapper and media stages.
//!
//! This crate provides:
//! - Type-safe FFmpeg command building
//! - A bounded subprocess runner behind the [`CommandRunner`] seam
//! - Duration probing through ffprobe
//! - Streaming fetch of remote sources with content validation
//! - The segmentation and concatenation engines

pub mod command;
pub mod concat;
pub mod error;
pub mod fetch;
pub mod probe;
pub mod segment;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;

pub use command::{
    check_ffmpeg, check_ffprobe, CommandOutput, CommandRunner, FfmpegCommand, Invocation,
    ProcessRunner, ToolPaths, MAX_STDERR_CHARS,
};
pub use concat::{ConcatEngine, ConcatOptions};
pub use error::{MediaError, MediaResult};
pub use fetch::{sniff_container, FetchConfig, Fetcher, StorageProvider};
pub use probe::probe_duration;
pub use segment::{SegmentOptions, SegmentationEngine, OUTPUT_DIR};
