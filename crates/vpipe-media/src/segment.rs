//! Segmentation engine: cut one source into fixed-length, independently
//! playable pieces, each optionally paired with an audio-only companion.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};
use vpipe_models::encoding::AUDIO_EXTRACT_QUALITY;
use vpipe_models::{
    destination_path, Artifact, ArtifactKind, EncodingProfile, SegmentPlan, SegmentSpan,
    DEFAULT_SEGMENT_SECONDS,
};

use crate::command::{CommandRunner, FfmpegCommand, ToolPaths};
use crate::error::{MediaError, MediaResult};
use crate::probe::probe_duration;

#[derive(Debug, Clone)]
pub struct SegmentOptions {
    pub segment_seconds: f64,
    pub extract_audio: bool,
    pub profile: EncodingProfile,
    pub segment_timeout: Duration,
    pub audio_timeout: Duration,
    pub probe_timeout: Duration,
}

impl Default for SegmentOptions {
    fn default() -> Self {
        Self {
            segment_seconds: f64::from(DEFAULT_SEGMENT_SECONDS),
            extract_audio: true,
            profile: EncodingProfile::segment(),
            segment_timeout: Duration::from_secs(900),
            audio_timeout: Duration::from_secs(300),
            probe_timeout: Duration::from_secs(60),
        }
    }
}

pub struct SegmentationEngine {
    runner: Arc<dyn CommandRunner>,
    tools: ToolPaths,
    options: SegmentOptions,
}

impl SegmentationEngine {
    pub fn new(runner: Arc<dyn CommandRunner>, tools: ToolPaths, options: SegmentOptions) -> Self {
        Self {
            runner,
            tools,
            options,
        }
    }

    /// Split `source` into artifacts written under `work_dir/out/`.
    ///
    /// Artifacts are ordered by segment index, each video followed by its
    /// audio companion. Names are `<base>_clip<N>.mp4` / `.mp3`, N from 1.
    pub async fn run(
        &self,
        source: &Path,
        work_dir: &Path,
        base: &str,
        dest_prefix: &str,
    ) -> MediaResult<Vec<Artifact>> {
        let out_dir = output_dir(work_dir).await?;
        let out_dir = out_dir.as_path();
        let duration = probe_duration(
            self.runner.as_ref(),
            &self.tools,
            source,
            self.options.probe_timeout,
        )
        .await?;

        let plan = SegmentPlan::new(duration, self.options.segment_seconds)
            .map_err(|e| MediaError::probe_failed(e.to_string()))?;

        info!(
            duration,
            segment_seconds = self.options.segment_seconds,
            segments = plan.len(),
            "Planned segments"
        );

        let mut artifacts = Vec::with_capacity(plan.len() * 2);
        for span in plan.iter() {
            let video = self.cut_segment(source, out_dir, base, dest_prefix, span).await?;
            let audio = if self.options.extract_audio {
                Some(self.extract_audio(&video, out_dir, base, dest_prefix, span).await?)
            } else {
                None
            };
            artifacts.push(video);
            artifacts.extend(audio);
        }

        Ok(artifacts)
    }

    async fn cut_segment(
        &self,
        source: &Path,
        out_dir: &Path,
        base: &str,
        dest_prefix: &str,
        span: &SegmentSpan,
    ) -> MediaResult<Artifact> {
        let name = format!("{}_clip{}.{}", base, span.number(), ArtifactKind::Video.extension());
        let output = out_dir.join(&name);

        let invocation = FfmpegCommand::new(source, &output)
            .seek(span.start)
            .duration(span.length)
            .output_args(self.options.profile.to_ffmpeg_args())
            .into_invocation(&self.tools.ffmpeg, self.options.segment_timeout);

        debug!(segment = span.number(), start = span.start, length = span.length, "Cutting segment");
        self.runner.run(&invocation).await?;

        let size = output_size(&output).await?;
        Ok(Artifact::new(
            span.number(),
            ArtifactKind::Video,
            output,
            size,
            destination_path(dest_prefix, &name),
        )
        .with_duration(span.length))
    }

    async fn extract_audio(
        &self,
        video: &Artifact,
        out_dir: &Path,
        base: &str,
        dest_prefix: &str,
        span: &SegmentSpan,
    ) -> MediaResult<Artifact> {
        let name = format!("{}_clip{}.{}", base, span.number(), ArtifactKind::Audio.extension());
        let output = out_dir.join(&name);

        let invocation = FfmpegCommand::new(&video.path, &output)
            .audio_quality(AUDIO_EXTRACT_QUALITY)
            .audio_only()
            .into_invocation(&self.tools.ffmpeg, self.options.audio_timeout);

        self.runner.run(&invocation).await?;

        let size = output_size(&output).await?;
        Ok(Artifact::new(
            span.number(),
            ArtifactKind::Audio,
            output,
            size,
            destination_path(dest_prefix, &name),
        )
        .with_duration(span.length))
    }
}

/// Subdirectory of a job workspace that holds engine outputs.
pub const OUTPUT_DIR: &str = "out";

/// Create `work_dir/out`; caller-chosen names never reach the fetched inputs.
pub(crate) async fn output_dir(work_dir: &Path) -> MediaResult<PathBuf> {
    let dir = work_dir.join(OUTPUT_DIR);
    tokio::fs::create_dir_all(&dir).await?;
    Ok(dir)
}

/// Size of a file the tool claimed to have written.
pub(crate) async fn output_size(path: &Path) -> MediaResult<u64> {
    match tokio::fs::metadata(path).await {
        Ok(meta) => Ok(meta.len()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(MediaError::internal(format!(
            "ffmpeg reported success but wrote no {}",
            path.display()
        ))),
        Err(e) => Err(e.into()),
    }
}
