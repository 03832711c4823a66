//! Concatenation engine: join ordered inputs into one video.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};
use vpipe_models::{destination_path, Artifact, ArtifactKind, EncodingProfile};

use crate::command::{CommandRunner, FfmpegCommand, ToolPaths};
use crate::error::{MediaError, MediaResult};
use crate::segment::{output_dir, output_size};

/// Playlist file written next to the inputs, outside the output directory.
const PLAYLIST_NAME: &str = "inputs.txt";

#[derive(Debug, Clone)]
pub struct ConcatOptions {
    /// Re-encode with `profile`; otherwise copy streams as-is
    pub reencode: bool,
    pub profile: EncodingProfile,
    pub timeout: Duration,
}

impl Default for ConcatOptions {
    fn default() -> Self {
        Self {
            reencode: true,
            profile: EncodingProfile::concat_reencode(),
            timeout: Duration::from_secs(3600),
        }
    }
}

pub struct ConcatEngine {
    runner: Arc<dyn CommandRunner>,
    tools: ToolPaths,
    options: ConcatOptions,
}

impl ConcatEngine {
    pub fn new(runner: Arc<dyn CommandRunner>, tools: ToolPaths, options: ConcatOptions) -> Self {
        Self {
            runner,
            tools,
            options,
        }
    }

    /// Join `inputs` in order into `work_dir/out/output_name` with one tool invocation.
    pub async fn run(
        &self,
        inputs: &[PathBuf],
        work_dir: &Path,
        output_name: &str,
        dest_prefix: &str,
    ) -> MediaResult<Artifact> {
        if inputs.is_empty() {
            return Err(MediaError::internal("concatenation needs at least one input"));
        }

        let playlist = work_dir.join(PLAYLIST_NAME);
        tokio::fs::write(&playlist, build_playlist(inputs)).await?;
        debug!(inputs = inputs.len(), playlist = %playlist.display(), "Wrote concat playlist");

        let output = output_dir(work_dir).await?.join(output_name);
        let cmd = FfmpegCommand::new(&playlist, &output).concat_demuxer();
        let cmd = if self.options.reencode {
            cmd.output_args(self.options.profile.to_ffmpeg_args())
        } else {
            cmd.codec_copy()
        };

        info!(
            inputs = inputs.len(),
            reencode = self.options.reencode,
            output = %output_name,
            "Concatenating"
        );
        self.runner
            .run(&cmd.into_invocation(&self.tools.ffmpeg, self.options.timeout))
            .await?;

        let size = output_size(&output).await?;
        Ok(Artifact::new(
            1,
            ArtifactKind::Video,
            output,
            size,
            destination_path(dest_prefix, output_name),
        ))
    }
}

/// ffconcat playlist, one `file '<path>'` line per input.
fn build_playlist(inputs: &[PathBuf]) -> String {
    inputs
        .iter()
        .map(|p| format!("file '{}'\n", escape_single_quoted(&p.to_string_lossy())))
        .collect()
}

/// Close the quote, emit an escaped quote, reopen.
fn escape_single_quoted(s: &str) -> String {
    s.replace('\'', r"'\''")
}
