//! FFmpeg command builder and bounded subprocess runner.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::{MediaError, MediaResult};

/// Upper bound on the stderr text carried in a [`MediaError::ToolFailed`].
pub const MAX_STDERR_CHARS: usize = 2000;

/// Longest wait for pipe readers after the child exits.
const PIPE_DRAIN_GRACE: Duration = Duration::from_secs(5);

/// Names or paths of the external binaries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolPaths {
    pub ffmpeg: String,
    pub ffprobe: String,
}

impl Default for ToolPaths {
    fn default() -> Self {
        Self {
            ffmpeg: "ffmpeg".to_string(),
            ffprobe: "ffprobe".to_string(),
        }
    }
}

/// One external program invocation: argument vector plus a time budget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub timeout: Duration,
}

impl Invocation {
    pub fn new(program: impl Into<String>, args: Vec<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            args,
            timeout,
        }
    }

    /// Command line for logs.
    pub fn display(&self) -> String {
        format!("{} {}", self.program, self.args.join(" "))
    }
}

/// Captured result of a successful invocation.
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub elapsed: Duration,
}

/// Seam between the engines and the operating system.
///
/// `run` returns `Ok` only for a zero exit status. A non-zero exit is
/// [`MediaError::ToolFailed`]; an exhausted budget is [`MediaError::Timeout`]
/// and the process has been killed and reaped by the time it is returned.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, invocation: &Invocation) -> MediaResult<CommandOutput>;
}

/// Runs invocations as real child processes.
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner;

impl ProcessRunner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(&self, invocation: &Invocation) -> MediaResult<CommandOutput> {
        let program = which::which(&invocation.program)
            .map_err(|_| MediaError::ToolNotFound(invocation.program.clone()))?;

        debug!("Running: {}", invocation.display());
        let started = Instant::now();

        let mut child = Command::new(&program)
            .args(&invocation.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let mut stdout = child
            .stdout
            .take()
            .ok_or_else(|| MediaError::internal("stdout not captured"))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| MediaError::internal("stderr not captured"))?;

        // Drain both pipes while waiting so a chatty child cannot block on a full pipe.
        let stdout_task = tokio::spawn(async move {
            let mut buf = Vec::new();
            stdout.read_to_end(&mut buf).await.map(|_| buf)
        });
        let stderr_task = tokio::spawn(async move {
            let mut buf = Vec::new();
            stderr.read_to_end(&mut buf).await.map(|_| buf)
        });

        let status = match tokio::time::timeout(invocation.timeout, child.wait()).await {
            Ok(status) => status?,
            Err(_) => {
                let secs = invocation.timeout.as_secs();
                warn!(
                    program = %invocation.program,
                    timeout_secs = secs,
                    "Process timed out, killing"
                );
                // kill() also waits, so the child is reaped here
                if let Err(e) = child.kill().await {
                    warn!("Failed to kill {}: {}", invocation.program, e);
                }
                stdout_task.abort();
                stderr_task.abort();
                record_duration(&invocation.program, "timeout", started.elapsed());
                return Err(MediaError::timeout(invocation.program.clone(), secs));
            }
        };

        // A grandchild holding the pipes open must not outlive the budget.
        let grace = invocation
            .timeout
            .saturating_sub(started.elapsed())
            .min(PIPE_DRAIN_GRACE);
        let deadline = tokio::time::Instant::now() + grace;
        let stdout = join_pipe(stdout_task, deadline, &invocation.program).await?;
        let stderr = join_pipe(stderr_task, deadline, &invocation.program).await?;
        let elapsed = started.elapsed();

        if !status.success() {
            record_duration(&invocation.program, "failed", elapsed);
            return Err(MediaError::tool_failed(
                invocation.program.clone(),
                status.code(),
                &stderr,
            ));
        }

        record_duration(&invocation.program, "ok", elapsed);
        debug!(
            program = %invocation.program,
            elapsed_ms = elapsed.as_millis() as u64,
            "Process finished"
        );

        Ok(CommandOutput {
            stdout,
            stderr,
            elapsed,
        })
    }
}

async fn join_pipe(
    mut task: tokio::task::JoinHandle<std::io::Result<Vec<u8>>>,
    deadline: tokio::time::Instant,
    program: &str,
) -> MediaResult<String> {
    let bytes = match tokio::time::timeout_at(deadline, &mut task).await {
        Ok(joined) => {
            joined.map_err(|e| MediaError::internal(format!("pipe reader failed: {e}")))??
        }
        Err(_) => {
            task.abort();
            warn!(program = %program, "Output pipe still open after exit, dropping it");
            Vec::new()
        }
    };
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn record_duration(program: &str, outcome: &'static str, elapsed: Duration) {
    let program = Path::new(program)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| program.to_string());
    metrics::histogram!(
        "vpipe_tool_duration_seconds",
        "program" => program,
        "outcome" => outcome
    )
    .record(elapsed.as_secs_f64());
}

/// Builder for FFmpeg commands.
#[derive(Debug, Clone)]
pub struct FfmpegCommand {
    /// Input file path
    input: PathBuf,
    /// Output file path
    output: PathBuf,
    /// Input arguments (before -i)
    input_args: Vec<String>,
    /// Output arguments (after -i)
    output_args: Vec<String>,
    /// Whether to overwrite output
    overwrite: bool,
    /// Log level
    log_level: String,
}

impl FfmpegCommand {
    /// Create a new FFmpeg command.
    pub fn new(input: impl AsRef<Path>, output: impl AsRef<Path>) -> Self {
        Self {
            input: input.as_ref().to_path_buf(),
            output: output.as_ref().to_path_buf(),
            input_args: Vec::new(),
            output_args: Vec::new(),
            overwrite: true,
            log_level: "error".to_string(),
        }
    }

    /// Add input arguments (before -i).
    pub fn input_arg(mut self, arg: impl Into<String>) -> Self {
        self.input_args.push(arg.into());
        self
    }

    /// Add multiple input arguments.
    pub fn input_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.input_args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Add output arguments (after -i).
    pub fn output_arg(mut self, arg: impl Into<String>) -> Self {
        self.output_args.push(arg.into());
        self
    }

    /// Add multiple output arguments.
    pub fn output_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.output_args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Input-side seek: fast, lands on the keyframe before `seconds`.
    pub fn seek(self, seconds: f64) -> Self {
        self.input_arg("-ss").input_arg(format!("{:.3}", seconds))
    }

    /// Output duration limit.
    pub fn duration(self, seconds: f64) -> Self {
        self.output_arg("-t").output_arg(format!("{:.3}", seconds))
    }

    /// Read the input as an ffconcat playlist.
    pub fn concat_demuxer(self) -> Self {
        self.input_args(["-f", "concat", "-safe", "0"])
    }

    /// Copy every stream without re-encoding.
    pub fn codec_copy(self) -> Self {
        self.output_arg("-c").output_arg("copy")
    }

    /// Keep only the audio streams.
    pub fn audio_only(self) -> Self {
        self.output_arg("-map").output_arg("a")
    }

    /// VBR audio quality.
    pub fn audio_quality(self, q: u8) -> Self {
        self.output_arg("-q:a").output_arg(q.to_string())
    }

    /// Set log level.
    pub fn log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    pub fn output_path(&self) -> &Path {
        &self.output
    }

    /// Build the command arguments.
    pub fn build_args(&self) -> Vec<String> {
        let mut args = Vec::new();

        if self.overwrite {
            args.push("-y".to_string());
        }

        args.push("-nostdin".to_string());
        args.push("-v".to_string());
        args.push(self.log_level.clone());

        args.extend(self.input_args.clone());

        args.push("-i".to_string());
        args.push(self.input.to_string_lossy().to_string());

        args.extend(self.output_args.clone());

        args.push(self.output.to_string_lossy().to_string());

        args
    }

    /// Package as an invocation of `ffmpeg_bin` bounded by `timeout`.
    pub fn into_invocation(self, ffmpeg_bin: &str, timeout: Duration) -> Invocation {
        Invocation::new(ffmpeg_bin, self.build_args(), timeout)
    }
}

/// Check if FFmpeg is available.
pub fn check_ffmpeg(tools: &ToolPaths) -> MediaResult<PathBuf> {
    which::which(&tools.ffmpeg).map_err(|_| MediaError::ToolNotFound(tools.ffmpeg.clone()))
}

/// Check if FFprobe is available.
pub fn check_ffprobe(tools: &ToolPaths) -> MediaResult<PathBuf> {
    which::which(&tools.ffprobe).map_err(|_| MediaError::ToolNotFound(tools.ffprobe.clone()))
}
