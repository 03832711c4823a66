//! Source duration via ffprobe.

use std::path::Path;
use std::time::Duration;

use tracing::debug;

use crate::command::{CommandRunner, Invocation, ToolPaths};
use crate::error::{MediaError, MediaResult};

fn probe_args(path: &Path) -> Vec<String> {
    vec![
        "-v".to_string(),
        "error".to_string(),
        "-show_entries".to_string(),
        "format=duration".to_string(),
        "-of".to_string(),
        "default=noprint_wrappers=1:nokey=1".to_string(),
        path.to_string_lossy().to_string(),
    ]
}

/// Duration of `path` in seconds, strictly positive.
///
/// A non-zero ffprobe exit or unparsable output is a probe failure; timeouts
/// and a missing binary keep their own error.
pub async fn probe_duration(
    runner: &dyn CommandRunner,
    tools: &ToolPaths,
    path: &Path,
    timeout: Duration,
) -> MediaResult<f64> {
    let invocation = Invocation::new(&tools.ffprobe, probe_args(path), timeout);

    let output = match runner.run(&invocation).await {
        Ok(output) => output,
        Err(MediaError::ToolFailed { stderr, .. }) => {
            return Err(MediaError::probe_failed(if stderr.is_empty() {
                "ffprobe could not read the file".to_string()
            } else {
                stderr
            }));
        }
        Err(e) => return Err(e),
    };

    let duration = parse_duration(&output.stdout)?;
    debug!(path = %path.display(), duration, "Probed duration");
    Ok(duration)
}

fn parse_duration(stdout: &str) -> MediaResult<f64> {
    let raw = stdout.lines().map(str::trim).find(|l| !l.is_empty()).unwrap_or("");
    match raw.parse::<f64>() {
        Ok(d) if d.is_finite() && d > 0.0 => Ok(d),
        _ => Err(MediaError::probe_failed(format!(
            "unexpected ffprobe output '{}'",
            raw
        ))),
    }
}
