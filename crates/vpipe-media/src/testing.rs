//! Scripted [`CommandRunner`] for tests.
//!
//! Every invocation is recorded. ffprobe calls print the configured duration;
//! any other call writes a few bytes to its last argument, which is where
//! ffmpeg puts its output file.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::command::{CommandOutput, CommandRunner, Invocation};
use crate::error::{MediaError, MediaResult};

/// Forced result for one call.
#[derive(Debug, Clone)]
pub enum Outcome {
    Ok,
    Fail { exit_code: i32, stderr: String },
    Timeout,
    /// Succeed without creating the output file
    NoOutput,
}

#[derive(Debug)]
pub struct ScriptedRunner {
    probe_stdout: String,
    output_bytes: Vec<u8>,
    script: HashMap<usize, Outcome>,
    calls: Mutex<Vec<Invocation>>,
}

impl Default for ScriptedRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self {
            probe_stdout: "60.000000\n".to_string(),
            output_bytes: b"\x00\x00\x00\x18ftypisom".to_vec(),
            script: HashMap::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_probe_duration(mut self, secs: f64) -> Self {
        self.probe_stdout = format!("{:.6}\n", secs);
        self
    }

    pub fn with_probe_output(mut self, stdout: impl Into<String>) -> Self {
        self.probe_stdout = stdout.into();
        self
    }

    /// Force the outcome of the `n`-th call (0-based).
    pub fn script(mut self, n: usize, outcome: Outcome) -> Self {
        self.script.insert(n, outcome);
        self
    }

    pub fn calls(&self) -> Vec<Invocation> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Calls whose program is not ffprobe.
    pub fn ffmpeg_calls(&self) -> Vec<Invocation> {
        self.calls()
            .into_iter()
            .filter(|c| !is_probe(c))
            .collect()
    }
}

fn is_probe(invocation: &Invocation) -> bool {
    invocation.program.ends_with("ffprobe")
}

#[async_trait]
impl CommandRunner for ScriptedRunner {
    async fn run(&self, invocation: &Invocation) -> MediaResult<CommandOutput> {
        let n = {
            let mut calls = self
                .calls
                .lock()
                .map_err(|_| MediaError::internal("call log poisoned"))?;
            calls.push(invocation.clone());
            calls.len() - 1
        };

        let outcome = self.script.get(&n).cloned().unwrap_or(Outcome::Ok);
        match outcome {
            Outcome::Fail { exit_code, stderr } => {
                return Err(MediaError::tool_failed(
                    invocation.program.clone(),
                    Some(exit_code),
                    &stderr,
                ))
            }
            Outcome::Timeout => {
                return Err(MediaError::timeout(
                    invocation.program.clone(),
                    invocation.timeout.as_secs(),
                ))
            }
            Outcome::NoOutput => return Ok(CommandOutput::default()),
            Outcome::Ok => {}
        }

        if is_probe(invocation) {
            return Ok(CommandOutput {
                stdout: self.probe_stdout.clone(),
                stderr: String::new(),
                elapsed: Duration::from_millis(1),
            });
        }

        if let Some(out) = invocation.args.last() {
            tokio::fs::write(Path::new(out), &self.output_bytes).await?;
        }

        Ok(CommandOutput {
            elapsed: Duration::from_millis(1),
            ..Default::default()
        })
    }
}
