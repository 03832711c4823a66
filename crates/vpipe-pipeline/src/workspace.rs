//! Per-job scratch directory.
//!
//! Each job gets a uniquely named directory under the configured work dir.
//! [`Workspace::cleanup`] removes it and can be called any number of times;
//! dropping an uncleaned workspace removes it as well.

use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::{debug, warn};
use vpipe_models::{JobId, JobMode};

use crate::error::{PipelineError, PipelineResult};

#[derive(Debug)]
pub struct Workspace {
    dir: Option<TempDir>,
    path: PathBuf,
}

impl Workspace {
    /// Allocate `<root>/<mode>_<job>_<random>/`.
    pub fn create(root: &Path, mode: JobMode, job_id: &JobId) -> PipelineResult<Self> {
        std::fs::create_dir_all(root).map_err(|e| {
            PipelineError::workspace(format!("cannot create {}: {e}", root.display()))
        })?;

        let dir = tempfile::Builder::new()
            .prefix(&format!("{}_{}_", mode.as_str(), job_id.short()))
            .tempdir_in(root)
            .map_err(|e| {
                PipelineError::workspace(format!("cannot allocate under {}: {e}", root.display()))
            })?;

        let path = dir.path().to_path_buf();
        debug!(path = %path.display(), "Workspace created");
        Ok(Self {
            dir: Some(dir),
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Local file for the `index`-th source (0-based).
    pub fn source_path(&self, index: usize) -> PathBuf {
        self.path.join(format!("input_{}.src", index + 1))
    }

    pub fn is_cleaned(&self) -> bool {
        self.dir.is_none()
    }

    /// Remove the directory and everything in it.
    ///
    /// Failures are logged, never returned: cleanup must not mask the job result.
    pub async fn cleanup(&mut self) {
        let Some(dir) = self.dir.take() else {
            return;
        };

        let path = self.path.clone();
        match tokio::task::spawn_blocking(move || dir.close()).await {
            Ok(Ok(())) => debug!(path = %path.display(), "Workspace removed"),
            Ok(Err(e)) => warn!(path = %path.display(), error = %e, "Workspace cleanup failed"),
            Err(e) => warn!(path = %path.display(), error = %e, "Workspace cleanup task failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_and_cleanup() {
        let root = tempfile::TempDir::new().unwrap();
        let job_id = JobId::new();
        let mut ws = Workspace::create(root.path(), JobMode::Concat, &job_id).unwrap();

        assert!(ws.path().is_dir());
        let name = ws.path().file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with(&format!("concat_{}_", job_id.short())));

        std::fs::write(ws.source_path(0), b"x").unwrap();
        assert!(ws.source_path(0).ends_with("input_1.src"));

        let path = ws.path().to_path_buf();
        ws.cleanup().await;
        assert!(!path.exists());
        assert!(ws.is_cleaned());

        // second call is a no-op
        ws.cleanup().await;
    }

    #[tokio::test]
    async fn test_cleanup_tolerates_vanished_directory() {
        let root = tempfile::TempDir::new().unwrap();
        let mut ws = Workspace::create(root.path(), JobMode::Split, &JobId::new()).unwrap();
        std::fs::remove_dir_all(ws.path()).unwrap();
        ws.cleanup().await;
        assert!(ws.is_cleaned());
    }

    #[test]
    fn test_drop_removes_directory() {
        let root = tempfile::TempDir::new().unwrap();
        let path = {
            let ws = Workspace::create(root.path(), JobMode::Split, &JobId::new()).unwrap();
            ws.path().to_path_buf()
        };
        assert!(!path.exists());
    }

    #[test]
    fn test_concurrent_jobs_get_distinct_directories() {
        let root = tempfile::TempDir::new().unwrap();
        let id = JobId::new();
        let a = Workspace::create(root.path(), JobMode::Split, &id).unwrap();
        let b = Workspace::create(root.path(), JobMode::Split, &id).unwrap();
        assert_ne!(a.path(), b.path());
    }
}
