//! Artifact upload with access URL resolution.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, info};
use vpipe_models::{AccessUrl, Artifact, UploadResult};

use crate::client::ObjectStore;
use crate::error::{StorageError, StorageResult};

/// Pushes artifacts to the store and reports how to reach them.
#[derive(Clone)]
pub struct Uploader {
    store: Arc<dyn ObjectStore>,
    private: bool,
    signed_url_ttl: Duration,
}

impl Uploader {
    pub fn new(store: Arc<dyn ObjectStore>, private: bool, signed_url_ttl: Duration) -> Self {
        Self {
            store,
            private,
            signed_url_ttl,
        }
    }

    pub fn is_private(&self) -> bool {
        self.private
    }

    /// Upload one artifact to its destination path.
    ///
    /// Public buckets yield the deterministic object URL; private buckets a
    /// signed URL valid for the configured lifetime.
    pub async fn upload(&self, artifact: &Artifact) -> StorageResult<UploadResult> {
        let path = artifact.destination.as_str();
        if path.is_empty() {
            return Err(StorageError::upload_failed(format!(
                "{} has no destination",
                artifact.name
            )));
        }

        debug!(artifact = %artifact.name, path, "Uploading artifact");
        self.store
            .put_object(path, &artifact.path, artifact.kind.content_type())
            .await?;
        metrics::counter!("vpipe_upload_bytes_total").increment(artifact.size_bytes);

        let access = if self.private {
            let expires_at = Utc::now()
                + chrono::Duration::from_std(self.signed_url_ttl)
                    .map_err(|e| StorageError::sign_failed(e.to_string()))?;
            let url = self.store.sign(path, self.signed_url_ttl).await?;
            AccessUrl::Signed { url, expires_at }
        } else {
            AccessUrl::Public {
                url: self.store.public_url(path),
            }
        };

        let key = format!("{}/{}", self.store.bucket(), path);
        info!(key = %key, signed = self.private, "Artifact uploaded");

        Ok(UploadResult { key, access })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use tempfile::TempDir;
    use vpipe_models::ArtifactKind;

    fn artifact(dir: &TempDir, name: &str, body: &[u8], dest: &str) -> Artifact {
        let path = dir.path().join(name);
        std::fs::write(&path, body).unwrap();
        Artifact::new(1, ArtifactKind::Video, path, body.len() as u64, dest)
    }

    #[tokio::test]
    async fn test_public_upload() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(MemoryStore::default());
        let uploader = Uploader::new(store.clone(), false, Duration::from_secs(86400));

        let result = uploader
            .upload(&artifact(&dir, "a.mp4", b"abc", "VideosFinales/a.mp4"))
            .await
            .unwrap();

        assert_eq!(result.key, "videogeneral/VideosFinales/a.mp4");
        assert!(!result.access.is_signed());
        assert_eq!(result.access.url(), "memory://videogeneral/VideosFinales/a.mp4");
        assert_eq!(store.get("VideosFinales/a.mp4").unwrap(), b"abc");
    }

    #[tokio::test]
    async fn test_private_upload_is_signed_for_a_day() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(MemoryStore::default());
        let uploader = Uploader::new(store, true, Duration::from_secs(86400));

        let before = Utc::now();
        let result = uploader
            .upload(&artifact(&dir, "a.mp4", b"abc", "p/a.mp4"))
            .await
            .unwrap();

        match result.access {
            AccessUrl::Signed { url, expires_at } => {
                assert!(url.contains("expires_in=86400"));
                let ttl = expires_at - before;
                assert!(ttl >= chrono::Duration::seconds(86399));
                assert!(ttl <= chrono::Duration::seconds(86401));
            }
            other => panic!("expected signed url, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_same_destination_last_write_wins() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(MemoryStore::default());
        let uploader = Uploader::new(store.clone(), false, Duration::from_secs(60));

        uploader
            .upload(&artifact(&dir, "first.mp4", b"first", "out/final.mp4"))
            .await
            .unwrap();
        uploader
            .upload(&artifact(&dir, "second.mp4", b"second", "out/final.mp4"))
            .await
            .unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(store.get("out/final.mp4").unwrap(), b"second");
        assert_eq!(store.writes().len(), 2);
    }

    #[tokio::test]
    async fn test_rejected_write() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(MemoryStore::default());
        store.reject_writes();
        let uploader = Uploader::new(store, false, Duration::from_secs(60));

        let err = uploader
            .upload(&artifact(&dir, "a.mp4", b"abc", "a.mp4"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), vpipe_models::ErrorKind::UploadError);
    }
}
