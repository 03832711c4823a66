//! In-memory [`ObjectStore`] for tests.

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::client::ObjectStore;
use crate::error::{StorageError, StorageResult};

#[derive(Debug)]
pub struct MemoryStore {
    bucket: String,
    objects: Mutex<HashMap<String, Vec<u8>>>,
    writes: Mutex<Vec<String>>,
    reject_writes: AtomicBool,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new("videogeneral")
    }
}

impl MemoryStore {
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            objects: Mutex::new(HashMap::new()),
            writes: Mutex::new(Vec::new()),
            reject_writes: AtomicBool::new(false),
        }
    }

    /// Make every following write fail.
    pub fn reject_writes(&self) {
        self.reject_writes.store(true, Ordering::SeqCst);
    }

    pub fn get(&self, path: &str) -> Option<Vec<u8>> {
        self.objects.lock().ok()?.get(path).cloned()
    }

    pub fn len(&self) -> usize {
        self.objects.lock().map(|o| o.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Paths in write order, repeats included.
    pub fn writes(&self) -> Vec<String> {
        self.writes.lock().map(|w| w.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn put_object(&self, path: &str, local: &Path, _content_type: &str) -> StorageResult<()> {
        if self.reject_writes.load(Ordering::SeqCst) {
            return Err(StorageError::upload_failed(format!("{path}: 403 rejected")));
        }
        let data = tokio::fs::read(local).await?;
        self.objects
            .lock()
            .map_err(|_| StorageError::upload_failed("store poisoned"))?
            .insert(path.to_string(), data);
        self.writes
            .lock()
            .map_err(|_| StorageError::upload_failed("store poisoned"))?
            .push(path.to_string());
        Ok(())
    }

    async fn sign(&self, path: &str, ttl: Duration) -> StorageResult<String> {
        Ok(format!(
            "memory://{}/{}?expires_in={}",
            self.bucket,
            path,
            ttl.as_secs()
        ))
    }

    fn public_url(&self, path: &str) -> String {
        format!("memory://{}/{}", self.bucket, path)
    }
}
