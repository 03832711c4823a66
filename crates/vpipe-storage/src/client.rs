//! Object store client implementation.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_LENGTH, CONTENT_TYPE};
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::StoreConfig;
use crate::error::{StorageError, StorageResult};

/// Upload and access seam used by the pipeline.
///
/// `path` is always bucket-relative. Writes are upserts: the last write to a
/// path wins.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    fn bucket(&self) -> &str;

    async fn put_object(&self, path: &str, local: &Path, content_type: &str) -> StorageResult<()>;

    /// Time-limited URL for an object in a private bucket.
    async fn sign(&self, path: &str, ttl: Duration) -> StorageResult<String>;

    /// Deterministic URL for an object in a public bucket.
    fn public_url(&self, path: &str) -> String;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SignRequest {
    expires_in: u64,
}

#[derive(Deserialize)]
struct SignResponse {
    #[serde(rename = "signedURL", alias = "signedUrl")]
    signed_url: String,
}

/// Object store reached over its REST API.
#[derive(Clone)]
pub struct HttpStore {
    client: Client,
    config: StoreConfig,
}

impl HttpStore {
    /// Create a new client from configuration.
    pub fn new(config: StoreConfig) -> StorageResult<Self> {
        let client = Client::builder()
            .timeout(config.upload_timeout)
            .build()
            .map_err(|e| StorageError::config_error(e.to_string()))?;
        Ok(Self { client, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> StorageResult<Self> {
        Self::new(StoreConfig::from_env()?)
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    fn object_url(&self, kind: &str, path: &str) -> String {
        format!(
            "{}/storage/v1/object/{}{}/{}",
            self.config.url,
            kind,
            encode_segment(&self.config.bucket),
            encode_path(path)
        )
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header(AUTHORIZATION, format!("Bearer {}", self.config.service_key))
            .header("apikey", &self.config.service_key)
    }

    /// Client timeouts become `Timeout`; anything else goes through `other`.
    fn map_send_error(
        &self,
        e: reqwest::Error,
        what: &str,
        path: &str,
        other: fn(String) -> StorageError,
    ) -> StorageError {
        if e.is_timeout() {
            StorageError::timeout(
                format!("{what} {path}"),
                self.config.upload_timeout.as_secs(),
            )
        } else {
            other(format!("{path}: {e}"))
        }
    }

    /// Absolute URL from the path the sign endpoint returns.
    fn absolute_signed_url(&self, signed: &str) -> String {
        if signed.starts_with("http://") || signed.starts_with("https://") {
            signed.to_string()
        } else if signed.starts_with("/storage/v1/") {
            format!("{}{}", self.config.url, signed)
        } else {
            format!(
                "{}/storage/v1/{}",
                self.config.url,
                signed.trim_start_matches('/')
            )
        }
    }
}

#[async_trait]
impl ObjectStore for HttpStore {
    fn bucket(&self) -> &str {
        &self.config.bucket
    }

    async fn put_object(&self, path: &str, local: &Path, content_type: &str) -> StorageResult<()> {
        let file = tokio::fs::File::open(local).await?;
        let size = file.metadata().await?.len();
        debug!("Uploading {} ({} bytes) to {}", local.display(), size, path);

        let response = self
            .authorized(self.client.post(self.object_url("", path)))
            .header(CONTENT_TYPE, content_type)
            .header(CONTENT_LENGTH, size)
            .header("x-upsert", "true")
            .body(file)
            .send()
            .await
            .map_err(|e| self.map_send_error(e, "upload", path, StorageError::upload_failed))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StorageError::upload_failed(format!(
                "{path}: {status} {}",
                body.trim()
            )));
        }

        info!("Uploaded {} to {}/{}", local.display(), self.config.bucket, path);
        Ok(())
    }

    async fn sign(&self, path: &str, ttl: Duration) -> StorageResult<String> {
        let response = self
            .authorized(self.client.post(self.object_url("sign/", path)))
            .json(&SignRequest {
                expires_in: ttl.as_secs(),
            })
            .send()
            .await
            .map_err(|e| self.map_send_error(e, "sign", path, StorageError::sign_failed))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StorageError::sign_failed(format!(
                "{path}: {status} {}",
                body.trim()
            )));
        }

        let signed: SignResponse = response
            .json()
            .await
            .map_err(|e| StorageError::sign_failed(format!("{path}: bad response: {e}")))?;

        Ok(self.absolute_signed_url(&signed.signed_url))
    }

    fn public_url(&self, path: &str) -> String {
        self.object_url("public/", path)
    }
}

fn encode_segment(s: &str) -> String {
    urlencoding::encode(s).into_owned()
}

fn encode_path(path: &str) -> String {
    path.split('/')
        .map(encode_segment)
        .collect::<Vec<_>>()
        .join("/")
}
