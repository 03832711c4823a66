//! Streaming download of remote sources.
//!
//! A source is accepted when the server declares a `video/*` or
//! `application/octet-stream` body (or nothing at all). Some file-sharing
//! providers answer a share link with an HTML preview page; for those one
//! retry is made with the provider's attachment hint before giving up.

use std::path::Path;
use std::time::{Duration, Instant};

use futures_util::StreamExt;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Response};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};
use url::Url;
use vpipe_models::{ContainerHint, ContentFamily, SourceDescriptor};

use crate::error::{MediaError, MediaResult};

/// Bytes kept from the head of the body for the container sniff.
const SNIFF_LEN: usize = 64;

/// Log a progress line every this many bytes.
const PROGRESS_STEP_BYTES: u64 = 10 * 1024 * 1024;

/// EBML magic used by Matroska and WebM.
const EBML_MAGIC: [u8; 4] = [0x1A, 0x45, 0xDF, 0xA3];

/// Fetcher limits.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Budget for the whole transfer, headers included
    pub timeout: Duration,
    /// TCP/TLS connect budget
    pub connect_timeout: Duration,
    /// Smaller bodies are rejected as truncated or error pages
    pub min_bytes: u64,
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(600),
            connect_timeout: Duration::from_secs(30),
            min_bytes: 10 * 1024,
            user_agent: format!("vpipe/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Hosting services whose share links need a hint to return the raw file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageProvider {
    Dropbox,
    GoogleDrive,
    OneDrive,
    /// Supabase-style `/storage/v1/object/` endpoints
    ObjectStorage,
}

impl StorageProvider {
    pub fn detect(url: &Url) -> Option<Self> {
        let host = url.host_str()?.to_ascii_lowercase();
        if host == "dropbox.com" || host.ends_with(".dropbox.com") {
            Some(Self::Dropbox)
        } else if host == "drive.google.com" {
            Some(Self::GoogleDrive)
        } else if host == "1drv.ms" || host.ends_with("onedrive.live.com") {
            Some(Self::OneDrive)
        } else if url.path().contains("/storage/v1/object/") {
            Some(Self::ObjectStorage)
        } else {
            None
        }
    }

    /// The same link with this provider's download-as-attachment hint.
    pub fn attachment_url(&self, url: &Url) -> Url {
        let (key, value) = match self {
            Self::Dropbox => ("dl", "1"),
            Self::GoogleDrive => ("export", "download"),
            Self::OneDrive => ("download", "1"),
            Self::ObjectStorage => ("download", ""),
        };

        let kept: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(k, _)| k != key)
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        let mut hinted = url.clone();
        {
            let mut pairs = hinted.query_pairs_mut();
            pairs.clear();
            for (k, v) in &kept {
                pairs.append_pair(k, v);
            }
            pairs.append_pair(key, value);
        }
        hinted
    }
}

/// Container guess from the first bytes of a file.
pub fn sniff_container(head: &[u8]) -> ContainerHint {
    if head.starts_with(&EBML_MAGIC) {
        return ContainerHint::Matroska;
    }
    // ISO-BMFF: a box header (size + "ftyp") at offset 0, rarely after a leading box
    if head.windows(4).take(SNIFF_LEN).any(|w| w == b"ftyp") {
        return ContainerHint::Mp4;
    }
    ContainerHint::Unknown
}

/// Downloads sources into a job workspace.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    config: FetchConfig,
}

impl Fetcher {
    pub fn new(config: FetchConfig) -> MediaResult<Self> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| MediaError::internal(format!("HTTP client: {e}")))?;
        Ok(Self { client, config })
    }

    pub fn with_client(client: Client, config: FetchConfig) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// Fetch `url` into `dest`.
    ///
    /// On any failure `dest` does not exist afterwards.
    pub async fn fetch(&self, url: &str, dest: &Path) -> MediaResult<SourceDescriptor> {
        let started = Instant::now();
        let secs = self.config.timeout.as_secs();

        let result = match tokio::time::timeout(self.config.timeout, self.fetch_inner(url, dest))
            .await
        {
            Ok(result) => result,
            Err(_) => Err(MediaError::timeout(format!("download of {url}"), secs)),
        };

        match &result {
            Ok(source) => {
                metrics::counter!("vpipe_fetch_total", "outcome" => "ok").increment(1);
                metrics::counter!("vpipe_fetch_bytes_total").increment(source.size_bytes);
                info!(
                    url = %url,
                    size_bytes = source.size_bytes,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Fetched source"
                );
            }
            Err(e) => {
                metrics::counter!("vpipe_fetch_total", "outcome" => "error").increment(1);
                warn!(url = %url, error = %e, "Fetch failed");
                remove_partial(dest).await;
            }
        }

        result
    }

    async fn fetch_inner(&self, url: &str, dest: &Path) -> MediaResult<SourceDescriptor> {
        let (fetched_url, family, response) = self.open(url).await?;

        let mut progress = Progress::new(response.content_length());
        let mut file = File::create(dest).await?;
        let mut stream = response.bytes_stream();
        let mut size: u64 = 0;
        let mut head: Vec<u8> = Vec::with_capacity(SNIFF_LEN);

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| self.map_http_error(url, e))?;
            if head.len() < SNIFF_LEN {
                let take = (SNIFF_LEN - head.len()).min(chunk.len());
                head.extend_from_slice(&chunk[..take]);
            }
            file.write_all(&chunk).await?;
            size += chunk.len() as u64;

            if let Some(total) = progress.advance(size) {
                debug!(url = %url, bytes = size, total_bytes = total, "Download progress");
            }
        }

        file.flush().await?;
        drop(file);

        if size < self.config.min_bytes {
            return Err(MediaError::invalid_content(format!(
                "{url} returned {size} bytes, below the {} byte minimum",
                self.config.min_bytes
            )));
        }

        let container = sniff_container(&head);
        if container == ContainerHint::Unknown {
            warn!(url = %url, "No known container marker in source header");
        }

        Ok(SourceDescriptor {
            url: fetched_url,
            family,
            local_path: dest.to_path_buf(),
            size_bytes: size,
            container,
        })
    }

    /// GET the source, retrying once with a provider hint on a non-media answer.
    async fn open(&self, url: &str) -> MediaResult<(String, ContentFamily, Response)> {
        let response = self.get(url).await?;
        let declared = content_type(&response);
        if let Some(family) = ContentFamily::classify(declared.as_deref()) {
            return Ok((url.to_string(), family, response));
        }
        drop(response);

        let parsed = Url::parse(url).map_err(|e| MediaError::fetch_failed(format!("{url}: {e}")))?;
        if let Some(provider) = StorageProvider::detect(&parsed) {
            let hinted = provider.attachment_url(&parsed).to_string();
            info!(url = %url, ?provider, "Retrying with attachment hint");

            let retry = self.get(&hinted).await?;
            let retry_type = content_type(&retry);
            if let Some(family) = ContentFamily::classify(retry_type.as_deref()) {
                return Ok((hinted, family, retry));
            }
        }

        Err(MediaError::invalid_content(format!(
            "{url} returned content type '{}'",
            declared.unwrap_or_default()
        )))
    }

    async fn get(&self, url: &str) -> MediaResult<Response> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.map_http_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(MediaError::fetch_failed(format!("GET {url} returned {status}")));
        }
        Ok(response)
    }

    fn map_http_error(&self, url: &str, e: reqwest::Error) -> MediaError {
        if e.is_timeout() {
            MediaError::timeout(format!("download of {url}"), self.config.timeout.as_secs())
        } else {
            MediaError::fetch_failed(format!("{url}: {e}"))
        }
    }
}

/// Progress marks every `PROGRESS_STEP_BYTES`, only for a declared length.
struct Progress {
    total: Option<u64>,
    next_mark: u64,
}

impl Progress {
    fn new(total: Option<u64>) -> Self {
        Self {
            total,
            next_mark: PROGRESS_STEP_BYTES,
        }
    }

    /// Declared total when `size` crossed the next mark.
    fn advance(&mut self, size: u64) -> Option<u64> {
        let total = self.total?;
        if size < self.next_mark {
            return None;
        }
        while self.next_mark <= size {
            self.next_mark += PROGRESS_STEP_BYTES;
        }
        Some(total)
    }
}

fn content_type(response: &Response) -> Option<String> {
    response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

async fn remove_partial(dest: &Path) {
    match tokio::fs::remove_file(dest).await {
        Ok(()) => debug!(path = %dest.display(), "Removed partial download"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(path = %dest.display(), error = %e, "Failed to remove partial download"),
    }
}
