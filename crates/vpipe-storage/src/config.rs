//! Object store configuration.

use std::fmt;
use std::time::Duration;

use crate::error::{StorageError, StorageResult};

/// Default bucket for produced media.
pub const DEFAULT_BUCKET: &str = "videogeneral";
/// Default destination prefix inside the bucket.
pub const DEFAULT_DEST_PREFIX: &str = "VideosFinales/";
/// Signed URL lifetime for private buckets (24 h).
pub const DEFAULT_SIGNED_URL_TTL_SECS: u64 = 86_400;

/// Connection and access settings for the object store.
#[derive(Clone)]
pub struct StoreConfig {
    /// Base URL of the storage service (no trailing slash)
    pub url: String,
    /// Service credential sent on every request
    pub service_key: String,
    /// Bucket name
    pub bucket: String,
    /// Prefix used when a job does not name one
    pub default_prefix: String,
    /// Private buckets are accessed through signed URLs
    pub private: bool,
    /// Signed URL lifetime
    pub signed_url_ttl: Duration,
    /// Budget for one upload request
    pub upload_timeout: Duration,
}

impl fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreConfig")
            .field("url", &self.url)
            .field("service_key", &"<redacted>")
            .field("bucket", &self.bucket)
            .field("default_prefix", &self.default_prefix)
            .field("private", &self.private)
            .field("signed_url_ttl", &self.signed_url_ttl)
            .field("upload_timeout", &self.upload_timeout)
            .finish()
    }
}

impl StoreConfig {
    /// Create config from environment variables.
    ///
    /// `STORE_URL` and `STORE_SERVICE_KEY` are required.
    pub fn from_env() -> StorageResult<Self> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_vars<F>(var: F) -> StorageResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let url = var("STORE_URL")
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| StorageError::config_error("STORE_URL not set"))?;
        let service_key = var("STORE_SERVICE_KEY")
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| StorageError::config_error("STORE_SERVICE_KEY not set"))?;

        Ok(Self {
            url: url.trim_end_matches('/').to_string(),
            service_key,
            bucket: var("STORE_BUCKET").unwrap_or_else(|| DEFAULT_BUCKET.to_string()),
            default_prefix: var("STORE_DEST_PREFIX")
                .unwrap_or_else(|| DEFAULT_DEST_PREFIX.to_string()),
            private: var("STORE_PRIVATE")
                .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(false),
            signed_url_ttl: Duration::from_secs(
                var("STORE_SIGNED_URL_TTL_SECS")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(DEFAULT_SIGNED_URL_TTL_SECS),
            ),
            upload_timeout: Duration::from_secs(
                var("STORE_UPLOAD_TIMEOUT_SECS")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(1800),
            ),
        })
    }

    /// Config for a store at `url` with defaults for everything else.
    pub fn new(url: impl Into<String>, service_key: impl Into<String>) -> Self {
        Self {
            url: url.into().trim_end_matches('/').to_string(),
            service_key: service_key.into(),
            bucket: DEFAULT_BUCKET.to_string(),
            default_prefix: DEFAULT_DEST_PREFIX.to_string(),
            private: false,
            signed_url_ttl: Duration::from_secs(DEFAULT_SIGNED_URL_TTL_SECS),
            upload_timeout: Duration::from_secs(1800),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let cfg = StoreConfig::from_vars(vars(&[
            ("STORE_URL", "https://store.example.com/"),
            ("STORE_SERVICE_KEY", "secret"),
        ]))
        .unwrap();
        assert_eq!(cfg.url, "https://store.example.com");
        assert_eq!(cfg.bucket, "videogeneral");
        assert_eq!(cfg.default_prefix, "VideosFinales/");
        assert!(!cfg.private);
        assert_eq!(cfg.signed_url_ttl, Duration::from_secs(86_400));
    }

    #[test]
    fn test_missing_credentials() {
        let err = StoreConfig::from_vars(vars(&[("STORE_URL", "https://s.example.com")]))
            .unwrap_err();
        assert!(err.to_string().contains("STORE_SERVICE_KEY"));
        assert!(StoreConfig::from_vars(vars(&[])).is_err());
    }

    #[test]
    fn test_private_bucket_flag() {
        let cfg = StoreConfig::from_vars(vars(&[
            ("STORE_URL", "https://s.example.com"),
            ("STORE_SERVICE_KEY", "k"),
            ("STORE_PRIVATE", "True"),
            ("STORE_SIGNED_URL_TTL_SECS", "600"),
        ]))
        .unwrap();
        assert!(cfg.private);
        assert_eq!(cfg.signed_url_ttl, Duration::from_secs(600));
    }

    #[test]
    fn test_debug_redacts_key() {
        let cfg = StoreConfig::new("https://s.example.com", "very-secret");
        assert!(!format!("{:?}", cfg).contains("very-secret"));
    }
}
