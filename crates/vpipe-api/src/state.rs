//! Application state.

use std::sync::Arc;

use tracing::{info, warn};
use vpipe_media::{check_ffmpeg, check_ffprobe, Fetcher, ProcessRunner};
use vpipe_pipeline::{Pipeline, PipelineConfig};
use vpipe_storage::{HttpStore, StoreConfig, Uploader};

use crate::config::ApiConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub pipeline: Arc<Pipeline>,
}

impl AppState {
    /// Create new application state from the environment.
    ///
    /// The object store client is built once here and shared by every job.
    pub fn new(config: ApiConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let pipeline_config = PipelineConfig::from_env();
        let store_config = StoreConfig::from_env()?;

        for check in [
            check_ffmpeg(&pipeline_config.tools),
            check_ffprobe(&pipeline_config.tools),
        ] {
            match check {
                Ok(path) => info!("Using {}", path.display()),
                Err(e) => warn!("{}; jobs will fail until it is installed", e),
            }
        }

        let store = HttpStore::new(store_config.clone())?;
        let uploader = Uploader::new(
            Arc::new(store),
            store_config.private,
            store_config.signed_url_ttl,
        );
        let fetcher = Fetcher::new(pipeline_config.fetch_config())?;

        info!(
            bucket = %store_config.bucket,
            private = store_config.private,
            work_dir = %pipeline_config.work_dir.display(),
            "Pipeline configured"
        );

        let pipeline = Pipeline::new(pipeline_config, Arc::new(ProcessRunner::new()), fetcher)
            .with_uploader(uploader, store_config.default_prefix);

        Ok(Self::with_pipeline(config, pipeline))
    }

    pub fn with_pipeline(config: ApiConfig, pipeline: Pipeline) -> Self {
        Self {
            config,
            pipeline: Arc::new(pipeline),
        }
    }
}
