//! Job orchestration: validate, fetch, process, upload, clean up.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tracing::Instrument;
use vpipe_media::{CommandRunner, ConcatEngine, Fetcher, SegmentationEngine};
use vpipe_models::{safe_name, Artifact, Job, JobMode, JobRequest, JobStage, SourceDescriptor};
use vpipe_storage::config::DEFAULT_DEST_PREFIX;
use vpipe_storage::Uploader;

use crate::config::PipelineConfig;
use crate::error::{JobFailure, PipelineError, PipelineResult};
use crate::logging::JobLogger;
use crate::report::{ArtifactReport, JobReport};
use crate::workspace::Workspace;

/// Drives one job at a time through its stages; share it across jobs.
///
/// Jobs are independent: each gets its own workspace and holds no locks.
pub struct Pipeline {
    config: PipelineConfig,
    runner: Arc<dyn CommandRunner>,
    fetcher: Fetcher,
    uploader: Option<Uploader>,
    default_prefix: String,
}

impl Pipeline {
    pub fn new(config: PipelineConfig, runner: Arc<dyn CommandRunner>, fetcher: Fetcher) -> Self {
        Self {
            config,
            runner,
            fetcher,
            uploader: None,
            default_prefix: DEFAULT_DEST_PREFIX.to_string(),
        }
    }

    /// Enable uploads; `default_prefix` applies when a request names none.
    pub fn with_uploader(mut self, uploader: Uploader, default_prefix: impl Into<String>) -> Self {
        self.uploader = Some(uploader);
        self.default_prefix = default_prefix.into();
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn default_prefix(&self) -> &str {
        &self.default_prefix
    }

    /// Run one job to completion.
    ///
    /// Invalid requests are refused before any job or workspace exists. For
    /// every accepted job the workspace is removed before this returns,
    /// whatever the outcome.
    pub async fn run(&self, request: JobRequest) -> Result<JobReport, JobFailure> {
        if let Err(e) = request.check() {
            metrics::counter!(
                "vpipe_jobs_rejected_total",
                "mode" => request.mode.as_str()
            )
            .increment(1);
            return Err(JobFailure {
                job_id: None,
                stage: JobStage::Created,
                error: e.into(),
            });
        }

        let dest_prefix = request
            .dest_prefix
            .clone()
            .unwrap_or_else(|| self.default_prefix.clone());
        let mut job = Job::new(
            request.mode,
            request.sources.clone(),
            request.resolved_output_name(),
            dest_prefix,
        );

        let logger = JobLogger::new(&job.id, job.mode);
        let span = logger.create_span();
        self.run_job(&mut job, &request, &logger)
            .instrument(span)
            .await
    }

    async fn run_job(
        &self,
        job: &mut Job,
        request: &JobRequest,
        logger: &JobLogger,
    ) -> Result<JobReport, JobFailure> {
        let started = Instant::now();
        let mode = job.mode.as_str();
        logger.log_start(job.sources.len());
        metrics::counter!("vpipe_jobs_started_total", "mode" => mode).increment(1);

        let result = match Workspace::create(&self.config.work_dir, job.mode, &job.id) {
            Ok(mut workspace) => {
                job.scratch_dir = Some(workspace.path().to_path_buf());
                let result = self.execute(job, request, &workspace, logger).await;
                workspace.cleanup().await;
                result
            }
            Err(e) => Err(e),
        };

        let elapsed = started.elapsed();
        metrics::histogram!("vpipe_job_duration_seconds", "mode" => mode)
            .record(elapsed.as_secs_f64());

        match result {
            Ok(artifacts) => {
                let finished_at = job.finished_at.unwrap_or_else(Utc::now);
                let elapsed_ms = elapsed.as_millis() as u64;
                logger.log_completion(artifacts.len(), elapsed_ms);
                metrics::counter!("vpipe_jobs_completed_total", "mode" => mode).increment(1);

                Ok(JobReport {
                    job_id: job.id.clone(),
                    mode: job.mode,
                    stage: job.stage,
                    output_name: job.output_name.clone(),
                    uploaded: request.upload(),
                    artifacts,
                    elapsed_ms,
                    finished_at,
                })
            }
            Err(error) => {
                let stage = job.stage;
                let kind = error.kind();
                job.fail(error.to_string());
                logger.log_error(stage, kind.as_str(), &error.to_string());
                metrics::counter!(
                    "vpipe_jobs_failed_total",
                    "mode" => mode,
                    "kind" => kind.as_str()
                )
                .increment(1);

                Err(JobFailure {
                    job_id: Some(job.id.clone()),
                    stage,
                    error,
                })
            }
        }
    }

    async fn execute(
        &self,
        job: &mut Job,
        request: &JobRequest,
        workspace: &Workspace,
        logger: &JobLogger,
    ) -> PipelineResult<Vec<ArtifactReport>> {
        if request.upload() && self.uploader.is_none() {
            return Err(PipelineError::StoreNotConfigured);
        }

        self.advance(job, JobStage::Fetching, logger)?;
        let sources = self.fetch_all(job, workspace).await?;

        self.advance(job, JobStage::Processing, logger)?;
        let artifacts = self.process(job, request, workspace, &sources).await?;
        if artifacts.is_empty() {
            return Err(PipelineError::empty_result(format!(
                "{} job produced nothing",
                job.mode
            )));
        }
        logger.log_progress(&format!("{} artifacts produced", artifacts.len()));

        let reports = match (&self.uploader, request.upload()) {
            (Some(uploader), true) => {
                self.advance(job, JobStage::Uploading, logger)?;
                let upload_started = Instant::now();
                let mut reports = Vec::with_capacity(artifacts.len());
                for artifact in &artifacts {
                    let uploaded = uploader.upload(artifact).await?;
                    reports.push(ArtifactReport::new(artifact, Some(uploaded)));
                }
                metrics::histogram!("vpipe_upload_duration_seconds")
                    .record(upload_started.elapsed().as_secs_f64());
                reports
            }
            _ => {
                logger.log_warning("upload disabled; artifacts are removed with the workspace");
                artifacts
                    .iter()
                    .map(|a| ArtifactReport::new(a, None))
                    .collect()
            }
        };

        job.artifacts = artifacts;
        self.advance(job, JobStage::Done, logger)?;
        Ok(reports)
    }

    fn advance(&self, job: &mut Job, next: JobStage, logger: &JobLogger) -> PipelineResult<()> {
        job.advance(next)?;
        logger.log_stage(next);
        Ok(())
    }

    async fn fetch_all(
        &self,
        job: &Job,
        workspace: &Workspace,
    ) -> PipelineResult<Vec<SourceDescriptor>> {
        let mut sources = Vec::with_capacity(job.sources.len());
        for (index, url) in job.sources.iter().enumerate() {
            let dest = workspace.source_path(index);
            sources.push(self.fetcher.fetch(url, &dest).await?);
        }
        Ok(sources)
    }

    async fn process(
        &self,
        job: &Job,
        request: &JobRequest,
        workspace: &Workspace,
        sources: &[SourceDescriptor],
    ) -> PipelineResult<Vec<Artifact>> {
        match job.mode {
            JobMode::Split => {
                let source = sources
                    .first()
                    .ok_or_else(|| PipelineError::empty_result("no source fetched"))?;
                let engine = SegmentationEngine::new(
                    self.runner.clone(),
                    self.config.tools.clone(),
                    self.config.segment_options(request),
                );
                let base = safe_name(&job.output_name);
                Ok(engine
                    .run(&source.local_path, workspace.path(), &base, &job.dest_prefix)
                    .await?)
            }
            JobMode::Concat => {
                let engine = ConcatEngine::new(
                    self.runner.clone(),
                    self.config.tools.clone(),
                    self.config.concat_options(request),
                );
                let inputs: Vec<PathBuf> = sources.iter().map(|s| s.local_path.clone()).collect();
                let artifact = engine
                    .run(&inputs, workspace.path(), &job.output_name, &job.dest_prefix)
                    .await?;
                Ok(vec![artifact])
            }
        }
    }
}
