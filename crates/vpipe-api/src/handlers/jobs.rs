//! Generic job submission.

use axum::extract::State;
use axum::Json;
use serde::Serialize;
use tracing::info;
use vpipe_models::JobRequest;
use vpipe_pipeline::JobReport;

use crate::error::ApiResult;
use crate::handlers::ApiJson;
use crate::state::AppState;

#[derive(Serialize)]
pub struct JobResponse {
    pub ok: bool,
    #[serde(flatten)]
    pub report: JobReport,
}

/// Run a split or concat job to completion and report its artifacts.
pub async fn submit_job(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<JobRequest>,
) -> ApiResult<Json<JobResponse>> {
    info!(
        mode = %request.mode,
        sources = request.sources.len(),
        "Job submitted"
    );

    let report = state.pipeline.run(request).await?;

    Ok(Json(JobResponse { ok: true, report }))
}
