//! Split endpoint with the legacy `url_video` / `user_id` payload.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use vpipe_models::{safe_name, JobId, JobMode, JobRequest};

use crate::error::{ApiError, ApiResult};
use crate::handlers::ApiJson;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ProcesarRequest {
    #[serde(default)]
    pub url_video: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ProcesarResponse {
    pub message: String,
    pub urls: Vec<String>,
    pub job_id: JobId,
}

/// Split `url_video` into segments stored under `<user_id>/`.
pub async fn procesar(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<ProcesarRequest>,
) -> ApiResult<Json<ProcesarResponse>> {
    let (url, user_id) = match (payload.url_video, payload.user_id) {
        (Some(url), Some(user)) if !url.is_empty() && !user.is_empty() => (url, user),
        _ => return Err(ApiError::bad_request("url_video and user_id are required")),
    };

    let mut request = JobRequest::new(JobMode::Split, vec![url]);
    request.dest_prefix = Some(format!("{}/", safe_name(&user_id)));

    let report = state.pipeline.run(request).await?;

    Ok(Json(ProcesarResponse {
        message: "processing complete".to_string(),
        urls: report.urls(),
        job_id: report.job_id,
    }))
}
