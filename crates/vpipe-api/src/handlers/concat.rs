//! Merge endpoint with the legacy `clips` payload.

use axum::extract::State;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use vpipe_models::{JobMode, JobRequest};

use crate::error::{ApiError, ApiResult};
use crate::handlers::ApiJson;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ConcatRequest {
    #[serde(default)]
    pub clips: Vec<String>,
    #[serde(default)]
    pub output: Option<String>,
    #[serde(default)]
    pub reencode: Option<bool>,
    #[serde(default, rename = "destPrefix")]
    pub dest_prefix: Option<String>,
    #[serde(default)]
    pub upload: Option<bool>,
}

impl ConcatRequest {
    fn into_job_request(self) -> JobRequest {
        let mut request = JobRequest::new(JobMode::Concat, self.clips);
        request.output = self.output;
        request.reencode = self.reencode;
        request.upload = self.upload;
        // an empty prefix falls back to the configured default
        request.dest_prefix = self.dest_prefix.filter(|p| !p.is_empty());
        request
    }
}

#[derive(Debug, Serialize)]
pub struct ConcatResponse {
    pub ok: bool,
    pub work_id: String,
    pub output_name: String,
    pub size_bytes: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(rename = "publicUrl", skip_serializing_if = "Option::is_none")]
    pub public_url: Option<String>,
    #[serde(rename = "signedUrl", skip_serializing_if = "Option::is_none")]
    pub signed_url: Option<String>,
    #[serde(rename = "expiresAt", skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

/// Merge `clips` into one file, optionally uploading it.
pub async fn concat(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<ConcatRequest>,
) -> ApiResult<Json<ConcatResponse>> {
    if payload.clips.is_empty() {
        return Err(ApiError::bad_request("clips (array) required"));
    }

    let report = state.pipeline.run(payload.into_job_request()).await?;

    let merged = report
        .artifacts
        .first()
        .ok_or_else(|| ApiError::internal("merge reported no artifact"))?;

    Ok(Json(ConcatResponse {
        ok: true,
        work_id: report.job_id.short().to_string(),
        output_name: report.output_name.clone(),
        size_bytes: merged.size_bytes,
        key: merged.key.clone(),
        public_url: merged.public_url.clone(),
        signed_url: merged.signed_url.clone(),
        expires_at: merged.expires_at,
    }))
}
