//! Request handlers.

pub mod concat;
pub mod health;
pub mod jobs;
pub mod procesar;

use axum::extract::FromRequest;

pub use concat::concat;
pub use health::health;
pub use jobs::submit_job;
pub use procesar::procesar;

use crate::error::ApiError;

/// JSON body extractor whose rejections render as API errors.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);
