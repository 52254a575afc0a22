use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use xjob_core::DispatchError;
use xjob_model::ApiReply;

/// Failures of an inbound call.
///
/// Every variant is answered with HTTP 200 and `error: 500` in the body; the
/// scheduling center only reads the body.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("params err")]
    InvalidRequest(String),

    #[error("auth token error")]
    Unauthorized,

    #[error("{0}")]
    Dispatch(#[from] DispatchError),

    #[error("Task kill err")]
    Kill(#[source] DispatchError),
}

impl ApiError {
    /// Text placed in the reply `msg`.
    pub fn reply(&self) -> ApiReply {
        ApiReply::failure(self.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self.reply())).into_response()
    }
}
