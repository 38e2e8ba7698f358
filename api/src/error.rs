use axum::Json;
use axum::extract::rejection::BytesRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use optimization::OptimizationError;
use optimization::status::map_upstream_error;
use serde::Serialize;
use storage::StorageError;

#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Optimization(#[from] OptimizationError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("could not read request body: {0}")]
    Body(#[from] BytesRejection),

    #[error("File doesn't exist")]
    FileNotFound,
}

#[derive(Serialize)]
struct ApiErrorResponse {
    error: String,
}

fn file_not_found() -> Response {
    let body = Json(ApiErrorResponse {
        error: ApiError::FileNotFound.to_string(),
    });
    (StatusCode::NOT_FOUND, body).into_response()
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Optimization(OptimizationError::Upstream(e)) => {
                let mapped = map_upstream_error(&e);
                match mapped.body {
                    Some(body) => (mapped.status, body).into_response(),
                    None => mapped.status.into_response(),
                }
            }
            ApiError::Optimization(e) => (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
            ApiError::Body(rejection) => rejection.into_response(),
            ApiError::FileNotFound | ApiError::Storage(StorageError::NotFound(_)) => {
                file_not_found()
            }
            ApiError::Storage(e) => {
                tracing::error!(error = %e, "Storage request failed");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}
