//! REST API error mapping

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use crate::dataset::DatasetError;
use crate::query::QueryError;

use super::response::ErrorResponse;

/// Result type for REST operations
pub type ApiResult<T> = Result<T, ApiError>;

/// REST API errors
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// Catalog operation failed
    #[error("{0}")]
    Dataset(#[from] DatasetError),

    /// The kind path segment is not a known record kind
    #[error("unknown dataset kind '{0}'")]
    UnknownKind(String),

    /// A query referenced a dataset that is not loaded
    #[error("query references dataset '{0}', which is not loaded")]
    DatasetNotLoaded(String),

    /// Query rejected or failed
    #[error("{0}")]
    Query(#[from] QueryError),

    /// Shared state unusable after a panicked writer
    #[error("catalog lock poisoned")]
    LockPoisoned,
}

impl ApiError {
    /// HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            // removing or reading a dataset that was never loaded is the
            // one 404; everything else the caller sent is a 400
            ApiError::Dataset(DatasetError::NotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Dataset(_) => StatusCode::BAD_REQUEST,
            ApiError::UnknownKind(_) => StatusCode::BAD_REQUEST,
            ApiError::DatasetNotLoaded(_) => StatusCode::BAD_REQUEST,
            ApiError::Query(err) if err.is_internal() => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Query(_) => StatusCode::BAD_REQUEST,
            ApiError::LockPoisoned => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(ErrorResponse {
            error: self.to_string(),
        });
        (status, body).into_response()
    }
}
