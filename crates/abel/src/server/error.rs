use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use abel_core::{CoreError, LabelingError};

// ==============================================================================
// Error Type
// ==============================================================================

#[derive(Debug)]
pub(crate) enum AppError {
    BadRequest(String),
    Unauthorized(String),
    Forbidden(String),
    NotFound(String),
    Conflict(String),
    BadGateway(String),
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            Self::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            Self::Conflict(msg) => (StatusCode::CONFLICT, msg),
            Self::BadGateway(msg) => (StatusCode::BAD_GATEWAY, msg),
            Self::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

pub(super) fn map_labeling_error(err: LabelingError) -> AppError {
    let message = err.to_string();
    match err {
        LabelingError::Unauthorized { .. } => AppError::Forbidden(message),
        LabelingError::AlreadyExists(_) | LabelingError::NotEmpty { .. } => {
            AppError::Conflict(message)
        }
        LabelingError::NotFound(_) => AppError::NotFound(message),
        LabelingError::InvalidIdentifierLength { .. } => AppError::BadRequest(message),
        LabelingError::Core(core) => map_core_error(core),
    }
}

pub(super) fn map_core_error(err: CoreError) -> AppError {
    match err {
        CoreError::Ledger(_) => AppError::BadGateway(err.to_string()),
        CoreError::SnapshotJson(_) | CoreError::CorruptSnapshot(_) | CoreError::Io(_) => {
            tracing::error!(error = %err, "registry persistence failed");
            AppError::Internal(err.to_string())
        }
    }
}
