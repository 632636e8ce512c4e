use axum::{
    extract::rejection::{PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Handler error; renders as `{"error": {"code", "message"}}`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Core(#[from] jobrec_core::Error),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        use jobrec_core::Error as Core;

        let (status, code) = match &self {
            ApiError::Core(Core::InvalidTopN) => (StatusCode::BAD_REQUEST, "INVALID_TOP_N"),
            ApiError::Core(Core::MalformedQuery(_)) => (StatusCode::BAD_REQUEST, "MALFORMED_QUERY"),
            ApiError::Core(Core::IndexMismatch { .. }) => (StatusCode::CONFLICT, "INDEX_MISMATCH"),
            ApiError::Core(Core::EmptyVocabulary) => (StatusCode::CONFLICT, "EMPTY_VOCABULARY"),
            ApiError::Core(Core::Storage { .. }) => (StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_ERROR"),
            ApiError::Core(Core::Schema { .. } | Core::EmptyCorpus | Core::Corpus { .. }) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "CORPUS_ERROR")
            }
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };
        if status.is_server_error() {
            tracing::error!("{self}");
        }

        let body = Json(json!({
            "error": {
                "code": code,
                "message": self.to_string()
            }
        }));

        (status, body).into_response()
    }
}
