use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::error::AlchemyError;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`AlchemyError`] for domain errors and adds HTTP-specific variants.
/// Renders as `{"error": "...", "code": "..."}`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Domain(#[from] AlchemyError),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

fn internal(err: &dyn std::fmt::Display) -> (StatusCode, &'static str, String) {
    tracing::error!(error = %err, "internal error");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        "An internal error occurred".to_string(),
    )
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            ApiError::Domain(err) => match err {
                AlchemyError::SigilNotFound { .. }
                | AlchemyError::EmptySigil { .. }
                | AlchemyError::RitualNotFound(_)
                | AlchemyError::MetadataNotFound(_) => {
                    (StatusCode::NOT_FOUND, "NOT_FOUND", err.to_string())
                }
                AlchemyError::InvalidSigilName(_)
                | AlchemyError::Validation(_)
                | AlchemyError::DimensionMismatch { .. } => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", err.to_string())
                }
                AlchemyError::InvalidJson { .. }
                | AlchemyError::NotAList { .. }
                | AlchemyError::MalformedGlyph { .. } => {
                    (StatusCode::BAD_REQUEST, "INVALID_VAULT_DATA", err.to_string())
                }
                AlchemyError::DuplicateRitual(_) => {
                    (StatusCode::CONFLICT, "CONFLICT", err.to_string())
                }
                AlchemyError::Io(_) | AlchemyError::Json(_) | AlchemyError::Database(_) => internal(err),
            },
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            ApiError::Internal(msg) => internal(msg),
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: impl Into<ApiError>) -> StatusCode {
        err.into().into_response().status()
    }

    #[test]
    fn domain_errors_map_to_statuses() {
        assert_eq!(status_of(AlchemyError::RitualNotFound(1)), StatusCode::NOT_FOUND);
        assert_eq!(
            status_of(AlchemyError::EmptySigil { sigil: "x".into() }),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(AlchemyError::DuplicateRitual("x".into())),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(AlchemyError::InvalidSigilName("../x".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(AlchemyError::Io(std::io::Error::other("disk"))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(status_of(ApiError::BadRequest("no".into())), StatusCode::BAD_REQUEST);
    }
}
