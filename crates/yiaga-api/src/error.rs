//! API error type and JSON extractor.

use axum::{
    Json,
    extract::{
        FromRequest, FromRequestParts,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use yiaga_core::{StoreError, ValidationError};

use crate::auth::AuthError;

/// Errors surfaced by handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed request body or missing/invalid field (400).
    #[error("{0}")]
    Validation(String),

    /// Duplicate value in a unique field (400).
    #[error("{0}")]
    Conflict(String),

    /// Authentication failed (401).
    #[error(transparent)]
    Auth(AuthError),

    /// Unknown id, slug, or path (404).
    #[error("{0}")]
    NotFound(String),

    /// Hashing, signing, storage, or filesystem failure (500).
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Handler result.
pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    /// HTTP status and machine-readable code.
    #[must_use]
    pub const fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::Validation(_) => (StatusCode::BAD_REQUEST, "validation_error"),
            Self::Conflict(_) => (StatusCode::BAD_REQUEST, "conflict"),
            Self::Auth(e) => (StatusCode::UNAUTHORIZED, e.code()),
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        if err.is_internal() {
            Self::Internal(err.to_string())
        } else {
            Self::Auth(err)
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict { .. } => Self::Conflict(err.to_string()),
            StoreError::NotFound { .. } => Self::NotFound(err.to_string()),
            StoreError::Storage(_) | StoreError::Serialization(_) => Self::Internal(err.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl From<std::io::Error> for ApiError {
    fn from(err: std::io::Error) -> Self {
        Self::Internal(format!("I/O error: {err}"))
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::Internal(format!("Blocking task failed: {err}"))
    }
}

/// Error response body.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
    code: &'static str,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let error = if let Self::Internal(detail) = &self {
            tracing::error!(error = %detail, "Request failed");
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        (status, Json(ErrorResponse { error, code })).into_response()
    }
}

/// JSON body extractor whose rejections are reported as `validation_error`.
#[derive(Debug, Clone, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct JsonBody<T>(pub T);

/// Query string extractor whose rejections are reported as `validation_error`.
#[derive(Debug, Clone, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct QueryParams<T>(pub T);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (ApiError::Validation("x".into()), StatusCode::BAD_REQUEST, "validation_error"),
            (ApiError::Conflict("x".into()), StatusCode::BAD_REQUEST, "conflict"),
            (ApiError::Auth(AuthError::Expired), StatusCode::UNAUTHORIZED, "token_expired"),
            (ApiError::NotFound("x".into()), StatusCode::NOT_FOUND, "not_found"),
            (ApiError::Internal("x".into()), StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        ];
        for (err, status, code) in cases {
            assert_eq!(err.status_and_code(), (status, code));
        }
    }

    #[test]
    fn test_conversions() {
        let conflict = StoreError::Conflict {
            field: "slug",
            value: "a".into(),
        };
        assert!(matches!(ApiError::from(conflict), ApiError::Conflict(_)));

        let missing = StoreError::NotFound {
            collection: "jobs",
            id: 3,
        };
        assert!(matches!(ApiError::from(missing), ApiError::NotFound(_)));

        assert!(matches!(
            ApiError::from(AuthError::Hashing("boom".into())),
            ApiError::Internal(_)
        ));
        assert!(matches!(
            ApiError::from(AuthError::MissingHeader),
            ApiError::Auth(AuthError::MissingHeader)
        ));
    }

    #[tokio::test]
    async fn test_internal_detail_hidden() {
        let response = ApiError::Internal("sled exploded at /var/lib".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "Internal server error");
        assert_eq!(json["code"], "internal_error");
    }
}
