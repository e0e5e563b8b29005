//! API error types

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tally_auth::AuthError;
use tally_db::DbError;
use thiserror::Error;
use tracing::error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden")]
    Forbidden,

    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    #[error("Database error: {0}")]
    Database(#[from] DbError),
}

/// Shown for any failure whose detail must stay server-side
const GENERIC_FAILURE: &str = "Something went wrong. Please try again.";
/// Shown for every credential failure, whichever factor was wrong
const GENERIC_CREDENTIALS: &str = "Invalid email or password";

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, json!({ "error": msg })),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, json!({ "error": msg })),
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                json!({ "error": "Unauthorized" }),
            ),
            ApiError::Forbidden => (StatusCode::FORBIDDEN, json!({ "error": "Forbidden" })),
            ApiError::Auth(err) => match err {
                AuthError::Validation(problems) => {
                    let fields: Vec<_> = problems
                        .iter()
                        .map(|p| json!({ "field": p.field, "message": p.message }))
                        .collect();
                    (
                        StatusCode::UNPROCESSABLE_ENTITY,
                        json!({ "error": "Invalid input", "fields": fields }),
                    )
                }
                AuthError::Authentication => (
                    StatusCode::UNAUTHORIZED,
                    json!({ "error": GENERIC_CREDENTIALS }),
                ),
                AuthError::Conflict(msg) => (StatusCode::CONFLICT, json!({ "error": msg })),
                AuthError::Infrastructure(detail) => {
                    error!("Auth infrastructure failure: {}", detail);
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        json!({ "error": GENERIC_FAILURE }),
                    )
                }
            },
            ApiError::Database(err) => match err {
                DbError::NotFound(msg) => (StatusCode::NOT_FOUND, json!({ "error": msg })),
                DbError::Duplicate(msg) => (StatusCode::CONFLICT, json!({ "error": msg })),
                other => {
                    error!("Database failure: {}", other);
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        json!({ "error": GENERIC_FAILURE }),
                    )
                }
            },
        };

        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tally_auth::FieldError;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (
                ApiError::Auth(AuthError::Authentication),
                StatusCode::UNAUTHORIZED,
            ),
            (
                ApiError::Auth(AuthError::Conflict("taken".into())),
                StatusCode::CONFLICT,
            ),
            (
                ApiError::Auth(AuthError::Validation(vec![FieldError::new(
                    "email", "bad",
                )])),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                ApiError::Auth(AuthError::Infrastructure("boom".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (ApiError::Unauthorized, StatusCode::UNAUTHORIZED),
            (ApiError::Forbidden, StatusCode::FORBIDDEN),
        ];

        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }
}
