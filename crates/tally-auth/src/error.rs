//! Authentication error types
//!
//! The taxonomy is a closed union: validation problems carry field-level
//! detail, authentication failures are deliberately generic so callers
//! cannot tell which factor failed, conflicts surface duplicate identities
//! at signup, and everything else is an infrastructure failure whose
//! detail stays server-side.

use tally_db::DbError;
use thiserror::Error;

/// A single field-level validation problem
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

#[derive(Error, Debug)]
pub enum AuthError {
    /// Malformed or missing input; recoverable, shown inline per field
    #[error("invalid input")]
    Validation(Vec<FieldError>),

    /// Bad credentials or an unusable session token
    #[error("invalid credentials")]
    Authentication,

    /// Duplicate email/username at signup
    #[error("{0}")]
    Conflict(String),

    /// Repository or crypto primitive failure; logged, never shown raw
    #[error("auth infrastructure failure: {0}")]
    Infrastructure(String),
}

impl From<DbError> for AuthError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Duplicate(msg) => AuthError::Conflict(msg),
            other => AuthError::Infrastructure(other.to_string()),
        }
    }
}

impl From<jsonwebtoken::errors::Error> for AuthError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        AuthError::Infrastructure(format!("token encoding failed: {}", err))
    }
}
