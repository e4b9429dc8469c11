//! Error types for Folio.
//!
//! Uses thiserror for ergonomic error definitions that integrate
//! with axum's response system. Every error belongs to one of three
//! families (see [`ErrorKind`]); data-access failures are reported to the
//! client with a generic message and logged with their cause.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

pub type Result<T> = std::result::Result<T, Error>;

/// Message shown for any data-access failure.
pub const GENERIC_FAILURE: &str = "Something went wrong. Please try again later.";

#[derive(Debug, thiserror::Error)]
pub enum Error {
    // Auth errors
    #[error("User not logged in")]
    Unauthenticated,

    #[error("Invalid email or password.")]
    InvalidCredentials,

    #[error("This email is already registered. Please use a different email or try logging in.")]
    EmailInUse,

    #[error("Password is too weak. Please use a stronger password.")]
    WeakPassword,

    #[error("Please enter a valid email address.")]
    InvalidEmail,

    #[error("Passwords do not match")]
    PasswordMismatch,

    #[error("No user is currently logged in.")]
    NoActiveUser,

    // Resource errors
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("User data not found")]
    UserDataNotFound,

    // Validation errors
    #[error("{0}")]
    Validation(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("File too large: max {max_size} bytes")]
    FileTooLarge { max_size: usize },

    #[error("Invalid file type: {0}")]
    InvalidFileType(String),

    // Data-access errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Internal error: {0}")]
    Internal(String),

    // Registration follow-up steps; the account already exists
    #[error("Failed to upload profile photo. Please try again later.")]
    ProfilePhotoUpload,

    #[error("Failed to save profile information. Please try again later.")]
    ProfileSave,

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

/// The three error families a client can observe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Shown inline on the auth form or as "not logged in".
    Auth,
    /// Shown as a generic banner, logged, never retried.
    DataAccess,
    /// Missing or malformed input.
    Validation,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Unauthenticated
            | Self::InvalidCredentials
            | Self::EmailInUse
            | Self::WeakPassword
            | Self::InvalidEmail
            | Self::PasswordMismatch
            | Self::NoActiveUser => ErrorKind::Auth,

            Self::NotFound(_)
            | Self::UserDataNotFound
            | Self::Validation(_)
            | Self::InvalidInput(_)
            | Self::FileTooLarge { .. }
            | Self::InvalidFileType(_) => ErrorKind::Validation,

            Self::Database(_)
            | Self::Storage(_)
            | Self::Internal(_)
            | Self::ProfilePhotoUpload
            | Self::ProfileSave
            | Self::Other(_) => ErrorKind::DataAccess,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            // 401
            Self::Unauthenticated | Self::InvalidCredentials | Self::NoActiveUser => {
                StatusCode::UNAUTHORIZED
            }

            // 404
            Self::NotFound(_) | Self::UserDataNotFound => StatusCode::NOT_FOUND,

            // 409
            Self::EmailInUse => StatusCode::CONFLICT,

            // 400
            Self::WeakPassword
            | Self::InvalidEmail
            | Self::PasswordMismatch
            | Self::Validation(_)
            | Self::InvalidInput(_)
            | Self::InvalidFileType(_) => StatusCode::BAD_REQUEST,

            // 413
            Self::FileTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,

            // 500
            Self::Database(_)
            | Self::Storage(_)
            | Self::Internal(_)
            | Self::ProfilePhotoUpload
            | Self::ProfileSave
            | Self::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "UNAUTHENTICATED",
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::EmailInUse => "EMAIL_IN_USE",
            Self::WeakPassword => "WEAK_PASSWORD",
            Self::InvalidEmail => "INVALID_EMAIL",
            Self::PasswordMismatch => "PASSWORD_MISMATCH",
            Self::NoActiveUser => "UNAUTHENTICATED",
            Self::NotFound(_) => "NOT_FOUND",
            Self::UserDataNotFound => "USER_DATA_NOT_FOUND",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::FileTooLarge { .. } => "FILE_TOO_LARGE",
            Self::InvalidFileType(_) => "INVALID_FILE_TYPE",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Storage(_) => "STORAGE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
            Self::ProfilePhotoUpload => "PROFILE_PHOTO_UPLOAD_FAILED",
            Self::ProfileSave => "PROFILE_SAVE_FAILED",
            Self::Other(_) => "UNKNOWN_ERROR",
        }
    }

    /// Message safe to show to the user.
    ///
    /// Data-access failures collapse into [`GENERIC_FAILURE`] unless they
    /// already carry a user-facing message.
    pub fn user_message(&self) -> String {
        match self {
            Self::ProfilePhotoUpload | Self::ProfileSave => self.to_string(),
            _ if self.kind() == ErrorKind::DataAccess => GENERIC_FAILURE.to_string(),
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.error_code();

        if self.kind() == ErrorKind::DataAccess {
            tracing::error!(code, error = %self, "Request failed");
        }

        let body = Json(json!({
            "error": {
                "code": code,
                "message": self.user_message(),
            }
        }));

        (status, body).into_response()
    }
}

// Convenience conversions
impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Internal(format!("Document encoding error: {}", err))
    }
}

impl From<axum::extract::multipart::MultipartError> for Error {
    fn from(err: axum::extract::multipart::MultipartError) -> Self {
        Self::InvalidInput(format!("Failed to read multipart field: {}", err))
    }
}
