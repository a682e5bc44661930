/// Error types for Photo Service
///
/// Every failure a handler can produce is an `AppError`; the `ResponseError`
/// impl decides the HTTP shape (redirect for a missing session, JSON body
/// for everything else).
use actix_web::{error::ResponseError, http::header, http::StatusCode, HttpResponse};
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

/// Result type for photo-service operations
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error types
#[derive(Debug, Error)]
pub enum AppError {
    /// No valid session on the request
    #[error("Authentication required")]
    Unauthenticated,

    /// Login failed; deliberately silent about which half was wrong
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Username already exists")]
    DuplicateUsername,

    #[error("Email already exists")]
    DuplicateEmail,

    #[error("Database error: {0}")]
    Database(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// JSON error body returned to clients
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status: u16,
    pub error_type: String,
    pub code: String,
    pub timestamp: DateTime<Utc>,
}

impl ErrorResponse {
    pub fn new(error: &str, message: &str, status: u16, error_type: &str, code: &str) -> Self {
        Self {
            error: error.to_string(),
            message: message.to_string(),
            status,
            error_type: error_type.to_string(),
            code: code.to_string(),
            timestamp: Utc::now(),
        }
    }
}

impl AppError {
    /// True for the registration conflict class (duplicate username or email)
    pub fn is_duplicate_credential(&self) -> bool {
        matches!(self, AppError::DuplicateUsername | AppError::DuplicateEmail)
    }

    fn kind(&self) -> (&'static str, &'static str) {
        match self {
            AppError::Unauthenticated => ("authentication_error", "UNAUTHENTICATED"),
            AppError::InvalidCredentials => ("authentication_error", "INVALID_CREDENTIALS"),
            AppError::Forbidden(_) => ("authorization_error", "FORBIDDEN"),
            AppError::NotFound(_) => ("not_found_error", "NOT_FOUND"),
            AppError::Validation(_) => ("validation_error", "VALIDATION_ERROR"),
            AppError::DuplicateUsername => ("conflict_error", "DUPLICATE_USERNAME"),
            AppError::DuplicateEmail => ("conflict_error", "DUPLICATE_EMAIL"),
            AppError::Database(_) => ("server_error", "DATABASE_ERROR"),
            AppError::Io(_) => ("server_error", "IO_ERROR"),
            AppError::Internal(_) => ("server_error", "INTERNAL_SERVER_ERROR"),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthenticated => StatusCode::SEE_OTHER,
            AppError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::DuplicateUsername | AppError::DuplicateEmail => StatusCode::CONFLICT,
            AppError::Database(_) | AppError::Io(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        if let AppError::Unauthenticated = self {
            return HttpResponse::SeeOther()
                .insert_header((header::LOCATION, "/"))
                .finish();
        }

        let status = self.status_code();
        let (error_type, code) = self.kind();

        // Server-side failures are logged here and not echoed to the client
        let message = match self {
            AppError::Database(_) | AppError::Io(_) | AppError::Internal(_) => {
                tracing::error!(error = %self, "request failed");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        let response = ErrorResponse::new(
            status.canonical_reason().unwrap_or("Error"),
            &message,
            status.as_u16(),
            error_type,
            code,
        );

        HttpResponse::build(status).json(response)
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => AppError::NotFound("Row not found".to_string()),
            other => AppError::Database(other.to_string()),
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Io(err.to_string())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields: Vec<String> = errors
            .field_errors()
            .into_iter()
            .map(|(field, errs)| {
                let reasons: Vec<String> = errs
                    .iter()
                    .map(|e| {
                        e.message
                            .as_ref()
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| e.code.to_string())
                    })
                    .collect();
                format!("{}: {}", field, reasons.join(", "))
            })
            .collect();
        fields.sort();
        AppError::Validation(fields.join("; "))
    }
}

impl From<argon2::password_hash::Error> for AppError {
    fn from(err: argon2::password_hash::Error) -> Self {
        AppError::Internal(format!("Password hashing failed: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    #[test]
    fn test_status_mapping() {
        assert_eq!(AppError::Unauthenticated.status_code(), StatusCode::SEE_OTHER);
        assert_eq!(
            AppError::InvalidCredentials.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::Forbidden("x".into()).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::NotFound("x".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Validation("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(AppError::DuplicateEmail.status_code(), StatusCode::CONFLICT);
        assert_eq!(
            AppError::Database("x".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_unauthenticated_redirects_to_login() {
        let resp = AppError::Unauthenticated.error_response();
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(resp.headers().get(header::LOCATION).unwrap(), "/");
    }

    #[actix_web::test]
    async fn test_internal_details_are_not_exposed() {
        let resp = AppError::Database("password authentication failed".into()).error_response();
        let body = to_bytes(resp.into_body()).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["message"], "Internal server error");
        assert_eq!(json["code"], "DATABASE_ERROR");
    }

    #[test]
    fn test_duplicate_credential_class() {
        assert!(AppError::DuplicateUsername.is_duplicate_credential());
        assert!(AppError::DuplicateEmail.is_duplicate_credential());
        assert!(!AppError::InvalidCredentials.is_duplicate_credential());
    }
}
