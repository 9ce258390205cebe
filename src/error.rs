//!
//! # Custom Error Handling
//!
//! This module defines the custom error type `AppError` used throughout the application.
//! Every failure a client can observe maps to exactly one variant, and every variant maps
//! to a stable HTTP status code plus a JSON body of the form `{"detail": "<message>"}`.
//!
//! `AppError` implements `actix_web::error::ResponseError`, and provides `From`
//! implementations for the library errors that surface in handlers (`sqlx`, `validator`,
//! `bcrypt`, `jsonwebtoken`, `reqwest`, I/O), so `?` can be used throughout.

use actix_web::{
    error::{BlockingError, ResponseError},
    http::{header, StatusCode},
    HttpResponse,
};
use serde_json::json;
use std::fmt;
use validator::ValidationErrors;

use crate::auth::token::TokenError;

/// Represents all possible errors that can occur within the application.
#[derive(Debug)]
pub enum AppError {
    /// Registration attempted with an email that is already registered (HTTP 400).
    DuplicateEmail,
    /// Registration attempted with a username that is already taken (HTTP 400).
    DuplicateUsername,
    /// Represents a client-side error due to a malformed or invalid request (HTTP 400).
    BadRequest(String),
    /// Missing, malformed or expired credentials, or a token whose user no longer
    /// exists (HTTP 401).
    Unauthorized(String),
    /// The resource does not exist or is owned by someone else (HTTP 404).
    /// The two cases are deliberately indistinguishable.
    NotFound(String),
    /// Represents an error due to failed input validation (HTTP 422 Unprocessable Entity).
    ValidationError(String),
    /// An optional collaborator (the AI chat service) is not configured (HTTP 503).
    ServiceUnavailable(String),
    /// A call to an external collaborator failed (HTTP 500).
    UpstreamError(String),
    /// Represents an error originating from database operations (HTTP 500).
    DatabaseError(String),
    /// Represents an unexpected server-side error (HTTP 500).
    InternalServerError(String),
}

impl AppError {
    /// The human-readable message sent back in the `detail` field.
    pub fn detail(&self) -> String {
        match self {
            AppError::DuplicateEmail => "Email already registered".to_string(),
            AppError::DuplicateUsername => "Username already taken".to_string(),
            AppError::BadRequest(msg)
            | AppError::Unauthorized(msg)
            | AppError::NotFound(msg)
            | AppError::ValidationError(msg)
            | AppError::ServiceUnavailable(msg)
            | AppError::UpstreamError(msg)
            | AppError::DatabaseError(msg)
            | AppError::InternalServerError(msg) => msg.clone(),
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AppError::DuplicateEmail | AppError::DuplicateUsername => {
                write!(f, "Bad Request: {}", self.detail())
            }
            AppError::BadRequest(msg) => write!(f, "Bad Request: {}", msg),
            AppError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not Found: {}", msg),
            AppError::ValidationError(msg) => write!(f, "Validation Error: {}", msg),
            AppError::ServiceUnavailable(msg) => write!(f, "Service Unavailable: {}", msg),
            AppError::UpstreamError(msg) => write!(f, "Upstream Error: {}", msg),
            AppError::DatabaseError(msg) => write!(f, "Database Error: {}", msg),
            AppError::InternalServerError(msg) => write!(f, "Internal Server Error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

/// Converts `AppError` variants into `HttpResponse` objects.
impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::DuplicateEmail | AppError::DuplicateUsername | AppError::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::ValidationError(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::UpstreamError(_)
            | AppError::DatabaseError(_)
            | AppError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let mut response = HttpResponse::build(self.status_code());
        if let AppError::Unauthorized(_) = self {
            response.insert_header((header::WWW_AUTHENTICATE, "Bearer"));
        }
        response.json(json!({ "detail": self.detail() }))
    }
}

/// Converts `sqlx::Error` into `AppError`.
///
/// Unique-constraint violations on the user table become the duplicate-registration
/// variants, so a registration that loses the race against a concurrent one still
/// gets a client error rather than a 500.
impl From<sqlx::Error> for AppError {
    fn from(error: sqlx::Error) -> AppError {
        match &error {
            sqlx::Error::RowNotFound => AppError::NotFound("Record not found".into()),
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                let message = db_err.message();
                if message.contains("users.email") {
                    AppError::DuplicateEmail
                } else if message.contains("users.username") {
                    AppError::DuplicateUsername
                } else {
                    AppError::BadRequest("Resource already exists".into())
                }
            }
            _ => {
                log::error!("database error: {}", error);
                AppError::DatabaseError("Database error".into())
            }
        }
    }
}

impl From<sqlx::migrate::MigrateError> for AppError {
    fn from(error: sqlx::migrate::MigrateError) -> AppError {
        AppError::DatabaseError(format!("Migration failed: {}", error))
    }
}

/// Converts `validator::ValidationErrors` into `AppError::ValidationError`.
impl From<ValidationErrors> for AppError {
    fn from(error: ValidationErrors) -> AppError {
        AppError::ValidationError(error.to_string())
    }
}

impl From<TokenError> for AppError {
    fn from(error: TokenError) -> AppError {
        AppError::Unauthorized(error.to_string())
    }
}

/// Token *encoding* failures only; decoding goes through `TokenError`.
impl From<jsonwebtoken::errors::Error> for AppError {
    fn from(error: jsonwebtoken::errors::Error) -> AppError {
        AppError::InternalServerError(format!("Failed to generate token: {}", error))
    }
}

impl From<bcrypt::BcryptError> for AppError {
    fn from(error: bcrypt::BcryptError) -> AppError {
        AppError::InternalServerError(error.to_string())
    }
}

impl From<BlockingError> for AppError {
    fn from(error: BlockingError) -> AppError {
        AppError::InternalServerError(error.to_string())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(error: reqwest::Error) -> AppError {
        AppError::UpstreamError(format!("AI service request failed: {}", error))
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> AppError {
        AppError::InternalServerError(error.to_string())
    }
}
