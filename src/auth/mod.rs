pub mod extractors;
pub mod middleware;
pub mod password;
pub mod token;

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use validator::Validate;

pub use extractors::AuthenticatedUser;
pub use middleware::AuthMiddleware;
pub use password::{hash_password, verify_password};
pub use token::{Claims, TokenError, TokenService};

lazy_static! {
    // Regex for username validation: alphanumeric, underscores, hyphens
    static ref USERNAME_REGEX: regex::Regex = regex::Regex::new(r"^[a-zA-Z0-9_-]+$").unwrap();
}

/// Represents the payload for a user login request.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

/// OAuth2 password-grant form, as sent by form-based clients.
/// The `username` field carries the account's email address.
#[derive(Debug, Deserialize)]
pub struct PasswordGrantForm {
    pub username: String,
    pub password: String,
}

impl From<PasswordGrantForm> for LoginRequest {
    fn from(form: PasswordGrantForm) -> Self {
        LoginRequest {
            email: form.username,
            password: form.password,
        }
    }
}

/// Represents the payload for a new user registration request.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Desired username for the new account.
    /// Must be between 3 and 32 characters, alphanumeric, and can include underscores or hyphens.
    #[validate(
        length(min = 3, max = 32),
        regex(
            path = "USERNAME_REGEX",
            message = "Username must be alphanumeric, underscores, or hyphens"
        )
    )]
    pub username: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, max = 128))]
    pub password: String,
}

/// Response body of a successful login.
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
}

impl TokenResponse {
    pub fn bearer(access_token: String) -> Self {
        Self {
            access_token,
            token_type: "bearer".to_string(),
        }
    }
}
