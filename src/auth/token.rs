use crate::error::AppError;
use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Represents the claims encoded within an access token.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Subject of the token: the user's email address.
    pub sub: String,
    /// Expiration timestamp (seconds since epoch).
    pub exp: usize,
    /// Issued-at timestamp (seconds since epoch).
    pub iat: usize,
}

/// Why a presented token was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    Expired,
    Malformed,
    InvalidSignature,
}

impl fmt::Display for TokenError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TokenError::Expired => write!(f, "Token has expired"),
            TokenError::Malformed => write!(f, "Malformed token"),
            TokenError::InvalidSignature => write!(f, "Invalid token signature"),
        }
    }
}

impl std::error::Error for TokenError {}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(error: jsonwebtoken::errors::Error) -> Self {
        match error.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            ErrorKind::InvalidSignature => TokenError::InvalidSignature,
            _ => TokenError::Malformed,
        }
    }
}

/// Issues and verifies HS256-signed bearer tokens with a server-held secret.
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issues a token for `subject` using the configured TTL.
    pub fn issue(&self, subject: &str) -> Result<String, AppError> {
        self.issue_with_ttl(subject, self.ttl)
    }

    pub fn issue_with_ttl(&self, subject: &str, ttl: Duration) -> Result<String, AppError> {
        let now = Utc::now();
        let expiration = now
            .checked_add_signed(ttl)
            .ok_or_else(|| AppError::InternalServerError("Token expiry out of range".into()))?;

        let claims = Claims {
            sub: subject.to_string(),
            exp: expiration.timestamp().max(0) as usize,
            iat: now.timestamp().max(0) as usize,
        };

        Ok(encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?)
    }

    /// Verifies the signature and expiry of `token`.
    ///
    /// No leeway is applied: a token is rejected the second its `exp` passes.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(TokenError::from)
    }
}
