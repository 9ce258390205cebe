use actix_web::dev::Payload;
use actix_web::{Error as ActixError, FromRequest, HttpMessage, HttpRequest};
use std::future::{ready, Ready};

use crate::error::AppError;
use crate::models::User;

/// The caller resolved by `AuthMiddleware`: a user record that existed when the
/// request was admitted.
///
/// Only routes behind `AuthMiddleware` can extract it; anywhere else the extractor
/// fails with `AppError::Unauthorized`.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

impl AuthenticatedUser {
    pub fn id(&self) -> i64 {
        self.0.id
    }
}

impl FromRequest for AuthenticatedUser {
    type Error = ActixError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        match req.extensions().get::<AuthenticatedUser>().cloned() {
            Some(user) => ready(Ok(user)),
            None => {
                let err = AppError::Unauthorized("Not authenticated".to_string());
                ready(Err(err.into()))
            }
        }
    }
}
