use actix_web::{get, HttpResponse, Responder};

use crate::auth::AuthenticatedUser;

/// Returns the authenticated caller's own record.
#[get("/users/me")]
pub async fn me(user: AuthenticatedUser) -> impl Responder {
    HttpResponse::Ok().json(user.0)
}
