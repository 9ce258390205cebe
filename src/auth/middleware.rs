use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::{header, Method},
    web, Error, HttpMessage,
};
use futures::future::{ready, LocalBoxFuture, Ready};
use std::rc::Rc;

use crate::app::AppState;
use crate::auth::extractors::AuthenticatedUser;
use crate::error::AppError;
use crate::repository::users;

/// Authorization guard for every route that is not explicitly public.
///
/// Resolves the bearer token to a live user record and stores it in the request
/// extensions as an [`AuthenticatedUser`]. A request that fails here is answered
/// before any handler, and therefore any resource lookup, runs.
pub struct AuthMiddleware;

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = AuthMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService {
            service: Rc::new(service),
        }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: Rc<S>,
}

/// Routes reachable without a token.
fn is_public(method: &Method, path: &str) -> bool {
    if method == Method::OPTIONS {
        return true;
    }
    match path {
        "/health" | "/register" | "/login" => true,
        _ => method == Method::GET && path.starts_with("/uploads/"),
    }
}

fn bearer_token(req: &ServiceRequest) -> Option<String> {
    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| {
            value
                .strip_prefix("Bearer ")
                .or_else(|| value.strip_prefix("bearer "))
        })
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
}

async fn authenticate(req: &ServiceRequest) -> Result<AuthenticatedUser, AppError> {
    let token = bearer_token(req)
        .ok_or_else(|| AppError::Unauthorized("Not authenticated".into()))?;

    let state = req
        .app_data::<web::Data<AppState>>()
        .cloned()
        .ok_or_else(|| AppError::InternalServerError("Application state missing".into()))?;

    let claims = state.tokens.verify(&token).map_err(|e| {
        log::debug!("rejected bearer token: {}", e);
        AppError::from(e)
    })?;

    // The token alone is not enough: the user it names must still exist.
    match users::find_by_email(&state.pool, &claims.sub).await? {
        Some(user) => Ok(AuthenticatedUser(user)),
        None => {
            log::debug!("token subject no longer exists");
            Err(AppError::Unauthorized("Could not validate credentials".into()))
        }
    }
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);

        Box::pin(async move {
            if !is_public(req.method(), req.path()) {
                match authenticate(&req).await {
                    Ok(user) => {
                        req.extensions_mut().insert(user);
                    }
                    Err(app_err) => {
                        return Ok(req.error_response(app_err).map_into_right_body());
                    }
                }
            }

            service
                .call(req)
                .await
                .map(ServiceResponse::map_into_left_body)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_routes() {
        assert!(is_public(&Method::POST, "/login"));
        assert!(is_public(&Method::POST, "/register"));
        assert!(is_public(&Method::GET, "/health"));
        assert!(is_public(&Method::GET, "/uploads/abc.png"));
        assert!(is_public(&Method::OPTIONS, "/tasks"));

        assert!(!is_public(&Method::POST, "/uploads/abc.png"));
        assert!(!is_public(&Method::GET, "/tasks"));
        assert!(!is_public(&Method::GET, "/users/me"));
        assert!(!is_public(&Method::POST, "/upload"));
    }
}
