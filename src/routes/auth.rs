use actix_web::{post, web, Either, HttpResponse, Responder};
use validator::Validate;

use crate::{
    app::AppState,
    auth::{
        password::{hash_password_blocking, verify_password_blocking},
        LoginRequest, PasswordGrantForm, RegisterRequest, TokenResponse,
    },
    error::AppError,
    repository::users,
};

/// Register a new user
///
/// ## Responses:
/// - `201 Created`: the new `User` (no password material).
/// - `400 Bad Request`: email already registered, or username already taken.
/// - `422 Unprocessable Entity`: invalid username, email or password.
#[post("/register")]
pub async fn register(
    state: web::Data<AppState>,
    register_data: web::Json<RegisterRequest>,
) -> Result<impl Responder, AppError> {
    register_data.validate()?;
    let RegisterRequest {
        username,
        email,
        password,
    } = register_data.into_inner();

    // Cheap pre-checks first so a duplicate never pays for a bcrypt round.
    if users::find_by_email(&state.pool, &email).await?.is_some() {
        return Err(AppError::DuplicateEmail);
    }
    if users::find_by_username(&state.pool, &username).await?.is_some() {
        return Err(AppError::DuplicateUsername);
    }

    let password_hash = hash_password_blocking(password, state.bcrypt_cost).await?;
    let user = users::create_user(&state.pool, &username, &email, &password_hash).await?;
    log::info!("registered user {}", user.id);

    Ok(HttpResponse::Created().json(user))
}

/// Login user
///
/// Accepts either a JSON body `{email, password}` or an OAuth2 password form
/// (`username=<email>&password=...`).
///
/// ## Responses:
/// - `200 OK`: `{access_token, token_type: "bearer"}`.
/// - `401 Unauthorized`: unknown email or wrong password (indistinguishable).
#[post("/login")]
pub async fn login(
    state: web::Data<AppState>,
    login_data: Either<web::Json<LoginRequest>, web::Form<PasswordGrantForm>>,
) -> Result<impl Responder, AppError> {
    let login_data: LoginRequest = match login_data {
        Either::Left(json) => json.into_inner(),
        Either::Right(form) => form.into_inner().into(),
    };
    let invalid = || AppError::Unauthorized("Incorrect email or password".into());

    // A malformed email can never match an account.
    if login_data.validate().is_err() {
        return Err(invalid());
    }

    let credentials = match users::find_credentials_by_email(&state.pool, &login_data.email).await? {
        Some(credentials) => credentials,
        None => {
            log::info!("failed login for unknown email {}", login_data.email);
            return Err(invalid());
        }
    };

    if !verify_password_blocking(login_data.password, credentials.hashed_password).await? {
        log::info!("failed login for {}", credentials.email);
        return Err(invalid());
    }

    let token = state.tokens.issue(&credentials.email)?;
    Ok(HttpResponse::Ok().json(TokenResponse::bearer(token)))
}
