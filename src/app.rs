//! Application assembly.
//!
//! `AppState` carries the injected collaborators (store, token service, chat
//! generator, file store); `build_app` wires them into one `App` with the full route
//! table and middleware stack. Both the server binary and the test suites go through
//! `build_app`, so tests exercise exactly what ships.

use actix_cors::Cors;
use actix_web::{
    body::MessageBody,
    dev::{ServiceFactory, ServiceRequest, ServiceResponse},
    middleware::Logger,
    web, App, Error,
};
use chrono::Duration;
use sqlx::SqlitePool;
use std::sync::Arc;

use crate::auth::{AuthMiddleware, TokenService};
use crate::config::Config;
use crate::db;
use crate::error::AppError;
use crate::routes;
use crate::services::{ChatGenerator, FileStore, OpenAiChat};

/// Largest accepted request body for uploads.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

pub struct AppState {
    pub pool: SqlitePool,
    pub tokens: TokenService,
    pub bcrypt_cost: u32,
    /// `None` when no AI credential is configured.
    pub chat: Option<Arc<dyn ChatGenerator>>,
    pub files: FileStore,
    pub cors_allowed_origins: Vec<String>,
}

impl AppState {
    pub fn new(pool: SqlitePool, tokens: TokenService, files: FileStore) -> Self {
        Self {
            pool,
            tokens,
            bcrypt_cost: bcrypt::DEFAULT_COST,
            chat: None,
            files,
            cors_allowed_origins: Vec::new(),
        }
    }

    pub fn with_chat(mut self, chat: Arc<dyn ChatGenerator>) -> Self {
        self.chat = Some(chat);
        self
    }

    pub fn with_bcrypt_cost(mut self, cost: u32) -> Self {
        self.bcrypt_cost = cost;
        self
    }

    pub fn with_cors_origins(mut self, origins: Vec<String>) -> Self {
        self.cors_allowed_origins = origins;
        self
    }

    /// Connects the store, applies migrations, and builds every collaborator from
    /// `config`.
    pub async fn from_config(config: &Config) -> Result<Self, AppError> {
        let pool = db::connect(&config.database_url, config.database_max_connections).await?;
        db::run_migrations(&pool).await?;

        let ttl = Duration::try_minutes(config.token_ttl_minutes).ok_or_else(|| {
            AppError::InternalServerError("Token lifetime out of range".into())
        })?;
        let tokens = TokenService::new(&config.jwt_secret, ttl);

        let mut state = AppState::new(pool, tokens, FileStore::new(config.upload_dir.clone()))
            .with_bcrypt_cost(config.bcrypt_cost)
            .with_cors_origins(config.cors_allowed_origins.clone());

        match &config.ai_api_key {
            Some(key) => {
                state = state.with_chat(Arc::new(OpenAiChat::new(
                    config.ai_api_url.clone(),
                    key.clone(),
                    config.ai_model.clone(),
                )));
            }
            None => log::warn!("AI_API_KEY not set; /chat will answer 503"),
        }

        Ok(state)
    }
}

fn cors(origins: &[String]) -> Cors {
    origins
        .iter()
        .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
        .allow_any_method()
        .allow_any_header()
        .supports_credentials()
        .max_age(3600)
}

/// Malformed JSON, form and query input answers with the same error body as
/// every other failure.
fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .error_handler(|err, _req| AppError::BadRequest(err.to_string()).into())
}

fn form_config() -> web::FormConfig {
    web::FormConfig::default()
        .error_handler(|err, _req| AppError::BadRequest(err.to_string()).into())
}

fn query_config() -> web::QueryConfig {
    web::QueryConfig::default()
        .error_handler(|err, _req| AppError::BadRequest(err.to_string()).into())
}

pub fn build_app(
    state: web::Data<AppState>,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl MessageBody>,
        Error = Error,
        InitError = (),
    >,
> {
    let cors = cors(&state.cors_allowed_origins);

    App::new()
        .app_data(state)
        .app_data(json_config())
        .app_data(form_config())
        .app_data(query_config())
        .app_data(web::PayloadConfig::new(MAX_UPLOAD_BYTES))
        .wrap(AuthMiddleware)
        .wrap(cors)
        .wrap(Logger::default())
        .configure(routes::config)
}
