#![allow(dead_code)]

use actix_http::Request;
use actix_web::{
    body::MessageBody,
    dev::{Service, ServiceResponse},
    http::header,
    test, web, Error,
};
use async_trait::async_trait;
use chrono::Duration;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

use project_tracker::{
    auth::TokenService, db, services::ChatGenerator, services::FileStore, AppError, AppState,
};

pub const PASSWORD: &str = "pw1";

/// Chat generator that answers with a fixed reply and remembers the last prompt.
#[derive(Default)]
pub struct CannedChat {
    pub last_prompt: Mutex<Option<String>>,
}

#[async_trait]
impl ChatGenerator for CannedChat {
    async fn generate(&self, prompt: &str) -> Result<String, AppError> {
        if let Ok(mut last) = self.last_prompt.lock() {
            *last = Some(prompt.to_string());
        }
        Ok("Start with the overdue tasks.".to_string())
    }
}

/// Chat generator whose upstream always fails.
pub struct BrokenChat;

#[async_trait]
impl ChatGenerator for BrokenChat {
    async fn generate(&self, _prompt: &str) -> Result<String, AppError> {
        Err(AppError::UpstreamError("connection reset".into()))
    }
}

/// Application state over a fresh in-memory store and a throwaway upload directory.
pub async fn test_state() -> AppState {
    let pool = db::connect_in_memory()
        .await
        .expect("Failed to set up in-memory database");
    let tokens = TokenService::new("test-secret", Duration::minutes(30));
    let upload_dir = std::env::temp_dir().join(format!("tracker-uploads-{}", uuid::Uuid::new_v4()));

    AppState::new(pool, tokens, FileStore::new(upload_dir))
        .with_bcrypt_cost(4)
        .with_cors_origins(vec!["http://localhost:5173".to_string()])
}

pub async fn test_data() -> web::Data<AppState> {
    web::Data::new(test_state().await)
}

pub async fn test_data_with_chat(chat: Arc<dyn ChatGenerator>) -> web::Data<AppState> {
    web::Data::new(test_state().await.with_chat(chat))
}

pub fn bearer(token: &str) -> (header::HeaderName, String) {
    (header::AUTHORIZATION, format!("Bearer {}", token))
}

pub async fn register<S, B>(app: &S, username: &str, email: &str) -> ServiceResponse<B>
where
    S: Service<Request, Response = ServiceResponse<B>, Error = Error>,
    B: MessageBody,
{
    let req = test::TestRequest::post()
        .uri("/register")
        .set_json(json!({ "username": username, "email": email, "password": PASSWORD }))
        .to_request();
    test::call_service(app, req).await
}

pub async fn login<S, B>(app: &S, email: &str, password: &str) -> ServiceResponse<B>
where
    S: Service<Request, Response = ServiceResponse<B>, Error = Error>,
    B: MessageBody,
{
    let req = test::TestRequest::post()
        .uri("/login")
        .set_json(json!({ "email": email, "password": password }))
        .to_request();
    test::call_service(app, req).await
}

/// Registers `username` (email `<username>@example.com`) and returns a fresh token.
pub async fn sign_up<S, B>(app: &S, username: &str) -> String
where
    S: Service<Request, Response = ServiceResponse<B>, Error = Error>,
    B: MessageBody,
{
    let email = format!("{}@example.com", username);
    let resp = register(app, username, &email).await;
    assert_eq!(resp.status(), 201, "registration of {} failed", username);

    let resp = login(app, &email, PASSWORD).await;
    assert_eq!(resp.status(), 200, "login of {} failed", username);
    let body: Value = test::read_body_json(resp).await;
    body["access_token"]
        .as_str()
        .expect("access_token missing")
        .to_string()
}

pub async fn create_task<S, B>(app: &S, token: &str, payload: Value) -> Value
where
    S: Service<Request, Response = ServiceResponse<B>, Error = Error>,
    B: MessageBody,
{
    let req = test::TestRequest::post()
        .uri("/tasks")
        .insert_header(bearer(token))
        .set_json(payload)
        .to_request();
    let resp = test::call_service(app, req).await;
    assert_eq!(resp.status(), 201);
    test::read_body_json(resp).await
}

pub async fn create_project<S, B>(app: &S, token: &str, name: &str) -> Value
where
    S: Service<Request, Response = ServiceResponse<B>, Error = Error>,
    B: MessageBody,
{
    let req = test::TestRequest::post()
        .uri("/projects")
        .insert_header(bearer(token))
        .set_json(json!({ "name": name }))
        .to_request();
    let resp = test::call_service(app, req).await;
    assert_eq!(resp.status(), 201);
    test::read_body_json(resp).await
}

/// Sends `method uri` with the bearer token and an optional JSON body.
pub async fn send<S, B>(
    app: &S,
    req: test::TestRequest,
    token: &str,
    body: Option<Value>,
) -> ServiceResponse<B>
where
    S: Service<Request, Response = ServiceResponse<B>, Error = Error>,
    B: MessageBody,
{
    let req = req.insert_header(bearer(token));
    let req = match body {
        Some(body) => req.set_json(body),
        None => req,
    };
    test::call_service(app, req.to_request()).await
}
