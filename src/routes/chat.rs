use actix_web::{post, web, HttpResponse, Responder};
use validator::Validate;

use crate::{
    app::AppState,
    auth::AuthenticatedUser,
    error::AppError,
    services::chat::{self as chat_service, ChatRequest, ChatResponse},
};

/// Forwards a chat message, with its recent history, to the AI assistant.
///
/// ## Responses:
/// - `200 OK`: `{"reply": "..."}`.
/// - `503 Service Unavailable`: no AI credential configured.
/// - `500 Internal Server Error`: the AI service call failed.
#[post("/chat")]
pub async fn chat(
    state: web::Data<AppState>,
    _user: AuthenticatedUser,
    request: web::Json<ChatRequest>,
) -> Result<impl Responder, AppError> {
    request.validate()?;
    let reply = chat_service::send(state.chat.as_deref(), &request.message, &request.history).await?;
    Ok(HttpResponse::Ok().json(ChatResponse { reply }))
}
