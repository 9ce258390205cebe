use actix_web::{get, http::header, post, web, HttpResponse, Responder};
use serde::Deserialize;
use serde_json::json;

use crate::{
    app::AppState,
    auth::AuthenticatedUser,
    error::AppError,
    services::files::{content_type_for, FileStore},
};

#[derive(Debug, Deserialize)]
pub struct UploadQuery {
    pub filename: Option<String>,
}

/// Stores the raw request body as a file.
///
/// The original name (query parameter `filename`) only contributes its extension.
///
/// ## Responses:
/// - `201 Created`: `{"filename": "...", "url": "/uploads/..."}`.
/// - `400 Bad Request`: empty body.
#[post("/upload")]
pub async fn upload(
    state: web::Data<AppState>,
    _user: AuthenticatedUser,
    query: web::Query<UploadQuery>,
    body: web::Bytes,
) -> Result<impl Responder, AppError> {
    let original_name = query.filename.as_deref().unwrap_or("");
    let filename = state.files.save(original_name, &body).await?;
    let url = FileStore::public_url(&filename);
    Ok(HttpResponse::Created().json(json!({ "filename": filename, "url": url })))
}

/// Serves a previously uploaded file. Public, like any static asset path.
#[get("/uploads/{filename}")]
pub async fn serve_upload(
    state: web::Data<AppState>,
    filename: web::Path<String>,
) -> Result<impl Responder, AppError> {
    let filename = filename.into_inner();
    let bytes = state.files.open(&filename).await?;
    Ok(HttpResponse::Ok()
        .insert_header((header::CONTENT_TYPE, content_type_for(&filename)))
        .insert_header((header::X_CONTENT_TYPE_OPTIONS, "nosniff"))
        .body(bytes))
}
