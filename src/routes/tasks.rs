use actix_web::{delete, get, post, put, web, HttpResponse, Responder};
use serde_json::json;
use validator::Validate;

use crate::{
    app::AppState,
    auth::AuthenticatedUser,
    error::AppError,
    models::{TaskInput, TaskUpdate},
    repository::tasks,
};

/// Retrieves every task owned by the authenticated user, newest first.
///
/// ## Responses:
/// - `200 OK`: JSON array of `Task` objects.
/// - `401 Unauthorized`: missing, invalid or expired token.
#[get("")]
pub async fn get_tasks(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let tasks = tasks::list(&state.pool, user.id()).await?;
    Ok(HttpResponse::Ok().json(tasks))
}

/// Retrieves only the authenticated user's completed tasks.
///
/// `completed` is always a JSON boolean in the response, whatever the store
/// holds internally.
#[get("/completed")]
pub async fn get_completed_tasks(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let tasks = tasks::list_completed(&state.pool, user.id()).await?;
    Ok(HttpResponse::Ok().json(tasks))
}

/// Creates a new task owned by the authenticated user.
///
/// The owner is always the caller. Sending `completed: true` (or
/// `status: "completed"`) creates the task already completed, with `completed_at` set.
///
/// ## Responses:
/// - `201 Created`: the new `Task`.
/// - `400 Bad Request`: malformed body, or `project_id` is not one of the caller's projects.
/// - `422 Unprocessable Entity`: field validation failed (e.g. empty title).
#[post("")]
pub async fn create_task(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    task_data: web::Json<TaskInput>,
) -> Result<impl Responder, AppError> {
    task_data.validate()?;
    let task = tasks::create(&state.pool, user.id(), task_data.into_inner()).await?;
    Ok(HttpResponse::Created().json(task))
}

/// Marks every task owned by the caller as completed.
///
/// ## Responses:
/// - `200 OK`: `{"detail": "<n> tasks marked completed"}`.
#[post("/mark_all_completed")]
pub async fn mark_all_completed(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let count = tasks::mark_all_completed(&state.pool, user.id()).await?;
    Ok(HttpResponse::Ok().json(json!({
        "detail": format!("{} tasks marked completed", count)
    })))
}

/// Retrieves a specific task by its ID.
///
/// ## Responses:
/// - `200 OK`: the `Task`.
/// - `404 Not Found`: no such task, or it belongs to another user.
#[get("/{id}")]
pub async fn get_task(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    task_id: web::Path<i64>,
) -> Result<impl Responder, AppError> {
    let task = tasks::get(&state.pool, user.id(), task_id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(task))
}

/// Partially updates a task owned by the caller.
///
/// Only supplied fields change. `completed` (or `status`) moves the task between
/// pending and completed, setting or clearing `completed_at` in the same write.
///
/// ## Responses:
/// - `200 OK`: the updated `Task`.
/// - `400 Bad Request`: `project_id` is not one of the caller's projects.
/// - `404 Not Found`: no such task, or it belongs to another user.
/// - `422 Unprocessable Entity`: field validation failed.
#[put("/{id}")]
pub async fn update_task(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    task_id: web::Path<i64>,
    task_data: web::Json<TaskUpdate>,
) -> Result<impl Responder, AppError> {
    task_data.validate()?;
    let task = tasks::update(
        &state.pool,
        user.id(),
        task_id.into_inner(),
        task_data.into_inner(),
    )
    .await?;
    Ok(HttpResponse::Ok().json(task))
}

/// Deletes a task owned by the caller.
///
/// ## Responses:
/// - `204 No Content`: deleted.
/// - `404 Not Found`: no such task, or it belongs to another user.
#[delete("/{id}")]
pub async fn delete_task(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    task_id: web::Path<i64>,
) -> Result<impl Responder, AppError> {
    tasks::delete(&state.pool, user.id(), task_id.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}
