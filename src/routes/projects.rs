use actix_web::{delete, get, post, put, web, HttpResponse, Responder};
use validator::Validate;

use crate::{
    app::AppState,
    auth::AuthenticatedUser,
    error::AppError,
    models::{ProjectInput, ProjectUpdate},
    repository::projects,
};

#[get("")]
pub async fn get_projects(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let projects = projects::list(&state.pool, user.id()).await?;
    Ok(HttpResponse::Ok().json(projects))
}

/// Creates a project owned by the caller. Status defaults to `"active"`.
#[post("")]
pub async fn create_project(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    project_data: web::Json<ProjectInput>,
) -> Result<impl Responder, AppError> {
    project_data.validate()?;
    let project = projects::create(&state.pool, user.id(), project_data.into_inner()).await?;
    Ok(HttpResponse::Created().json(project))
}

#[get("/{id}")]
pub async fn get_project(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    project_id: web::Path<i64>,
) -> Result<impl Responder, AppError> {
    let project = projects::get(&state.pool, user.id(), project_id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(project))
}

#[put("/{id}")]
pub async fn update_project(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    project_id: web::Path<i64>,
    project_data: web::Json<ProjectUpdate>,
) -> Result<impl Responder, AppError> {
    project_data.validate()?;
    let project = projects::update(
        &state.pool,
        user.id(),
        project_id.into_inner(),
        project_data.into_inner(),
    )
    .await?;
    Ok(HttpResponse::Ok().json(project))
}

/// Deletes a project and, with it, every task filed under it.
#[delete("/{id}")]
pub async fn delete_project(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    project_id: web::Path<i64>,
) -> Result<impl Responder, AppError> {
    projects::delete(&state.pool, user.id(), project_id.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}
