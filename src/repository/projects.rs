use chrono::Utc;
use sqlx::{Sqlite, SqlitePool, Transaction};

use super::lock_owner;
use crate::error::AppError;
use crate::models::project::DEFAULT_PROJECT_STATUS;
use crate::models::{Project, ProjectInput, ProjectUpdate};

const PROJECT_COLUMNS: &str =
    "id, name, description, status, owner_id, created_at, updated_at";

fn not_found() -> AppError {
    AppError::NotFound("Project not found".into())
}

pub async fn list(pool: &SqlitePool, owner_id: i64) -> Result<Vec<Project>, AppError> {
    let projects = sqlx::query_as::<_, Project>(&format!(
        "SELECT {PROJECT_COLUMNS} FROM projects WHERE owner_id = ?
         ORDER BY created_at DESC, id DESC"
    ))
    .bind(owner_id)
    .fetch_all(pool)
    .await?;
    Ok(projects)
}

pub async fn create(
    pool: &SqlitePool,
    owner_id: i64,
    input: ProjectInput,
) -> Result<Project, AppError> {
    let now = Utc::now();
    let mut tx = pool.begin().await?;
    lock_owner(&mut tx, owner_id).await?;

    let project = sqlx::query_as::<_, Project>(&format!(
        "INSERT INTO projects (name, description, status, owner_id, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?)
         RETURNING {PROJECT_COLUMNS}"
    ))
    .bind(input.name)
    .bind(input.description)
    .bind(input.status.unwrap_or_else(|| DEFAULT_PROJECT_STATUS.to_string()))
    .bind(owner_id)
    .bind(now)
    .bind(now)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(project)
}

pub async fn get(pool: &SqlitePool, owner_id: i64, project_id: i64) -> Result<Project, AppError> {
    sqlx::query_as::<_, Project>(&format!(
        "SELECT {PROJECT_COLUMNS} FROM projects WHERE id = ? AND owner_id = ?"
    ))
    .bind(project_id)
    .bind(owner_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(not_found)
}

/// Fetches an owned project inside an open transaction.
pub(crate) async fn get_in_tx(
    tx: &mut Transaction<'_, Sqlite>,
    owner_id: i64,
    project_id: i64,
) -> Result<Option<Project>, AppError> {
    let project = sqlx::query_as::<_, Project>(&format!(
        "SELECT {PROJECT_COLUMNS} FROM projects WHERE id = ? AND owner_id = ?"
    ))
    .bind(project_id)
    .bind(owner_id)
    .fetch_optional(&mut **tx)
    .await?;
    Ok(project)
}

pub async fn update(
    pool: &SqlitePool,
    owner_id: i64,
    project_id: i64,
    changes: ProjectUpdate,
) -> Result<Project, AppError> {
    let mut tx = pool.begin().await?;
    lock_owner(&mut tx, owner_id).await?;

    let mut project = get_in_tx(&mut tx, owner_id, project_id)
        .await?
        .ok_or_else(not_found)?;
    changes.apply(&mut project, Utc::now());

    let project = sqlx::query_as::<_, Project>(&format!(
        "UPDATE projects SET name = ?, description = ?, status = ?, updated_at = ?
         WHERE id = ? AND owner_id = ?
         RETURNING {PROJECT_COLUMNS}"
    ))
    .bind(&project.name)
    .bind(&project.description)
    .bind(&project.status)
    .bind(project.updated_at)
    .bind(project.id)
    .bind(owner_id)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(project)
}

/// Deletes an owned project and every task that references it, atomically.
/// Returns the number of tasks removed with it.
pub async fn delete(pool: &SqlitePool, owner_id: i64, project_id: i64) -> Result<u64, AppError> {
    let mut tx = pool.begin().await?;
    lock_owner(&mut tx, owner_id).await?;

    if get_in_tx(&mut tx, owner_id, project_id).await?.is_none() {
        return Err(not_found());
    }

    let removed_tasks = sqlx::query("DELETE FROM tasks WHERE project_id = ?")
        .bind(project_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    sqlx::query("DELETE FROM projects WHERE id = ? AND owner_id = ?")
        .bind(project_id)
        .bind(owner_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    log::info!(
        "deleted project {} with {} dependent tasks",
        project_id,
        removed_tasks
    );
    Ok(removed_tasks)
}
