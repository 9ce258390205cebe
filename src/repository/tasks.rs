use chrono::{DateTime, Utc};
use sqlx::{FromRow, Sqlite, SqlitePool, Transaction};

use super::{lock_owner, projects};
use crate::error::AppError;
use crate::models::{Task, TaskInput, TaskPriority, TaskStatus, TaskUpdate};

const TASK_COLUMNS: &str = "id, title, description, priority, status, category, due_date, \
     completed, completed_at, owner_id, project_id, notes, progress, critical_points, \
     created_at, updated_at";

/// A task as SQLite hands it back. `completed` is an integer column; it only
/// becomes a `bool` on the way out, in `From<TaskRow> for Task`.
#[derive(Debug, FromRow)]
struct TaskRow {
    id: i64,
    title: String,
    description: Option<String>,
    priority: TaskPriority,
    status: TaskStatus,
    category: Option<String>,
    due_date: Option<DateTime<Utc>>,
    completed: i64,
    completed_at: Option<DateTime<Utc>>,
    owner_id: i64,
    project_id: Option<i64>,
    notes: Option<String>,
    progress: i32,
    critical_points: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<TaskRow> for Task {
    fn from(row: TaskRow) -> Self {
        Task {
            id: row.id,
            title: row.title,
            description: row.description,
            priority: row.priority,
            status: row.status,
            category: row.category,
            due_date: row.due_date,
            completed: row.completed != 0,
            completed_at: row.completed_at,
            owner_id: row.owner_id,
            project_id: row.project_id,
            notes: row.notes,
            progress: row.progress,
            critical_points: row.critical_points,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

fn not_found() -> AppError {
    AppError::NotFound("Task not found".into())
}

/// Rejects a `project_id` that is not one of the owner's projects. A foreign
/// project is reported the same way as a missing one.
async fn ensure_project_owned(
    tx: &mut Transaction<'_, Sqlite>,
    owner_id: i64,
    project_id: i64,
) -> Result<(), AppError> {
    match projects::get_in_tx(tx, owner_id, project_id).await? {
        Some(_) => Ok(()),
        None => Err(AppError::BadRequest(format!(
            "Project {} not found",
            project_id
        ))),
    }
}

async fn get_in_tx(
    tx: &mut Transaction<'_, Sqlite>,
    owner_id: i64,
    task_id: i64,
) -> Result<Option<Task>, AppError> {
    let row = sqlx::query_as::<_, TaskRow>(&format!(
        "SELECT {TASK_COLUMNS} FROM tasks WHERE id = ? AND owner_id = ?"
    ))
    .bind(task_id)
    .bind(owner_id)
    .fetch_optional(&mut **tx)
    .await?;
    Ok(row.map(Task::from))
}

pub async fn list(pool: &SqlitePool, owner_id: i64) -> Result<Vec<Task>, AppError> {
    let rows = sqlx::query_as::<_, TaskRow>(&format!(
        "SELECT {TASK_COLUMNS} FROM tasks WHERE owner_id = ?
         ORDER BY created_at DESC, id DESC"
    ))
    .bind(owner_id)
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(Task::from).collect())
}

/// Only the owner's completed tasks. Any non-zero stored flag counts as completed
/// and is surfaced as `true`.
pub async fn list_completed(pool: &SqlitePool, owner_id: i64) -> Result<Vec<Task>, AppError> {
    let rows = sqlx::query_as::<_, TaskRow>(&format!(
        "SELECT {TASK_COLUMNS} FROM tasks WHERE owner_id = ? AND completed <> 0
         ORDER BY created_at DESC, id DESC"
    ))
    .bind(owner_id)
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(Task::from).collect())
}

pub async fn create(pool: &SqlitePool, owner_id: i64, input: TaskInput) -> Result<Task, AppError> {
    let task = input.into_new_task(owner_id, Utc::now());

    let mut tx = pool.begin().await?;
    lock_owner(&mut tx, owner_id).await?;
    if let Some(project_id) = task.project_id {
        ensure_project_owned(&mut tx, owner_id, project_id).await?;
    }

    let row = sqlx::query_as::<_, TaskRow>(&format!(
        "INSERT INTO tasks (title, description, priority, status, category, due_date,
             completed, completed_at, owner_id, project_id, notes, progress, critical_points,
             created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
         RETURNING {TASK_COLUMNS}"
    ))
    .bind(task.title)
    .bind(task.description)
    .bind(task.priority)
    .bind(task.status)
    .bind(task.category)
    .bind(task.due_date)
    .bind(task.completed)
    .bind(task.completed_at)
    .bind(task.owner_id)
    .bind(task.project_id)
    .bind(task.notes)
    .bind(task.progress)
    .bind(task.critical_points)
    .bind(task.created_at)
    .bind(task.created_at)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(row.into())
}

pub async fn get(pool: &SqlitePool, owner_id: i64, task_id: i64) -> Result<Task, AppError> {
    let row = sqlx::query_as::<_, TaskRow>(&format!(
        "SELECT {TASK_COLUMNS} FROM tasks WHERE id = ? AND owner_id = ?"
    ))
    .bind(task_id)
    .bind(owner_id)
    .fetch_optional(pool)
    .await?;
    row.map(Task::from).ok_or_else(not_found)
}

/// Applies a partial update. The merge, including the completion fields, and the
/// write happen in one transaction; every column is written back, so concurrent
/// updates resolve as last-write-wins per row.
pub async fn update(
    pool: &SqlitePool,
    owner_id: i64,
    task_id: i64,
    changes: TaskUpdate,
) -> Result<Task, AppError> {
    let mut tx = pool.begin().await?;
    lock_owner(&mut tx, owner_id).await?;

    let mut task = get_in_tx(&mut tx, owner_id, task_id)
        .await?
        .ok_or_else(not_found)?;
    if let Some(project_id) = changes.target_project() {
        ensure_project_owned(&mut tx, owner_id, project_id).await?;
    }
    changes.apply(&mut task, Utc::now());

    let row = sqlx::query_as::<_, TaskRow>(&format!(
        "UPDATE tasks SET title = ?, description = ?, priority = ?, status = ?, category = ?,
             due_date = ?, completed = ?, completed_at = ?, project_id = ?, notes = ?,
             progress = ?, critical_points = ?, updated_at = ?
         WHERE id = ? AND owner_id = ?
         RETURNING {TASK_COLUMNS}"
    ))
    .bind(&task.title)
    .bind(&task.description)
    .bind(task.priority)
    .bind(task.status)
    .bind(&task.category)
    .bind(task.due_date)
    .bind(task.completed)
    .bind(task.completed_at)
    .bind(task.project_id)
    .bind(&task.notes)
    .bind(task.progress)
    .bind(&task.critical_points)
    .bind(task.updated_at)
    .bind(task.id)
    .bind(owner_id)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(row.into())
}

pub async fn delete(pool: &SqlitePool, owner_id: i64, task_id: i64) -> Result<(), AppError> {
    let mut tx = pool.begin().await?;
    lock_owner(&mut tx, owner_id).await?;

    let result = sqlx::query("DELETE FROM tasks WHERE id = ? AND owner_id = ?")
        .bind(task_id)
        .bind(owner_id)
        .execute(&mut *tx)
        .await?;

    if result.rows_affected() == 0 {
        return Err(not_found());
    }

    tx.commit().await?;
    Ok(())
}

/// Marks every task the owner has as completed, in one statement inside one
/// transaction, and returns how many tasks the owner has.
///
/// Tasks that were already completed keep their `completed_at` and `updated_at`,
/// so calling this twice leaves the same state as calling it once.
pub async fn mark_all_completed(pool: &SqlitePool, owner_id: i64) -> Result<u64, AppError> {
    let now = Utc::now();
    let mut tx = pool.begin().await?;
    lock_owner(&mut tx, owner_id).await?;

    let count = sqlx::query(
        "UPDATE tasks SET
             updated_at = CASE WHEN completed = 0 THEN ? ELSE updated_at END,
             completed_at = COALESCE(completed_at, ?),
             completed = 1,
             status = 'completed'
         WHERE owner_id = ?",
    )
    .bind(now)
    .bind(now)
    .bind(owner_id)
    .execute(&mut *tx)
    .await?
    .rows_affected();

    tx.commit().await?;
    log::info!("marked {} tasks completed for user {}", count, owner_id);
    Ok(count)
}
