//! Owner-scoped data access.
//!
//! Every query that touches projects or tasks filters on `owner_id`. A row that
//! exists but belongs to someone else is reported exactly like a missing row.
//! Mutations run inside a single transaction whose first statement locks the owner's
//! row, so writers queue on the database lock instead of failing, and a request
//! racing the owner's deletion cannot write orphans.

pub mod projects;
pub mod tasks;
pub mod users;

use sqlx::{Sqlite, Transaction};

use crate::error::AppError;

/// Starts the write side of `tx` and fails with `Unauthorized` if `owner_id` no
/// longer names a user.
///
/// Must be the first statement in the transaction. A write as the first statement
/// takes SQLite's write lock up front and waits out `busy_timeout` under contention;
/// a read followed by a write would have to upgrade a shared lock, which SQLite
/// refuses immediately with `SQLITE_BUSY` when another writer is active.
pub(crate) async fn lock_owner(
    tx: &mut Transaction<'_, Sqlite>,
    owner_id: i64,
) -> Result<(), AppError> {
    let touched = sqlx::query("UPDATE users SET created_at = created_at WHERE id = ?")
        .bind(owner_id)
        .execute(&mut **tx)
        .await?
        .rows_affected();

    if touched == 0 {
        return Err(AppError::Unauthorized("Could not validate credentials".into()));
    }
    Ok(())
}
