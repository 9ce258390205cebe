//! Credential store: user identities and their password hashes.

use chrono::Utc;
use sqlx::SqlitePool;

use crate::error::AppError;
use crate::models::{User, UserCredentials};

const USER_COLUMNS: &str = "id, username, email, created_at";

/// Inserts a new user. `hashed_password` must already be a salted one-way hash.
///
/// A single statement: the unique constraints decide duplicates, and their
/// violations come back as `DuplicateEmail` / `DuplicateUsername`, so concurrent
/// registrations of the same identity cannot both succeed.
pub async fn create_user(
    pool: &SqlitePool,
    username: &str,
    email: &str,
    hashed_password: &str,
) -> Result<User, AppError> {
    let user = sqlx::query_as::<_, User>(&format!(
        "INSERT INTO users (username, email, hashed_password, created_at)
         VALUES (?, ?, ?, ?)
         RETURNING {USER_COLUMNS}"
    ))
    .bind(username)
    .bind(email)
    .bind(hashed_password)
    .bind(Utc::now())
    .fetch_one(pool)
    .await?;
    Ok(user)
}

pub async fn find_by_email(pool: &SqlitePool, email: &str) -> Result<Option<User>, AppError> {
    let user = sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE email = ?"
    ))
    .bind(email)
    .fetch_optional(pool)
    .await?;
    Ok(user)
}

pub async fn find_by_username(
    pool: &SqlitePool,
    username: &str,
) -> Result<Option<User>, AppError> {
    let user = sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE username = ?"
    ))
    .bind(username)
    .fetch_optional(pool)
    .await?;
    Ok(user)
}

/// Looks up the stored hash for a login attempt.
pub async fn find_credentials_by_email(
    pool: &SqlitePool,
    email: &str,
) -> Result<Option<UserCredentials>, AppError> {
    let credentials = sqlx::query_as::<_, UserCredentials>(
        "SELECT id, email, hashed_password FROM users WHERE email = ?",
    )
    .bind(email)
    .fetch_optional(pool)
    .await?;
    Ok(credentials)
}

/// Removes a user together with everything they own, in one transaction.
/// Returns `false` if the user did not exist.
pub async fn delete_user(pool: &SqlitePool, user_id: i64) -> Result<bool, AppError> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM tasks WHERE owner_id = ?")
        .bind(user_id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM projects WHERE owner_id = ?")
        .bind(user_id)
        .execute(&mut *tx)
        .await?;
    let result = sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connect_in_memory;

    #[actix_rt::test]
    async fn test_create_and_find_user() {
        let pool = connect_in_memory().await.unwrap();
        let user = create_user(&pool, "alice", "a@x.com", "hash").await.unwrap();

        assert_eq!(user.username, "alice");
        assert_eq!(find_by_email(&pool, "a@x.com").await.unwrap(), Some(user.clone()));
        assert_eq!(find_by_username(&pool, "alice").await.unwrap(), Some(user.clone()));
        assert!(find_by_email(&pool, "b@x.com").await.unwrap().is_none());

        let credentials = find_credentials_by_email(&pool, "a@x.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(credentials.id, user.id);
        assert_eq!(credentials.hashed_password, "hash");
    }

    #[actix_rt::test]
    async fn test_duplicate_registration_is_a_client_error() {
        let pool = connect_in_memory().await.unwrap();
        create_user(&pool, "alice", "a@x.com", "hash").await.unwrap();

        let same_email = create_user(&pool, "alice2", "a@x.com", "hash").await;
        assert!(matches!(same_email, Err(AppError::DuplicateEmail)));

        let same_username = create_user(&pool, "alice", "other@x.com", "hash").await;
        assert!(matches!(same_username, Err(AppError::DuplicateUsername)));
    }

    #[actix_rt::test]
    async fn test_unique_constraint_maps_to_duplicate() {
        let pool = connect_in_memory().await.unwrap();
        create_user(&pool, "alice", "a@x.com", "hash").await.unwrap();

        let result: Result<_, AppError> = sqlx::query(
            "INSERT INTO users (username, email, hashed_password, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind("bob")
        .bind("a@x.com")
        .bind("hash")
        .bind(Utc::now())
        .execute(&pool)
        .await
        .map_err(AppError::from);
        assert!(matches!(result, Err(AppError::DuplicateEmail)));
    }

    #[actix_rt::test]
    async fn test_delete_user() {
        let pool = connect_in_memory().await.unwrap();
        let user = create_user(&pool, "alice", "a@x.com", "hash").await.unwrap();

        assert!(delete_user(&pool, user.id).await.unwrap());
        assert!(find_by_email(&pool, "a@x.com").await.unwrap().is_none());
        assert!(!delete_user(&pool, user.id).await.unwrap());
    }
}
