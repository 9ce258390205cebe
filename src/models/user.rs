use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A registered account, as returned by the API. Never carries the password hash.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

/// The subset of a user row needed to check a login attempt.
#[derive(Debug, FromRow)]
pub struct UserCredentials {
    pub id: i64,
    pub email: String,
    pub hashed_password: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_serialization_omits_secret() {
        let user = User {
            id: 1,
            username: "alice".to_string(),
            email: "a@x.com".to_string(),
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["username"], "alice");
        assert!(json.get("hashed_password").is_none());
        assert!(json.get("password").is_none());
    }
}
