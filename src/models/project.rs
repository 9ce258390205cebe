use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::{Validate, ValidationError};

use super::nullable;

pub const DEFAULT_PROJECT_STATUS: &str = "active";

/// A project, owned by exactly one user.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq, Eq)]
pub struct Project {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    /// Free-form lifecycle label such as "active", "completed" or "archived".
    pub status: String,
    pub owner_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Payload for creating a project. Any owner field sent by the client is ignored;
/// the owner is always the caller.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct ProjectInput {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
    #[validate(length(min = 1, max = 50))]
    pub status: Option<String>,
}

/// Partial update for a project. Absent fields are left untouched.
#[derive(Debug, Default, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_project_update"))]
pub struct ProjectUpdate {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub description: Option<Option<String>>,
    #[validate(length(min = 1, max = 50))]
    pub status: Option<String>,
}

fn validate_project_update(update: &ProjectUpdate) -> Result<(), ValidationError> {
    match &update.description {
        Some(Some(description)) if description.chars().count() > 1000 => {
            Err(ValidationError::new("description_too_long"))
        }
        _ => Ok(()),
    }
}

impl ProjectUpdate {
    /// Merges the supplied fields into `project` and refreshes `updated_at`.
    pub fn apply(self, project: &mut Project, now: DateTime<Utc>) {
        if let Some(name) = self.name {
            project.name = name;
        }
        if let Some(description) = self.description {
            project.description = description;
        }
        if let Some(status) = self.status {
            project.status = status;
        }
        project.updated_at = now;
    }
}
