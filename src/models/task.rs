use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use super::nullable;

/// Represents the priority of a task. Stored as lowercase text.
#[derive(Debug, Default, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
}

/// Represents the status of a task. Always agrees with `Task::completed`.
#[derive(Debug, Default, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    #[default]
    Pending,
    Completed,
}

impl TaskStatus {
    pub fn from_completed(completed: bool) -> Self {
        if completed {
            TaskStatus::Completed
        } else {
            TaskStatus::Pending
        }
    }
}

/// Represents a task entity as stored in the database and returned by the API.
///
/// `completed`, `status` and `completed_at` move together: `completed` is true exactly
/// when `status` is `Completed` and `completed_at` is set. Mutate them only through
/// [`Task::set_completed`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Task {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub priority: TaskPriority,
    pub status: TaskStatus,
    pub category: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
    pub owner_id: i64,
    pub project_id: Option<i64>,
    pub notes: Option<String>,
    /// Progress percentage, 0 to 100.
    pub progress: i32,
    pub critical_points: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Moves the task to the completed or pending state.
    ///
    /// `completed_at` is stamped only on a pending-to-completed transition, so marking
    /// an already completed task again keeps its original completion time.
    pub fn set_completed(&mut self, completed: bool, now: DateTime<Utc>) {
        if completed {
            if !self.completed || self.completed_at.is_none() {
                self.completed_at = Some(now);
            }
        } else {
            self.completed_at = None;
        }
        self.completed = completed;
        self.status = TaskStatus::from_completed(completed);
    }

    pub fn is_consistent(&self) -> bool {
        self.completed == (self.status == TaskStatus::Completed)
            && self.completed == self.completed_at.is_some()
    }
}

/// Reconciles the two ways a client can ask for completion. An explicit `completed`
/// flag wins over `status` when both are sent.
fn requested_completion(completed: Option<bool>, status: Option<TaskStatus>) -> Option<bool> {
    completed.or_else(|| status.map(|status| status == TaskStatus::Completed))
}

/// Payload for creating a task.
#[derive(Debug, Default, Serialize, Deserialize, Validate)]
pub struct TaskInput {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
    pub priority: Option<TaskPriority>,
    pub status: Option<TaskStatus>,
    #[validate(length(max = 100))]
    pub category: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub completed: Option<bool>,
    pub project_id: Option<i64>,
    pub notes: Option<String>,
    #[validate(range(min = 0, max = 100))]
    pub progress: Option<i32>,
    pub critical_points: Option<String>,
}

/// A validated create payload with defaults filled in and completion state resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub priority: TaskPriority,
    pub status: TaskStatus,
    pub category: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
    pub owner_id: i64,
    pub project_id: Option<i64>,
    pub notes: Option<String>,
    pub progress: i32,
    pub critical_points: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl TaskInput {
    /// Builds the row to insert for `owner_id`. A task created as completed gets its
    /// status and completion timestamp here, the same way an update would set them.
    pub fn into_new_task(self, owner_id: i64, now: DateTime<Utc>) -> NewTask {
        let completed = requested_completion(self.completed, self.status).unwrap_or(false);
        NewTask {
            title: self.title,
            description: self.description,
            priority: self.priority.unwrap_or_default(),
            status: TaskStatus::from_completed(completed),
            category: self.category,
            due_date: self.due_date,
            completed,
            completed_at: completed.then_some(now),
            owner_id,
            project_id: self.project_id,
            notes: self.notes,
            progress: self.progress.unwrap_or(0),
            critical_points: self.critical_points,
            created_at: now,
        }
    }
}

/// Partial update for a task. Absent fields are left untouched; nullable fields
/// accept an explicit `null` to clear them.
#[derive(Debug, Default, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_task_update"))]
pub struct TaskUpdate {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub description: Option<Option<String>>,
    pub priority: Option<TaskPriority>,
    pub status: Option<TaskStatus>,
    #[serde(default, deserialize_with = "nullable")]
    pub category: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub due_date: Option<Option<DateTime<Utc>>>,
    pub completed: Option<bool>,
    #[serde(default, deserialize_with = "nullable")]
    pub project_id: Option<Option<i64>>,
    #[serde(default, deserialize_with = "nullable")]
    pub notes: Option<Option<String>>,
    #[validate(range(min = 0, max = 100))]
    pub progress: Option<i32>,
    #[serde(default, deserialize_with = "nullable")]
    pub critical_points: Option<Option<String>>,
}

fn validate_task_update(update: &TaskUpdate) -> Result<(), ValidationError> {
    if let Some(Some(description)) = &update.description {
        if description.chars().count() > 1000 {
            return Err(ValidationError::new("description_too_long"));
        }
    }
    if let Some(Some(category)) = &update.category {
        if category.chars().count() > 100 {
            return Err(ValidationError::new("category_too_long"));
        }
    }
    Ok(())
}

impl TaskUpdate {
    /// The project the update would attach the task to, if it names one.
    pub fn target_project(&self) -> Option<i64> {
        self.project_id.flatten()
    }

    /// Merges the whitelisted fields into `task`, keeps the completion fields
    /// consistent, and refreshes `updated_at`. Identity, ownership and timestamps
    /// other than `updated_at`/`completed_at` are never touched.
    pub fn apply(self, task: &mut Task, now: DateTime<Utc>) {
        if let Some(title) = self.title {
            task.title = title;
        }
        if let Some(description) = self.description {
            task.description = description;
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
        if let Some(category) = self.category {
            task.category = category;
        }
        if let Some(due_date) = self.due_date {
            task.due_date = due_date;
        }
        if let Some(project_id) = self.project_id {
            task.project_id = project_id;
        }
        if let Some(notes) = self.notes {
            task.notes = notes;
        }
        if let Some(progress) = self.progress {
            task.progress = progress;
        }
        if let Some(critical_points) = self.critical_points {
            task.critical_points = critical_points;
        }
        if let Some(completed) = requested_completion(self.completed, self.status) {
            task.set_completed(completed, now);
        }
        task.updated_at = now;
    }
}
