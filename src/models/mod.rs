pub mod project;
pub mod task;
pub mod user;

pub use project::{Project, ProjectInput, ProjectUpdate};
pub use task::{Task, TaskInput, TaskPriority, TaskStatus, TaskUpdate};
pub use user::{User, UserCredentials};

use serde::{Deserialize, Deserializer};

/// Distinguishes an explicit `null` from an absent field in partial updates:
/// absent stays `None`, `null` becomes `Some(None)`, a value becomes `Some(Some(v))`.
/// Use together with `#[serde(default)]`.
pub(crate) fn nullable<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
