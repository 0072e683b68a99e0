use crate::errors::{DomainError, DomainResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use ulid::Ulid;

/// Store-assigned task identifier (ULID in its canonical 26-char form).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    pub fn new() -> Self {
        Self(Ulid::new().to_string())
    }

    /// Parses an externally supplied id. Anything that is not a canonical
    /// ULID is rejected as an invalid identifier, which is a different
    /// failure class than a well-formed id that matches no record.
    pub fn parse(value: &str) -> DomainResult<Self> {
        Ulid::from_string(value).map_err(|_| DomainError::InvalidTaskId(value.to_string()))?;
        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub complete: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated input for task creation. The store assigns the id and the
/// timestamps when the draft is persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
}

impl NewTask {
    pub fn new(title: &str, description: Option<String>) -> DomainResult<Self> {
        let title = title.trim().to_string();
        if title.is_empty() {
            return Err(DomainError::Validation("title must not be empty".to_string()));
        }

        Ok(Self {
            title,
            description: description
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty()),
        })
    }

    /// Stamps the draft with a fresh id and a single creation instant for
    /// both timestamps, so `updated_at == created_at` right after create.
    pub fn into_task(self) -> Task {
        let now = Utc::now();
        Task {
            id: TaskId::new(),
            title: self.title,
            description: self.description,
            complete: false,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Conjunctive list filter. This is the single definition of the matching
/// semantics; store implementations must agree with it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilter {
    /// Case-insensitive substring match on the title.
    pub title: Option<String>,
    /// Exact match on the completion flag.
    pub complete: Option<bool>,
}

impl TaskFilter {
    pub fn matches(&self, task: &Task) -> bool {
        let title_ok = self
            .title
            .as_ref()
            .map_or(true, |needle| {
                task.title.to_lowercase().contains(&needle.to_lowercase())
            });
        let complete_ok = self.complete.map_or(true, |c| task.complete == c);
        title_ok && complete_ok
    }
}
