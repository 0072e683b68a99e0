use async_trait::async_trait;
use domain::{NewTask, Task, TaskFilter, TaskId};
use thiserror::Error;

/// Failures surfaced by a task store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("storage error: {0}")]
    Storage(String),
    #[error("malformed stored task: {0}")]
    Malformed(String),
}

/// Persistence gateway for tasks. Implementations must keep the listing
/// order stable: newest first by creation time.
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Persists a new task. The store assigns the id and both timestamps.
    async fn create(&self, new: NewTask) -> Result<Task, StoreError>;

    /// Returns one page of tasks matching the filter, newest first.
    /// Stored rows that cannot be decoded are logged and skipped, so a
    /// page can come back short while [`TaskRepository::count`] still
    /// includes them.
    async fn find_all(
        &self,
        filter: &TaskFilter,
        limit: u32,
        offset: u64,
    ) -> Result<Vec<Task>, StoreError>;

    /// Absence is `None`, never an error.
    async fn find_by_id(&self, id: &TaskId) -> Result<Option<Task>, StoreError>;

    /// Replaces the mutable fields and refreshes `updated_at`. Returns the
    /// stored task, or `None` when the id no longer exists.
    async fn update(&self, id: &TaskId, task: &Task) -> Result<Option<Task>, StoreError>;

    /// Returns `false` when there was nothing to delete.
    async fn delete(&self, id: &TaskId) -> Result<bool, StoreError>;

    /// Number of tasks matching the filter across the whole store. Rows
    /// are counted without being decoded, undecodable ones included.
    async fn count(&self, filter: &TaskFilter) -> Result<u64, StoreError>;
}
