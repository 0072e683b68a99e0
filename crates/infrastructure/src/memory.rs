use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::Utc;
use domain::{NewTask, Task, TaskFilter, TaskId};

use crate::repository::{StoreError, TaskRepository};

/// In-memory task store for tests and local runs. Mirrors the ordering
/// and not-found signals of the DynamoDB store.
#[derive(Debug, Default)]
pub struct InMemoryTaskRepository {
    tasks: Mutex<HashMap<String, Task>>,
}

impl InMemoryTaskRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Task>> {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl TaskRepository for InMemoryTaskRepository {
    async fn create(&self, new: NewTask) -> Result<Task, StoreError> {
        let task = new.into_task();
        self.lock().insert(task.id.to_string(), task.clone());
        Ok(task)
    }

    async fn find_all(
        &self,
        filter: &TaskFilter,
        limit: u32,
        offset: u64,
    ) -> Result<Vec<Task>, StoreError> {
        let mut tasks: Vec<Task> = self
            .lock()
            .values()
            .filter(|task| filter.matches(task))
            .cloned()
            .collect();
        // Newest first, ULIDs breaking same-instant ties.
        tasks.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.as_str().cmp(a.id.as_str()))
        });

        let offset = usize::try_from(offset).unwrap_or(usize::MAX);
        Ok(tasks
            .into_iter()
            .skip(offset)
            .take(limit as usize)
            .collect())
    }

    async fn find_by_id(&self, id: &TaskId) -> Result<Option<Task>, StoreError> {
        Ok(self.lock().get(id.as_str()).cloned())
    }

    async fn update(&self, id: &TaskId, task: &Task) -> Result<Option<Task>, StoreError> {
        let mut tasks = self.lock();
        match tasks.get_mut(id.as_str()) {
            Some(stored) => {
                stored.title = task.title.clone();
                stored.description = task.description.clone();
                stored.complete = task.complete;
                stored.updated_at = Utc::now();
                Ok(Some(stored.clone()))
            }
            None => Ok(None),
        }
    }

    async fn delete(&self, id: &TaskId) -> Result<bool, StoreError> {
        Ok(self.lock().remove(id.as_str()).is_some())
    }

    async fn count(&self, filter: &TaskFilter) -> Result<u64, StoreError> {
        Ok(self
            .lock()
            .values()
            .filter(|task| filter.matches(task))
            .count() as u64)
    }
}
