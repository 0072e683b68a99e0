use std::sync::Arc;

use domain::{DomainError, NewTask, Task, TaskFilter, TaskId};
use infrastructure::{StoreError, TaskRepository};
use thiserror::Error;
use tracing::instrument;

use crate::models::{CreateTaskRequest, UpdateTaskRequest};

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Failures produced by the service layer. The variant is the contract;
/// handlers map it to a status code without looking at message text.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    #[error("task not found")]
    NotFound,

    #[error("validation failed: {0}")]
    Validation(String),

    #[error(transparent)]
    Storage(#[from] StoreError),
}

impl From<DomainError> for ServiceError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::InvalidTaskId(raw) => ServiceError::InvalidId(raw),
            DomainError::Validation(message) => ServiceError::Validation(message),
        }
    }
}

/// Typed listing parameters, after the handler has applied fallbacks
/// for anything non-numeric. Values below 1 are clamped in [`TaskService::list`].
#[derive(Debug, Clone, Default)]
pub struct ListTasksQuery {
    pub title: Option<String>,
    pub complete: Option<bool>,
    pub page: u32,
    pub page_size: u32,
}

/// One page of results plus the figures for the pagination meta block.
#[derive(Debug, Clone)]
pub struct TaskPage {
    pub items: Vec<Task>,
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u64,
}

/// Application service carrying the task use cases. Cloning shares the
/// underlying repository handle.
#[derive(Clone)]
pub struct TaskService {
    repository: Arc<dyn TaskRepository>,
}

impl TaskService {
    pub fn new(repository: Arc<dyn TaskRepository>) -> Self {
        Self { repository }
    }

    #[instrument(skip(self, request))]
    pub async fn create(&self, request: CreateTaskRequest) -> Result<Task, ServiceError> {
        let draft = NewTask::new(&request.title, request.description)?;
        let task = self.repository.create(draft).await?;
        tracing::info!(id = %task.id, "task created");
        Ok(task)
    }

    #[instrument(skip(self))]
    pub async fn list(&self, query: ListTasksQuery) -> Result<TaskPage, ServiceError> {
        let page = query.page.max(1);
        let page_size = query.page_size.max(1);

        let filter = TaskFilter {
            title: query.title.filter(|t| !t.trim().is_empty()),
            complete: query.complete,
        };

        let offset = u64::from(page - 1) * u64::from(page_size);
        let items = self.repository.find_all(&filter, page_size, offset).await?;
        let total = self.repository.count(&filter).await?;
        let total_pages = total.div_ceil(u64::from(page_size));

        Ok(TaskPage {
            items,
            total,
            page,
            page_size,
            total_pages,
        })
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: &str) -> Result<Task, ServiceError> {
        let id = TaskId::parse(id)?;
        self.repository
            .find_by_id(&id)
            .await?
            .ok_or(ServiceError::NotFound)
    }

    /// Partial-update merge. Blank `title`/`description` mean "leave
    /// unchanged" (they cannot be cleared through this interface);
    /// `complete` overwrites whenever present, including `false`.
    #[instrument(skip(self, request))]
    pub async fn update(&self, id: &str, request: UpdateTaskRequest) -> Result<Task, ServiceError> {
        let id = TaskId::parse(id)?;
        let mut task = self
            .repository
            .find_by_id(&id)
            .await?
            .ok_or(ServiceError::NotFound)?;

        if let Some(title) = request.title.as_deref().map(str::trim) {
            if !title.is_empty() {
                task.title = title.to_string();
            }
        }
        if let Some(description) = request.description.as_deref().map(str::trim) {
            if !description.is_empty() {
                task.description = Some(description.to_string());
            }
        }
        if let Some(complete) = request.complete {
            task.complete = complete;
        }

        // The record can disappear between the read and the write; the
        // store reports that as an absent row.
        let updated = self
            .repository
            .update(&id, &task)
            .await?
            .ok_or(ServiceError::NotFound)?;
        tracing::info!(id = %updated.id, "task updated");
        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: &str) -> Result<(), ServiceError> {
        let id = TaskId::parse(id)?;
        if !self.repository.delete(&id).await? {
            return Err(ServiceError::NotFound);
        }
        tracing::info!(%id, "task deleted");
        Ok(())
    }

    /// Read-modify-write without a conditional guard, so two overlapping
    /// toggles on the same id can lose one flip.
    #[instrument(skip(self))]
    pub async fn toggle(&self, id: &str) -> Result<Task, ServiceError> {
        let id = TaskId::parse(id)?;
        let mut task = self
            .repository
            .find_by_id(&id)
            .await?
            .ok_or(ServiceError::NotFound)?;
        task.complete = !task.complete;

        let updated = self
            .repository
            .update(&id, &task)
            .await?
            .ok_or(ServiceError::NotFound)?;
        tracing::info!(id = %updated.id, complete = updated.complete, "task toggled");
        Ok(updated)
    }
}
