use axum::body::Bytes;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::ApiError;
use crate::models::{CreateTaskRequest, ListQuery, UpdateTaskRequest};
use crate::response::{self, PageMeta};
use crate::service::{ListTasksQuery, DEFAULT_PAGE, DEFAULT_PAGE_SIZE};
use crate::AppState;

/// Bodies are read raw and deserialized here so malformed JSON becomes
/// an enveloped 400 instead of a framework rejection.
fn parse_body<T: DeserializeOwned>(body: &Bytes) -> Result<T, ApiError> {
    serde_json::from_slice(body)
        .map_err(|e| ApiError::BadRequest(format!("invalid request body: {e}")))
}

#[derive(Debug, Serialize)]
struct HealthBody {
    status: &'static str,
    message: &'static str,
}

/// Liveness endpoint; not enveloped.
pub async fn health() -> impl IntoResponse {
    Json(HealthBody {
        status: "ok",
        message: "task api is running",
    })
}

pub async fn create_task(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let request: CreateTaskRequest = parse_body(&body)?;
    let task = state.service.create(request).await?;
    Ok(response::created("task created", task))
}

pub async fn list_tasks(
    State(state): State<AppState>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    // A rejected query string (duplicate key, broken percent-escape)
    // still gets a JSON envelope, not axum's plain-text reply.
    let Query(query) =
        query.map_err(|e| ApiError::BadRequest(format!("invalid query string: {e}")))?;
    let query = parse_list_query(query)?;
    let page = state.service.list(query).await?;
    let meta = PageMeta {
        total: page.total,
        page: page.page,
        page_size: page.page_size,
        total_pages: page.total_pages,
    };
    Ok(response::ok_paged("tasks retrieved", page.items, meta))
}

pub async fn get_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let task = state.service.get(&id).await?;
    Ok(response::ok("task retrieved", task))
}

pub async fn update_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let request: UpdateTaskRequest = parse_body(&body)?;
    let task = state.service.update(&id, request).await?;
    Ok(response::ok("task updated", task))
}

pub async fn delete_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    state.service.delete(&id).await?;
    Ok(response::no_content())
}

pub async fn toggle_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let task = state.service.toggle(&id).await?;
    Ok(response::ok("task toggled", task))
}

fn parse_list_query(raw: ListQuery) -> Result<ListTasksQuery, ApiError> {
    let complete = match raw.complete.as_deref() {
        None | Some("") => None,
        Some("true") => Some(true),
        Some("false") => Some(false),
        Some(other) => {
            return Err(ApiError::BadRequest(format!(
                "invalid value for `complete`: `{other}` (expected true or false)"
            )))
        }
    };

    Ok(ListTasksQuery {
        title: raw.title.filter(|t| !t.is_empty()),
        complete,
        page: positive_or(raw.page, DEFAULT_PAGE),
        page_size: positive_or(raw.page_size, DEFAULT_PAGE_SIZE),
    })
}

/// Non-numeric and sub-1 values fall back rather than failing the
/// request.
fn positive_or(raw: Option<String>, fallback: u32) -> u32 {
    raw.and_then(|s| s.parse::<u32>().ok())
        .filter(|n| *n >= 1)
        .unwrap_or(fallback)
}
