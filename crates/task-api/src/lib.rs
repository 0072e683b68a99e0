//! HTTP API (axum) for the task service.
//!
//! The router exposes `/health` at the root and the task CRUD surface
//! under `/api/v1`. All state flows in through [`AppState`]; there are
//! no globals.

pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod response;
pub mod service;

use std::sync::Arc;

use axum::routing::{get, patch};
use axum::Router;
use infrastructure::TaskRepository;

use crate::service::TaskService;

/// Shared application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub service: TaskService,
}

impl AppState {
    pub fn new(repository: Arc<dyn TaskRepository>) -> Self {
        Self {
            service: TaskService::new(repository),
        }
    }
}

/// Builds the full router.
pub fn app(state: AppState) -> Router {
    let tasks = Router::new()
        .route(
            "/todos",
            get(handlers::list_tasks).post(handlers::create_task),
        )
        .route(
            "/todos/:id",
            get(handlers::get_task)
                .put(handlers::update_task)
                .delete(handlers::delete_task),
        )
        .route("/todos/:id/toggle", patch(handlers::toggle_task));

    Router::new()
        .route("/health", get(handlers::health))
        .nest("/api/v1", tasks)
        .with_state(state)
}
