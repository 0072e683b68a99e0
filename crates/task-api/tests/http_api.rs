//! Full-router tests over the in-memory store, driving the service
//! through real HTTP requests with tower's `oneshot`.

use std::sync::Arc;

use axum::body::{self, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use domain::{NewTask, Task, TaskFilter, TaskId};
use infrastructure::{InMemoryTaskRepository, StoreError, TaskRepository};
use serde_json::{json, Value};
use task_api::{app, AppState};
use tower::ServiceExt;

fn test_app() -> Router {
    app(AppState::new(Arc::new(InMemoryTaskRepository::new())))
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(value) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(value.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn create_task(app: &Router, title: &str) -> Value {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/v1/todos",
        Some(json!({ "title": title })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["data"].clone()
}

/// Store whose every call fails, for driving the internal-error path.
struct FailingRepository;

fn outage() -> StoreError {
    StoreError::Storage("table unreachable".to_string())
}

#[async_trait::async_trait]
impl TaskRepository for FailingRepository {
    async fn create(&self, _new: NewTask) -> Result<Task, StoreError> {
        Err(outage())
    }

    async fn find_all(
        &self,
        _filter: &TaskFilter,
        _limit: u32,
        _offset: u64,
    ) -> Result<Vec<Task>, StoreError> {
        Err(outage())
    }

    async fn find_by_id(&self, _id: &TaskId) -> Result<Option<Task>, StoreError> {
        Err(outage())
    }

    async fn update(&self, _id: &TaskId, _task: &Task) -> Result<Option<Task>, StoreError> {
        Err(outage())
    }

    async fn delete(&self, _id: &TaskId) -> Result<bool, StoreError> {
        Err(outage())
    }

    async fn count(&self, _filter: &TaskFilter) -> Result<u64, StoreError> {
        Err(outage())
    }
}

#[tokio::test]
async fn health_is_not_enveloped() {
    let app = test_app();
    let (status, body) = send(&app, Method::GET, "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert!(body["message"].is_string());
    assert!(body.get("data").is_none());
}

#[tokio::test]
async fn create_returns_enveloped_task() {
    let app = test_app();
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/todos",
        Some(json!({ "title": "Buy milk", "description": "two litres" })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], 201);
    assert_eq!(body["message"], "task created");
    assert!(body.get("meta").is_none());

    let data = &body["data"];
    assert_eq!(data["title"], "Buy milk");
    assert_eq!(data["description"], "two litres");
    assert_eq!(data["complete"], false);
    assert_eq!(data["createdAt"], data["updatedAt"]);
    assert!(data["id"].as_str().is_some_and(|id| id.len() == 26));
}

#[tokio::test]
async fn create_ignores_a_client_sent_complete_flag() {
    let app = test_app();
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/todos",
        Some(json!({ "title": "sneaky", "complete": true })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["complete"], false);
}

#[tokio::test]
async fn create_rejects_blank_and_missing_titles() {
    let app = test_app();

    for payload in [json!({ "title": "   " }), json!({})] {
        let (status, body) = send(&app, Method::POST, "/api/v1/todos", Some(payload)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], 400);
        assert!(body["message"]
            .as_str()
            .is_some_and(|m| m.contains("validation failed")));
        assert!(body.get("data").is_none());
    }
}

#[tokio::test]
async fn malformed_json_body_is_a_400_envelope() {
    let app = test_app();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/v1/todos")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert!(body["message"]
        .as_str()
        .is_some_and(|m| m.contains("invalid request body")));
}

#[tokio::test]
async fn malformed_and_missing_ids_get_distinct_404s() {
    let app = test_app();

    let (status, malformed) = send(&app, Method::GET, "/api/v1/todos/not-a-ulid", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(malformed["status"], 404);
    assert!(malformed["message"]
        .as_str()
        .is_some_and(|m| m.contains("invalid identifier")));

    let unknown = TaskId::new();
    let (status, missing) = send(
        &app,
        Method::GET,
        &format!("/api/v1/todos/{unknown}"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(missing["message"], "task not found");
    assert_ne!(malformed["message"], missing["message"]);
}

#[tokio::test]
async fn lifecycle_create_toggle_get_delete() {
    let app = test_app();

    let created = create_task(&app, "Buy milk").await;
    assert_eq!(created["complete"], false);
    let id = created["id"].as_str().unwrap().to_string();

    let (status, body) = send(
        &app,
        Method::PATCH,
        &format!("/api/v1/todos/{id}/toggle"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["complete"], true);

    let (status, body) = send(&app, Method::GET, &format!("/api/v1/todos/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["complete"], true);

    let (status, body) = send(&app, Method::DELETE, &format!("/api/v1/todos/{id}"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);

    let (status, _) = send(&app, Method::GET, &format!("/api/v1/todos/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, Method::DELETE, &format!("/api/v1/todos/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn toggle_twice_restores_the_flag() {
    let app = test_app();
    let id = create_task(&app, "flip").await["id"]
        .as_str()
        .unwrap()
        .to_string();

    let (_, body) = send(
        &app,
        Method::PATCH,
        &format!("/api/v1/todos/{id}/toggle"),
        None,
    )
    .await;
    assert_eq!(body["data"]["complete"], true);

    let (_, body) = send(
        &app,
        Method::PATCH,
        &format!("/api/v1/todos/{id}/toggle"),
        None,
    )
    .await;
    assert_eq!(body["data"]["complete"], false);
}

#[tokio::test]
async fn list_paginates_with_meta() {
    let app = test_app();
    for n in 1..=25 {
        create_task(&app, &format!("task {n}")).await;
    }

    let (status, body) = send(&app, Method::GET, "/api/v1/todos", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], 200);
    assert_eq!(body["data"].as_array().unwrap().len(), 10);
    assert_eq!(body["meta"]["total"], 25);
    assert_eq!(body["meta"]["page"], 1);
    assert_eq!(body["meta"]["pageSize"], 10);
    assert_eq!(body["meta"]["totalPages"], 3);

    let (_, body) = send(&app, Method::GET, "/api/v1/todos?page=3", None).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 5);
    assert_eq!(body["meta"]["page"], 3);

    let (_, body) = send(&app, Method::GET, "/api/v1/todos?page=4", None).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn list_falls_back_on_unusable_paging_params() {
    let app = test_app();
    create_task(&app, "solo").await;

    let (status, body) = send(
        &app,
        Method::GET,
        "/api/v1/todos?page=abc&pageSize=-5",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["meta"]["page"], 1);
    assert_eq!(body["meta"]["pageSize"], 10);
}

#[tokio::test]
async fn list_filters_by_title_and_complete() {
    let app = test_app();
    create_task(&app, "Buy milk").await;
    let bread = create_task(&app, "buy bread").await;
    create_task(&app, "Call mom").await;

    let bread_id = bread["id"].as_str().unwrap();
    send(
        &app,
        Method::PATCH,
        &format!("/api/v1/todos/{bread_id}/toggle"),
        None,
    )
    .await;

    let (_, body) = send(&app, Method::GET, "/api/v1/todos?title=BUY", None).await;
    assert_eq!(body["meta"]["total"], 2);

    let (_, body) = send(
        &app,
        Method::GET,
        "/api/v1/todos?title=buy&complete=false",
        None,
    )
    .await;
    assert_eq!(body["meta"]["total"], 1);
    assert_eq!(body["data"][0]["title"], "Buy milk");

    let (_, body) = send(&app, Method::GET, "/api/v1/todos?complete=true", None).await;
    assert_eq!(body["meta"]["total"], 1);
    assert_eq!(body["data"][0]["title"], "buy bread");
}

#[tokio::test]
async fn list_rejects_a_non_boolean_complete_param() {
    let app = test_app();
    let (status, body) = send(&app, Method::GET, "/api/v1/todos?complete=banana", None).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"]
        .as_str()
        .is_some_and(|m| m.contains("complete")));
}

#[tokio::test]
async fn update_merges_partial_bodies() {
    let app = test_app();
    let (_, created) = send(
        &app,
        Method::POST,
        "/api/v1/todos",
        Some(json!({ "title": "Write report", "description": "first draft" })),
    )
    .await;
    let id = created["data"]["id"].as_str().unwrap().to_string();

    // Description-only change leaves title and complete alone.
    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/api/v1/todos/{id}"),
        Some(json!({ "description": "new desc" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["title"], "Write report");
    assert_eq!(body["data"]["description"], "new desc");
    assert_eq!(body["data"]["complete"], false);

    // Blank strings mean "no change".
    let (_, body) = send(
        &app,
        Method::PUT,
        &format!("/api/v1/todos/{id}"),
        Some(json!({ "title": "", "description": "  " })),
    )
    .await;
    assert_eq!(body["data"]["title"], "Write report");
    assert_eq!(body["data"]["description"], "new desc");

    // An explicit false overwrites.
    send(
        &app,
        Method::PATCH,
        &format!("/api/v1/todos/{id}/toggle"),
        None,
    )
    .await;
    let (_, body) = send(
        &app,
        Method::PUT,
        &format!("/api/v1/todos/{id}"),
        Some(json!({ "complete": false })),
    )
    .await;
    assert_eq!(body["data"]["complete"], false);
}

#[tokio::test]
async fn update_unknown_or_malformed_id_is_404() {
    let app = test_app();

    let unknown = TaskId::new();
    let (status, _) = send(
        &app,
        Method::PUT,
        &format!("/api/v1/todos/{unknown}"),
        Some(json!({ "title": "anything" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        Method::PUT,
        "/api/v1/todos/garbage",
        Some(json!({ "title": "anything" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn update_with_empty_body_is_a_400() {
    let app = test_app();
    let id = create_task(&app, "target").await["id"]
        .as_str()
        .unwrap()
        .to_string();

    let (status, body) = send(&app, Method::PUT, &format!("/api/v1/todos/{id}"), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"]
        .as_str()
        .is_some_and(|m| m.contains("invalid request body")));
}

#[tokio::test]
async fn unparsable_query_strings_get_a_400_envelope() {
    let app = test_app();
    let (status, body) = send(
        &app,
        Method::GET,
        "/api/v1/todos?complete=true&complete=false",
        None,
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], 400);
    assert!(body["message"]
        .as_str()
        .is_some_and(|m| m.contains("invalid query string")));
}

#[tokio::test]
async fn storage_failures_become_a_masked_500() {
    let app = app(AppState::new(Arc::new(FailingRepository)));

    let (status, body) = send(&app, Method::GET, "/api/v1/todos", None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["status"], 500);
    assert_eq!(body["message"], "internal server error");
    assert!(body.get("data").is_none());

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/todos",
        Some(json!({ "title": "doomed" })),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(!body.to_string().contains("table unreachable"));
}
