use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

/// Uniform response wrapper: `status` echoes the HTTP code, `data` and
/// `meta` are omitted when absent.
#[derive(Debug, Serialize)]
pub struct Envelope<T: Serialize> {
    pub status: u16,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<PageMeta>,
}

/// Pagination block attached to list responses.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u64,
}

pub fn envelope<T: Serialize>(
    status: StatusCode,
    message: &str,
    data: Option<T>,
    meta: Option<PageMeta>,
) -> Response {
    let body = Envelope {
        status: status.as_u16(),
        message: message.to_string(),
        data,
        meta,
    };
    (status, Json(body)).into_response()
}

pub fn ok<T: Serialize>(message: &str, data: T) -> Response {
    envelope(StatusCode::OK, message, Some(data), None)
}

pub fn ok_paged<T: Serialize>(message: &str, data: T, meta: PageMeta) -> Response {
    envelope(StatusCode::OK, message, Some(data), Some(meta))
}

pub fn created<T: Serialize>(message: &str, data: T) -> Response {
    envelope(StatusCode::CREATED, message, Some(data), None)
}

/// DELETE success carries no envelope at all.
pub fn no_content() -> Response {
    StatusCode::NO_CONTENT.into_response()
}
