use serde::Deserialize;

/// POST /todos body. Unknown fields are ignored, a client-sent
/// `complete` in particular: tasks always start incomplete.
#[derive(Debug, Default, Deserialize)]
pub struct CreateTaskRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// PUT /todos/{id} body. Absent fields leave the stored value alone;
/// so do blank `title` and `description`.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateTaskRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub complete: Option<bool>,
}

/// GET /todos query string. Parameters arrive as raw strings so
/// out-of-range paging values can fall back instead of failing
/// extraction.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub complete: Option<String>,
    #[serde(default)]
    pub page: Option<String>,
    #[serde(default, rename = "pageSize")]
    pub page_size: Option<String>,
}
