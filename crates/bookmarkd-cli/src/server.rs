//! HTTP JSON API
//!
//! Thin axum handlers over a shared [`Store`]. Every store call runs on the
//! blocking pool: writers hold the store's lock across a disk flush, so
//! readers may wait on it too.

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::body::Bytes;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::Deserialize;
use tracing::{error, info};

use bookmarkd_core::{
    Bookmark, BookmarkEntry, BookmarkPatch, Category, CategoryPatch, NewBookmark, Store,
    StoreError, StoreResult,
};

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<Store>,
}

/// Error response body is `{"error": "<message>"}`
#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    Conflict(String),
    Forbidden(String),
    BadRequest(String),
    Internal(String),
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(what) => ApiError::NotFound(format!("{} not found", what)),
            StoreError::Conflict(msg) => ApiError::Conflict(msg),
            StoreError::Forbidden(msg) => ApiError::Forbidden(msg),
            StoreError::InvalidInput(msg) => ApiError::BadRequest(msg),
            StoreError::Persistence(storage) => {
                error!("Persistence failure: {}", storage);
                let message = match storage.recovery_suggestion() {
                    Some(hint) => format!("Failed to save bookmarks: {}. {}", storage, hint),
                    None => format!("Failed to save bookmarks: {}", storage),
                };
                ApiError::Internal(message)
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(format!("Invalid JSON: {}", rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(serde_json::json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}

type ApiResult<T> = std::result::Result<T, ApiError>;

/// Run a store operation on the blocking pool
async fn blocking<T, F>(state: &AppState, op: F) -> ApiResult<T>
where
    F: FnOnce(&Store) -> StoreResult<T> + Send + 'static,
    T: Send + 'static,
{
    let store = Arc::clone(&state.store);
    tokio::task::spawn_blocking(move || op(&store))
        .await
        .map_err(|e| ApiError::Internal(format!("Store task failed: {}", e)))?
        .map_err(ApiError::from)
}

/// Run an infallible store read on the blocking pool
async fn reading<T, F>(state: &AppState, op: F) -> ApiResult<T>
where
    F: FnOnce(&Store) -> T + Send + 'static,
    T: Send + 'static,
{
    blocking(state, move |store| Ok(op(store))).await
}

#[derive(Debug, Deserialize)]
struct ReorderRequest {
    #[serde(default)]
    order: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
struct CreateCategoryRequest {
    #[serde(default)]
    color: Option<String>,
}

/// Build the API router
pub fn router(store: Arc<Store>) -> Router {
    let state = AppState { store };

    Router::new()
        .route("/health", get(health))
        .route("/api/bookmarks", get(list_bookmarks).post(create_bookmark))
        .route(
            "/api/bookmarks/:id",
            get(get_bookmark)
                .patch(update_bookmark)
                .delete(delete_bookmark),
        )
        .route("/api/bookmarks/:id/visit", post(record_visit))
        .route("/api/categories", get(list_categories))
        .route("/api/categories/reorder", put(reorder_categories))
        .route(
            "/api/categories/:name",
            post(create_category)
                .put(update_category)
                .delete(delete_category),
        )
        .with_state(state)
}

/// Bind and serve until Ctrl-C
pub async fn serve(store: Arc<Store>, addr: &str) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router(store))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

// ==================== Handlers ====================

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn list_bookmarks(State(state): State<AppState>) -> ApiResult<Json<Vec<BookmarkEntry>>> {
    let entries = reading(&state, |store| store.list_bookmarks()).await?;
    Ok(Json(entries))
}

async fn get_bookmark(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Bookmark>> {
    let lookup = id.clone();
    reading(&state, move |store| store.get_bookmark(&lookup))
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Bookmark '{}' not found", id)))
}

async fn create_bookmark(
    State(state): State<AppState>,
    payload: std::result::Result<Json<NewBookmark>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Bookmark>)> {
    let Json(input) = payload?;
    let bookmark = blocking(&state, move |store| store.create_bookmark(input)).await?;
    Ok((StatusCode::CREATED, Json(bookmark)))
}

async fn update_bookmark(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: std::result::Result<Json<BookmarkPatch>, JsonRejection>,
) -> ApiResult<Json<Bookmark>> {
    let Json(patch) = payload?;
    let bookmark = blocking(&state, move |store| store.update_bookmark(&id, patch)).await?;
    Ok(Json(bookmark))
}

async fn delete_bookmark(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    blocking(&state, move |store| store.delete_bookmark(&id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn record_visit(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    blocking(&state, move |store| store.record_visit(&id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_categories(State(state): State<AppState>) -> ApiResult<Json<Vec<Category>>> {
    let categories = reading(&state, |store| store.get_categories()).await?;
    Ok(Json(categories))
}

async fn reorder_categories(
    State(state): State<AppState>,
    payload: std::result::Result<Json<ReorderRequest>, JsonRejection>,
) -> ApiResult<StatusCode> {
    let Json(request) = payload?;
    blocking(&state, move |store| store.reorder_categories(&request.order)).await?;
    Ok(StatusCode::OK)
}

// The body is optional here, so it is parsed by hand
async fn create_category(
    State(state): State<AppState>,
    Path(name): Path<String>,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<Category>)> {
    let request: CreateCategoryRequest = if body.is_empty() {
        CreateCategoryRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| ApiError::BadRequest(format!("Invalid JSON: {}", e)))?
    };
    let category =
        blocking(&state, move |store| store.create_category(&name, request.color)).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

async fn update_category(
    State(state): State<AppState>,
    Path(name): Path<String>,
    payload: std::result::Result<Json<CategoryPatch>, JsonRejection>,
) -> ApiResult<Json<Category>> {
    let Json(patch) = payload?;
    let category = blocking(&state, move |store| store.update_category(&name, patch)).await?;
    Ok(Json(category))
}

async fn delete_category(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<StatusCode> {
    blocking(&state, move |store| store.delete_category(&name)).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bookmarkd_core::{Config, UNCATEGORIZED_ID};
    use serde_json::{json, Value};
    use tempfile::TempDir;

    async fn spawn_server(config: Config) -> String {
        let store = Arc::new(Store::open_with_config(config).unwrap());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, router(store)).await.unwrap();
        });

        format!("http://{}", addr)
    }

    async fn spawn_test_server() -> (String, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let config = Config {
            data_dir: temp_dir.path().to_path_buf(),
            ..Config::default()
        };
        (spawn_server(config).await, temp_dir)
    }

    #[tokio::test]
    async fn test_health() {
        let (base_url, _dir) = spawn_test_server().await;

        let resp = reqwest::get(format!("{}/health", base_url)).await.unwrap();
        assert_eq!(resp.status(), 200);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_bookmark_lifecycle() {
        let (base_url, _dir) = spawn_test_server().await;
        let client = reqwest::Client::new();

        let resp = client
            .post(format!("{}/api/bookmarks", base_url))
            .json(&json!({"url": "https://a.com", "title": "A", "category": "Reading"}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 201);
        let created: Value = resp.json().await.unwrap();
        let id = created["id"].as_str().unwrap().to_string();
        assert_eq!(created["order"], 0);
        assert!(created["favicon"].as_str().unwrap().contains("a.com"));

        let list: Value = client
            .get(format!("{}/api/bookmarks", base_url))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(list.as_array().unwrap().len(), 1);
        assert_eq!(list[0]["category"], "Reading");

        let resp = client
            .patch(format!("{}/api/bookmarks/{}", base_url, id))
            .json(&json!({"notes": "later", "category_id": UNCATEGORIZED_ID}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        let updated: Value = resp.json().await.unwrap();
        assert_eq!(updated["notes"], "later");
        assert_eq!(updated["category_id"], UNCATEGORIZED_ID);

        let resp = client
            .post(format!("{}/api/bookmarks/{}/visit", base_url, id))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 204);

        let fetched: Value = client
            .get(format!("{}/api/bookmarks/{}", base_url, id))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert!(fetched["last_visited"].is_i64());

        let resp = client
            .delete(format!("{}/api/bookmarks/{}", base_url, id))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 204);

        let resp = client
            .delete(format!("{}/api/bookmarks/{}", base_url, id))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 404);
        let body: Value = resp.json().await.unwrap();
        assert!(body["error"].as_str().unwrap().contains("not found"));
    }

    #[tokio::test]
    async fn test_category_errors() {
        let (base_url, _dir) = spawn_test_server().await;
        let client = reqwest::Client::new();

        let resp = client
            .post(format!("{}/api/categories/Work", base_url))
            .json(&json!({"color": "#ff0000"}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 201);
        let work: Value = resp.json().await.unwrap();
        assert_eq!(work["order"], 1);
        assert_eq!(work["color"], "#ff0000");

        let resp = client
            .post(format!("{}/api/categories/Work", base_url))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 409);

        let resp = client
            .delete(format!("{}/api/categories/Uncategorized", base_url))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 403);

        let resp = client
            .put(format!("{}/api/categories/Uncategorized", base_url))
            .json(&json!({"name": "Inbox"}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 403);

        let resp = client
            .put(format!("{}/api/categories/Missing", base_url))
            .json(&json!({"name": "Other"}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 404);

        let resp = client
            .put(format!("{}/api/categories/Work", base_url))
            .json(&json!({"name": "Job"}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        let renamed: Value = resp.json().await.unwrap();
        assert_eq!(renamed["name"], "Job");

        let resp = client
            .delete(format!("{}/api/categories/Job", base_url))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 204);
    }

    #[tokio::test]
    async fn test_reorder_categories() {
        let (base_url, _dir) = spawn_test_server().await;
        let client = reqwest::Client::new();

        let mut ids = Vec::new();
        for name in ["A", "B"] {
            let category: Value = client
                .post(format!("{}/api/categories/{}", base_url, name))
                .send()
                .await
                .unwrap()
                .json()
                .await
                .unwrap();
            ids.push(category["id"].as_str().unwrap().to_string());
        }
        ids.reverse();

        let resp = client
            .put(format!("{}/api/categories/reorder", base_url))
            .json(&json!({ "order": ids }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);

        let categories: Value = client
            .get(format!("{}/api/categories", base_url))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        let names: Vec<&str> = categories
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["Uncategorized", "B", "A"]);

        let resp = client
            .put(format!("{}/api/categories/reorder", base_url))
            .json(&json!({ "order": [] }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 400);
    }

    #[tokio::test]
    async fn test_malformed_json_is_bad_request() {
        let (base_url, _dir) = spawn_test_server().await;
        let client = reqwest::Client::new();

        let resp = client
            .post(format!("{}/api/bookmarks", base_url))
            .header("content-type", "application/json")
            .body("{ not json")
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 400);
        let body: Value = resp.json().await.unwrap();
        assert!(body["error"].is_string());

        let resp = client
            .post(format!("{}/api/bookmarks", base_url))
            .json(&json!({"title": "no url"}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 400);
    }

    #[tokio::test]
    async fn test_unknown_category_id_is_not_found() {
        let (base_url, _dir) = spawn_test_server().await;
        let client = reqwest::Client::new();

        let resp = client
            .post(format!("{}/api/bookmarks", base_url))
            .json(&json!({"url": "https://a.com", "category_id": "nope"}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 404);
    }

    #[tokio::test]
    async fn test_save_failure_reports_suggestion() {
        let temp_dir = TempDir::new().unwrap();
        // data_dir is a regular file, so bookmarks.json can never be written
        let blocker = temp_dir.path().join("not-a-dir");
        std::fs::write(&blocker, "").unwrap();
        let base_url = spawn_server(Config {
            data_dir: blocker,
            ..Config::default()
        })
        .await;
        let client = reqwest::Client::new();

        let resp = client
            .post(format!("{}/api/bookmarks", base_url))
            .json(&json!({"url": "https://a.com"}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 500);
        let body: Value = resp.json().await.unwrap();
        let message = body["error"].as_str().unwrap();
        assert!(message.starts_with("Failed to save bookmarks"), "{}", message);
        assert!(message.contains("bookmarkd config set data_dir"), "{}", message);

        // The change is still served from memory
        let list: Value = client
            .get(format!("{}/api/bookmarks", base_url))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(list.as_array().unwrap().len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_reads_interleave_with_writes() {
        let (base_url, _dir) = spawn_test_server().await;
        let client = reqwest::Client::new();

        let mut tasks = Vec::new();
        for i in 0..20 {
            let client = client.clone();
            let base_url = base_url.clone();
            tasks.push(tokio::spawn(async move {
                let resp = client
                    .post(format!("{}/api/bookmarks", base_url))
                    .json(&json!({"url": format!("https://site{}.com", i), "category": "Load"}))
                    .send()
                    .await
                    .unwrap();
                assert_eq!(resp.status(), 201);

                let resp = client
                    .get(format!("{}/api/categories", base_url))
                    .send()
                    .await
                    .unwrap();
                assert_eq!(resp.status(), 200);
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        let list: Value = client
            .get(format!("{}/api/bookmarks", base_url))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        let mut orders: Vec<i64> = list
            .as_array()
            .unwrap()
            .iter()
            .map(|b| b["order"].as_i64().unwrap())
            .collect();
        orders.sort_unstable();
        assert_eq!(orders, (0..20).collect::<Vec<i64>>());
    }
}
