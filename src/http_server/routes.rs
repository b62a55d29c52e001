//! Shelfmark HTTP Routes
//!
//! JSON endpoints for the bookmark tree, favicon serving and the frontend shell.

use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use super::error::ApiError;
use crate::app::App;
use crate::managers::bookmark_manager::BookmarkManagerTrait;
use crate::managers::favicon_manager::FaviconManagerTrait;
use crate::services::offline_cache::render_worker_header;
use crate::types::bookmark::{BookmarkUpdate, FolderUpdate, ItemKind, NewBookmark, NewFolder, Tree};
use crate::types::errors::BookmarkError;

/// Served when a bookmark has no stored icon and `weblink.svg` is missing.
const PLACEHOLDER_SVG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 24 24" width="24" height="24"><circle cx="12" cy="12" r="10" fill="none" stroke="#8a8f98" stroke-width="2"/><path d="M2 12h20M12 2a15 15 0 0 1 0 20M12 2a15 15 0 0 0 0 20" fill="none" stroke="#8a8f98" stroke-width="2"/></svg>"##;

type Shared = Arc<App>;

// ==================
// Request/Response Types
// ==================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookmarkRequest {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub folder_id: Option<i64>,
    #[serde(default)]
    pub position: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFolderRequest {
    pub name: String,
    #[serde(default)]
    pub parent_id: Option<i64>,
    #[serde(default)]
    pub position: Option<i64>,
}

/// Partial update. A non-null parent field also moves the item to the end of
/// that parent; `0` stands for the root.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateItemRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub is_open: Option<bool>,
    #[serde(default)]
    pub parent_id: Option<i64>,
    #[serde(default)]
    pub folder_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveItemRequest {
    /// Target parent; `null`, absent or `0` means root.
    #[serde(default, alias = "folderId")]
    pub parent_id: Option<i64>,
    #[serde(default)]
    pub position: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct ReorderRequest {
    pub ids: Vec<i64>,
}

#[derive(Debug, Serialize)]
pub struct UpdateResponse {
    pub status: &'static str,
    pub id: i64,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

// ==================
// Routers
// ==================

/// Health check route.
pub fn health_routes() -> Router {
    Router::new().route("/health", get(health_handler))
}

/// JSON API under `/api`.
pub fn api_routes(state: Shared) -> Router {
    Router::new()
        .route("/api/data", get(list_tree_handler))
        .route("/api/bookmarks", post(create_bookmark_handler))
        .route("/api/folders", post(create_folder_handler))
        .route("/api/items/:kind/reorder", post(reorder_handler))
        .route(
            "/api/items/:kind/:id",
            put(update_item_handler).delete(delete_item_handler),
        )
        .route("/api/items/:kind/:id/move", post(move_item_handler))
        .route("/api/favicon/:id", get(favicon_handler))
        .with_state(state)
}

/// Index page and the worker script. Other assets go through `ServeDir`.
pub fn frontend_routes(state: Shared) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/sw.js", get(worker_handler))
        .with_state(state)
}

// ==================
// Helper Functions
// ==================

fn parse_kind(segment: &str) -> Result<ItemKind, ApiError> {
    ItemKind::from_segment(segment).ok_or_else(|| {
        ApiError::validation(format!(
            "unknown item kind '{}': expected 'folders' or 'bookmarks'",
            segment
        ))
    })
}

/// `0` is the wire encoding of "root".
fn normalize_parent(parent: Option<i64>) -> Option<i64> {
    parent.filter(|&id| id != 0)
}

fn extract<T>(value: Result<T, impl Into<ApiError>>) -> Result<T, ApiError> {
    value.map_err(Into::into)
}

// ==================
// Handlers
// ==================

async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn list_tree_handler(State(app): State<Shared>) -> Result<Json<Tree>, ApiError> {
    let tree = app.with_bookmarks(|m| m.list_tree())?;
    Ok(Json(tree))
}

async fn create_bookmark_handler(
    State(app): State<Shared>,
    payload: Result<Json<CreateBookmarkRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = extract(payload)?;
    let new = NewBookmark {
        name: request.name,
        url: request.url,
        folder_id: normalize_parent(request.folder_id),
        position: request.position,
    };
    let bookmark = app.with_bookmarks(|m| m.add_bookmark(&new))?;
    tracing::info!(id = bookmark.id, folder_id = ?bookmark.folder_id, "created bookmark");
    app.schedule_favicon(bookmark.id, &bookmark.url);
    Ok((StatusCode::CREATED, Json(bookmark)).into_response())
}

async fn create_folder_handler(
    State(app): State<Shared>,
    payload: Result<Json<CreateFolderRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = extract(payload)?;
    let new = NewFolder {
        name: request.name,
        parent_id: normalize_parent(request.parent_id),
        position: request.position,
    };
    let folder = app.with_bookmarks(|m| m.create_folder(&new))?;
    tracing::info!(id = folder.id, parent_id = ?folder.parent_id, "created folder");
    Ok((StatusCode::CREATED, Json(folder)).into_response())
}

async fn update_item_handler(
    State(app): State<Shared>,
    path: Result<Path<(String, i64)>, PathRejection>,
    payload: Result<Json<UpdateItemRequest>, JsonRejection>,
) -> Result<Json<UpdateResponse>, ApiError> {
    let Path((segment, id)) = extract(path)?;
    let kind = parse_kind(&segment)?;
    let Json(request) = extract(payload)?;

    match kind {
        ItemKind::Bookmark => {
            let update = BookmarkUpdate {
                name: request.name,
                url: request.url,
                folder_id: request.folder_id.map(|p| normalize_parent(Some(p))),
            };
            let url_changed = update.url.is_some();
            let bookmark = app.with_bookmarks(|m| m.update_bookmark(id, &update))?;
            if url_changed {
                app.schedule_favicon(bookmark.id, &bookmark.url);
            }
        }
        ItemKind::Folder => {
            let update = FolderUpdate {
                name: request.name,
                is_open: request.is_open,
                parent_id: request.parent_id.map(|p| normalize_parent(Some(p))),
            };
            app.with_bookmarks(|m| m.update_folder(id, &update))?;
        }
    }
    Ok(Json(UpdateResponse { status: "success", id }))
}

async fn move_item_handler(
    State(app): State<Shared>,
    path: Result<Path<(String, i64)>, PathRejection>,
    payload: Result<Json<MoveItemRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Path((segment, id)) = extract(path)?;
    let kind = parse_kind(&segment)?;
    let Json(request) = extract(payload)?;
    let parent = normalize_parent(request.parent_id);

    let response = match kind {
        ItemKind::Bookmark => {
            let bookmark = app.with_bookmarks(|m| m.move_bookmark(id, parent, request.position))?;
            Json(bookmark).into_response()
        }
        ItemKind::Folder => {
            let folder = app.with_bookmarks(|m| m.move_folder(id, parent, request.position))?;
            Json(folder).into_response()
        }
    };
    tracing::info!(kind = kind.label(), id, parent = ?parent, "moved item");
    Ok(response)
}

async fn reorder_handler(
    State(app): State<Shared>,
    path: Result<Path<String>, PathRejection>,
    payload: Result<Json<ReorderRequest>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let Path(segment) = extract(path)?;
    let kind = parse_kind(&segment)?;
    let Json(request) = extract(payload)?;
    app.with_bookmarks(|m| m.reorder(kind, &request.ids))?;
    Ok(StatusCode::NO_CONTENT)
}

async fn delete_item_handler(
    State(app): State<Shared>,
    path: Result<Path<(String, i64)>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let Path((segment, id)) = extract(path)?;
    let kind = parse_kind(&segment)?;
    match kind {
        ItemKind::Bookmark => app.with_bookmarks(|m| m.delete_bookmark(id))?,
        ItemKind::Folder => app.with_bookmarks(|m| m.delete_folder(id))?,
    }
    tracing::info!(kind = kind.label(), id, "deleted item");
    Ok(StatusCode::NO_CONTENT)
}

async fn favicon_handler(
    State(app): State<Shared>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Response, ApiError> {
    let Path(id) = extract(path)?;
    if let Some(icon) = app.with_favicons(|m| m.get_favicon(id))? {
        return Ok(([(header::CONTENT_TYPE, icon.content_type)], icon.data).into_response());
    }

    let placeholder = app.settings.static_dir.join("weblink.svg");
    let body = match tokio::fs::read(&placeholder).await {
        Ok(bytes) => bytes,
        Err(_) => PLACEHOLDER_SVG.as_bytes().to_vec(),
    };
    Ok(([(header::CONTENT_TYPE, "image/svg+xml".to_string())], body).into_response())
}

async fn index_handler(State(app): State<Shared>) -> Result<Html<String>, ApiError> {
    let path = app.settings.static_dir.join("index.html");
    let html = tokio::fs::read_to_string(&path).await.map_err(|e| {
        tracing::error!(path = %path.display(), error = %e, "index page unavailable");
        ApiError(BookmarkError::NotFound("index.html".to_string()))
    })?;
    Ok(Html(html))
}

/// Generated configuration header followed by the static worker body.
async fn worker_handler(State(app): State<Shared>) -> Result<Response, ApiError> {
    let path = app.settings.static_dir.join("sw.js");
    let body = tokio::fs::read_to_string(&path).await.map_err(|e| {
        tracing::error!(path = %path.display(), error = %e, "worker script unavailable");
        ApiError(BookmarkError::NotFound("sw.js".to_string()))
    })?;
    let script = format!("{}\n{}", render_worker_header(&app.settings.cache), body);
    Ok((
        [
            (header::CONTENT_TYPE, "application/javascript"),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        script,
    )
        .into_response())
}
