//! Site content: gallery, page headers, guest comments and table groups.
//!
//! - GET/POST/DELETE          /api/gallery
//! - GET/POST/PUT/DELETE      /api/headers
//! - GET/POST/PUT/DELETE      /api/comments
//! - GET/POST                 /api/table-groups
//! - GET/DELETE               /api/table-groups/:id
//!
//! Deletes take `?id=`. Lists answer with a bare JSON array.

use super::{IdQuery, Success};
use crate::server::state::AppState;
use crate::services::comments::{Comment, CommentFilter, NewComment};
use crate::services::gallery::{GalleryImage, NewGalleryImage};
use crate::services::headers::{HeaderImage, NewHeaderImage};
use crate::services::table_groups::{NewTableGroup, TableGroup};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use wedding_web::{AppError, WebResult};

// ============================================================================
// Gallery
// ============================================================================

/// Every gallery image, newest first.
///
/// # Errors
///
/// 500 if the store cannot be read.
pub async fn list_gallery(State(state): State<AppState>) -> WebResult<Json<Vec<GalleryImage>>> {
    Ok(Json(state.gallery.list().await?))
}

/// Register an uploaded image.
///
/// # Errors
///
/// 400 without a URL.
pub async fn add_gallery_image(
    State(state): State<AppState>,
    Json(image): Json<NewGalleryImage>,
) -> WebResult<(StatusCode, Json<GalleryImage>)> {
    Ok((StatusCode::CREATED, Json(state.gallery.add(image).await?)))
}

/// Remove a gallery image.
///
/// # Errors
///
/// 400 without an `id`.
pub async fn delete_gallery_image(
    State(state): State<AppState>,
    Query(query): Query<IdQuery>,
) -> WebResult<Json<Success>> {
    state.gallery.delete(&query.require()?).await?;
    Ok(Json(Success::ok()))
}

// ============================================================================
// Headers
// ============================================================================

/// `?pageId=`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeaderQuery {
    /// Restrict to one page
    #[serde(default)]
    pub page_id: Option<String>,
}

/// Body of `PUT /api/headers`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetActiveRequest {
    /// Header image id
    pub id: String,
    /// Page the image belongs to
    pub page_id: String,
    /// Show or hide it
    pub is_active: bool,
}

/// Header images, optionally for one page.
///
/// # Errors
///
/// 500 if the store cannot be read.
pub async fn list_headers(
    State(state): State<AppState>,
    Query(query): Query<HeaderQuery>,
) -> WebResult<Json<Vec<HeaderImage>>> {
    let page = query.page_id.as_deref().filter(|p| !p.trim().is_empty());
    Ok(Json(state.headers.list(page).await?))
}

/// Register an uploaded header image.
///
/// # Errors
///
/// 400 without a URL, name or page.
pub async fn add_header(
    State(state): State<AppState>,
    Json(image): Json<NewHeaderImage>,
) -> WebResult<(StatusCode, Json<HeaderImage>)> {
    Ok((StatusCode::CREATED, Json(state.headers.add(image).await?)))
}

/// Activate or deactivate a header image. Activating one deactivates the
/// page's others.
///
/// # Errors
///
/// 400 for blank ids; 404 for an unknown image.
pub async fn set_header_active(
    State(state): State<AppState>,
    Json(request): Json<SetActiveRequest>,
) -> WebResult<Json<Success>> {
    state
        .headers
        .set_active(&request.id, &request.page_id, request.is_active)
        .await?;
    Ok(Json(Success::ok()))
}

/// Remove a header image.
///
/// # Errors
///
/// 400 without an `id`.
pub async fn delete_header(State(state): State<AppState>, Query(query): Query<IdQuery>) -> WebResult<Json<Success>> {
    state.headers.delete(&query.require()?).await?;
    Ok(Json(Success::ok()))
}

// ============================================================================
// Comments
// ============================================================================

/// Body of `PUT /api/comments`
#[derive(Debug, Deserialize)]
pub struct EditCommentRequest {
    /// Comment id
    pub id: String,
    /// New author
    #[serde(default)]
    pub name: String,
    /// New message
    pub comment: String,
}

/// Comments matching every given filter, newest first.
///
/// ```bash
/// curl "http://localhost:8080/api/comments?search=congrats&from=2025-06-01T00:00:00Z"
/// ```
///
/// # Errors
///
/// 500 if the store cannot be read.
pub async fn list_comments(
    State(state): State<AppState>,
    Query(filter): Query<CommentFilter>,
) -> WebResult<Json<Vec<Comment>>> {
    Ok(Json(state.comments.list(&filter).await?))
}

/// Post a comment.
///
/// # Errors
///
/// 400 for an empty message.
pub async fn create_comment(
    State(state): State<AppState>,
    Json(comment): Json<NewComment>,
) -> WebResult<(StatusCode, Json<Comment>)> {
    Ok((StatusCode::CREATED, Json(state.comments.create(comment).await?)))
}

/// Edit a comment.
///
/// # Errors
///
/// 400 for an empty message; 404 for an unknown comment.
pub async fn edit_comment(
    State(state): State<AppState>,
    Json(request): Json<EditCommentRequest>,
) -> WebResult<Json<Success>> {
    if request.id.trim().is_empty() {
        return Err(AppError::bad_request("id is required"));
    }
    state
        .comments
        .update(&request.id, &request.name, &request.comment)
        .await?;
    Ok(Json(Success::ok()))
}

/// Remove a comment.
///
/// # Errors
///
/// 400 without an `id`.
pub async fn delete_comment(State(state): State<AppState>, Query(query): Query<IdQuery>) -> WebResult<Json<Success>> {
    state.comments.delete(&query.require()?).await?;
    Ok(Json(Success::ok()))
}

// ============================================================================
// Table groups
// ============================================================================

/// Every table group by table number.
///
/// # Errors
///
/// 500 if the store cannot be read.
pub async fn list_table_groups(State(state): State<AppState>) -> WebResult<Json<Vec<TableGroup>>> {
    Ok(Json(state.table_groups.list().await?))
}

/// Add a table group.
///
/// # Errors
///
/// 400 for table number 0.
pub async fn create_table_group(
    State(state): State<AppState>,
    Json(group): Json<NewTableGroup>,
) -> WebResult<(StatusCode, Json<TableGroup>)> {
    Ok((StatusCode::CREATED, Json(state.table_groups.create(group).await?)))
}

/// Fetch one table group.
///
/// # Errors
///
/// 404 for an unknown group.
pub async fn get_table_group(State(state): State<AppState>, Path(id): Path<String>) -> WebResult<Json<TableGroup>> {
    Ok(Json(state.table_groups.get(&id).await?))
}

/// Remove a table group.
///
/// # Errors
///
/// 500 if the delete fails.
pub async fn delete_table_group(State(state): State<AppState>, Path(id): Path<String>) -> WebResult<Json<Success>> {
    state.table_groups.delete(&id).await?;
    Ok(Json(Success::ok()))
}
