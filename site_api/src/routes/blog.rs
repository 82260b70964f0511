use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::blog::generate_slug;
use crate::error::ApiError;
use crate::AppState;

/// Published posts only, newest first.
pub(super) async fn list_posts(State(state): State<AppState>) -> Result<Response, ApiError> {
    let posts = state.blog.published_posts().await?;
    Ok(Json(posts).into_response())
}

pub(super) async fn get_post(State(state): State<AppState>, Path(slug): Path<String>) -> Result<Response, ApiError> {
    // Anything that is not already a slug cannot name a stored file.
    if slug.is_empty() || generate_slug(&slug) != slug {
        return Ok(not_found());
    }
    match state.blog.post(&slug).await? {
        Some(post) if post.is_published => Ok(Json(post).into_response()),
        _ => Ok(not_found()),
    }
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, Json(json!({ "error": "Post not found" }))).into_response()
}
