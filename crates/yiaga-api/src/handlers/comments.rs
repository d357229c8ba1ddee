//! Reader comments and moderation.

use axum::{
    Json,
    extract::{Path, State},
    http::HeaderMap,
};
use chrono::Utc;
use serde::Deserialize;
use yiaga_core::{
    models::{BlogPost, Comment, CommentStatus},
    validation::{limits, sanitize_text},
};

use super::{Message, display_date, message, newest_first, parse_id};
use crate::auth::authorize;
use crate::error::{ApiError, ApiResult, JsonBody, QueryParams};
use crate::server::AppState;

/// Query for `GET /api/comments`.
#[derive(Debug, Default, Deserialize)]
pub struct CommentQuery {
    /// Scope to one post; switches the endpoint to public mode.
    pub post_id: Option<String>,
    /// Status filter, admin mode only.
    pub status: Option<String>,
}

/// `GET /api/comments`
///
/// With `post_id` this is a public read of that post's approved comments,
/// with commenter emails blanked. Without it the caller must pass the access gate, and may filter by
/// `status`.
///
/// # Errors
///
/// Returns 401 in admin mode without a valid token and 400 for an
/// unparseable `post_id` or `status`.
pub async fn list_comments(
    State(state): State<AppState>,
    headers: HeaderMap,
    QueryParams(query): QueryParams<CommentQuery>,
) -> ApiResult<Json<Vec<Comment>>> {
    let post_id = query.post_id.filter(|p| !p.is_empty());
    let public = post_id.is_some();

    let keep: Box<dyn Fn(&Comment) -> bool + Send> = match post_id {
        Some(raw) => {
            let post_id = parse_id(&raw)?;
            Box::new(move |c| c.post_id == post_id && c.status == CommentStatus::Approved)
        }
        None => {
            authorize(&headers, &state.auth.jwt)?;
            match query.status.filter(|s| !s.is_empty()) {
                Some(raw) => {
                    let status: CommentStatus = raw.parse()?;
                    Box::new(move |c| c.status == status)
                }
                None => Box::new(|_| true),
            }
        }
    };

    let mut comments: Vec<Comment> = state
        .store
        .collection::<Comment>()?
        .list()?
        .into_iter()
        .filter(|c| keep(c))
        .collect();
    if public {
        for comment in &mut comments {
            comment.email.clear();
        }
    }
    newest_first(&mut comments);
    Ok(Json(comments))
}

/// `POST /api/comments`
///
/// Public submission; the comment always starts as `pending`.
///
/// # Errors
///
/// Returns 400 for empty content or a missing `post_id`, and 404 if the
/// post does not exist.
pub async fn create_comment(
    State(state): State<AppState>,
    JsonBody(mut comment): JsonBody<Comment>,
) -> ApiResult<Json<Comment>> {
    comment.content = sanitize_text("content", &comment.content, limits::MAX_COMMENT_LENGTH)?;
    if comment.post_id == 0 {
        return Err(ApiError::Validation("post_id is required".to_string()));
    }

    let post = state
        .store
        .collection::<BlogPost>()?
        .get(comment.post_id)?
        .ok_or_else(|| ApiError::NotFound(format!("Post {} not found", comment.post_id)))?;

    comment.post_title = post.title;
    comment.status = CommentStatus::Pending;
    comment.date = display_date(Utc::now());

    let comment = state.store.collection::<Comment>()?.insert(comment)?;
    tracing::info!(comment_id = comment.meta.id, post_id = comment.post_id, "Comment submitted");
    Ok(Json(comment))
}

/// Body for `PUT /api/comments/{id}/status`.
#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    /// New moderation state.
    pub status: CommentStatus,
}

/// `PUT /api/comments/{id}/status`
///
/// # Errors
///
/// Returns 404 for an unknown id and 400 for an unknown status.
pub async fn update_comment_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(update): JsonBody<StatusUpdate>,
) -> ApiResult<Json<Message>> {
    let id = parse_id(&id)?;
    let comments = state.store.collection::<Comment>()?;
    let mut comment = comments
        .get(id)?
        .ok_or_else(|| ApiError::NotFound(format!("Comment {id} not found")))?;

    comment.status = update.status;
    comments.update(comment)?;
    tracing::info!(comment_id = id, status = %update.status, "Comment moderated");
    Ok(message("Status updated"))
}
