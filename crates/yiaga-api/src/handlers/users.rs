//! User administration.

use axum::{
    Json,
    extract::{Path, State},
};

use super::{Message, blocking, message, parse_id};
use crate::auth::{NewUser, PublicUser, UserUpdate};
use crate::error::{ApiResult, JsonBody};
use crate::server::AppState;

/// `GET /api/users`
///
/// # Errors
///
/// Returns error if storage fails.
pub async fn list_users(State(state): State<AppState>) -> ApiResult<Json<Vec<PublicUser>>> {
    let users = state.auth.users.list()?;
    Ok(Json(users.iter().map(|u| u.to_public()).collect()))
}

/// `POST /api/users`
///
/// # Errors
///
/// Returns 400 for a role/domain violation or a taken username or email.
pub async fn create_user(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<NewUser>,
) -> ApiResult<Json<PublicUser>> {
    let auth = state.auth.clone();
    let user = blocking(move || auth.users.create(input)).await?;
    Ok(Json(user.to_public()))
}

/// `PUT /api/users/{id}`
///
/// # Errors
///
/// Returns 404 for an unknown id and 400 for a role/domain violation.
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(changes): JsonBody<UserUpdate>,
) -> ApiResult<Json<PublicUser>> {
    let id = parse_id(&id)?;
    let auth = state.auth.clone();
    let user = blocking(move || auth.users.update(id, changes)).await?;
    Ok(Json(user.to_public()))
}

/// `DELETE /api/users/{id}`
///
/// # Errors
///
/// Returns 404 for an unknown id.
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Message>> {
    state.auth.users.delete(parse_id(&id)?)?;
    Ok(message("Deleted"))
}
