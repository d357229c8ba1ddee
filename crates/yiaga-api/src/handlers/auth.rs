//! Login and self-registration.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};

use super::blocking;
use crate::auth::{PublicUser, UserRole};
use crate::error::{ApiResult, JsonBody};
use crate::server::AppState;

/// Login request body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Email address.
    pub email: String,
    /// Plaintext password.
    pub password: String,
}

/// Identity summary returned with a token.
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionUser {
    /// User id, as a string.
    pub id: String,
    /// Email address.
    pub email: String,
    /// Display name (the username).
    pub name: String,
    /// User role.
    pub role: UserRole,
}

/// Login response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    /// Bearer token, valid for 24 hours.
    pub token: String,
    /// Logged-in user.
    pub user: SessionUser,
}

/// Signup request body. Any role sent by the client is ignored.
#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    /// Username.
    pub username: String,
    /// Email address.
    pub email: String,
    /// Plaintext password.
    pub password: String,
}

/// `POST /api/login`
///
/// # Errors
///
/// Returns 401 `invalid_credentials` for an unknown email or wrong password.
pub async fn login(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let auth = state.auth.clone();
    let user = blocking(move || auth.users.authenticate(&req.email, &req.password)).await?;

    let id = user.meta.id.to_string();
    let token = state.auth.jwt.issue(&id, user.role)?;
    tracing::info!(user_id = %id, role = %user.role, "User logged in");

    Ok(Json(LoginResponse {
        token,
        user: SessionUser {
            id,
            email: user.email,
            name: user.username,
            role: user.role,
        },
    }))
}

/// `POST /api/signup`
///
/// # Errors
///
/// Returns 400 if the email or username is taken or a field is invalid.
pub async fn signup(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<SignupRequest>,
) -> ApiResult<Json<PublicUser>> {
    let auth = state.auth.clone();
    let user =
        blocking(move || auth.users.signup(req.username, req.email, req.password)).await?;
    Ok(Json(user.to_public()))
}
