//! Access gate for admin routes.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{HeaderMap, header::AUTHORIZATION},
    middleware::Next,
    response::Response,
};

use super::AuthError;
use super::jwt::{Claims, JwtManager};
use super::users::UserStore;
use crate::error::ApiError;

/// Shared authentication state.
pub struct AuthState {
    /// JWT manager.
    pub jwt: JwtManager,
    /// Credential store.
    pub users: UserStore,
}

impl AuthState {
    /// Create a new auth state.
    #[must_use]
    pub const fn new(jwt: JwtManager, users: UserStore) -> Self {
        Self { jwt, users }
    }
}

impl std::fmt::Debug for AuthState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthState")
            .field("jwt", &self.jwt)
            .field("users", &self.users)
            .finish()
    }
}

/// Extract the bearer token from the `Authorization` header.
///
/// The header must be exactly two space-separated parts, the first being
/// the `Bearer` scheme (any case).
///
/// # Errors
///
/// Returns `AuthError::MissingHeader` if the header is absent and
/// `AuthError::Malformed` for any other shape.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers.get(AUTHORIZATION).ok_or(AuthError::MissingHeader)?;
    let value = value.to_str().map_err(|_| AuthError::Malformed)?;

    let parts: Vec<&str> = value.split(' ').collect();
    match parts.as_slice() {
        [scheme, token] if scheme.eq_ignore_ascii_case("bearer") && !token.is_empty() => {
            Ok(*token)
        }
        _ => Err(AuthError::Malformed),
    }
}

/// Run the full gate check against request headers.
///
/// Shared by the route-level middleware and handlers that gate inline.
///
/// # Errors
///
/// Returns the `AuthError` that rejected the request.
pub fn authorize(headers: &HeaderMap, jwt: &JwtManager) -> Result<Claims, AuthError> {
    let result = bearer_token(headers).and_then(|token| jwt.verify(token));
    if let Err(reason) = &result {
        tracing::debug!(?reason, "Access gate rejected request");
    }
    result
}

/// Middleware that rejects requests without a valid bearer token.
///
/// On success the verified [`Claims`] are inserted into request extensions.
///
/// # Errors
///
/// Returns a 401 `ApiError` before the wrapped handler runs.
pub async fn require_auth(
    State(auth): State<Arc<AuthState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let claims = authorize(request.headers(), &auth.jwt)?;
    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}
