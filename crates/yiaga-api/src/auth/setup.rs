//! First-run admin bootstrap.

use rand::Rng;

use super::users::{NewUser, User, UserRole, UserStore};
use crate::error::ApiError;

/// Username used when `YIAGA_ADMIN_USERNAME` is unset.
pub const DEFAULT_ADMIN_USERNAME: &str = "admin";

/// Create the first admin if the user store is empty.
///
/// Returns `None` without touching the store when any user already exists.
///
/// # Errors
///
/// Returns error if the email breaks the organisation-domain rule or
/// creation fails.
pub fn bootstrap_admin(
    users: &UserStore,
    username: &str,
    email: &str,
    password: &str,
) -> Result<Option<User>, ApiError> {
    if !users.is_empty() {
        return Ok(None);
    }

    let admin = users.create(NewUser {
        username: username.to_string(),
        email: email.to_string(),
        password: password.to_string(),
        role: UserRole::Admin,
    })?;

    tracing::info!(
        user_id = admin.meta.id,
        email = %admin.email,
        "Initial admin user created"
    );
    Ok(Some(admin))
}

/// Auto-setup from environment variables.
///
/// Checks for `YIAGA_ADMIN_EMAIL` and `YIAGA_ADMIN_PASSWORD` (plus optional
/// `YIAGA_ADMIN_USERNAME`) and creates an admin if both are set and no
/// users exist.
///
/// # Errors
///
/// Returns error if user creation fails.
pub fn auto_setup_from_env(users: &UserStore) -> Result<Option<User>, ApiError> {
    let email = match std::env::var("YIAGA_ADMIN_EMAIL") {
        Ok(e) if !e.is_empty() => e,
        _ => return Ok(None),
    };

    let password = match std::env::var("YIAGA_ADMIN_PASSWORD") {
        Ok(p) if !p.is_empty() => p,
        _ => return Ok(None),
    };

    let username = std::env::var("YIAGA_ADMIN_USERNAME")
        .ok()
        .filter(|u| !u.is_empty())
        .unwrap_or_else(|| DEFAULT_ADMIN_USERNAME.to_string());

    bootstrap_admin(users, &username, &email, &password)
}

/// Generate a secure random password.
#[must_use]
pub fn generate_password(length: usize) -> String {
    const CHARSET: &[u8] =
        b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789!@#$%^&*";
    let mut rng = rand::thread_rng();

    (0..length)
        .map(|_| char::from(CHARSET[rng.gen_range(0..CHARSET.len())]))
        .collect()
}
