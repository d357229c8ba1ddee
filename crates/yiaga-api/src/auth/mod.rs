//! Authentication and authorization for the API.
//!
//! This module provides:
//! - Password hashing and verification (argon2)
//! - Signed, time-bounded access tokens (HS256 JWT)
//! - The access gate applied to admin routes
//! - Identity records with the organisation-domain role invariant
//! - First-run admin bootstrap

mod gate;
mod jwt;
pub mod password;
/// First-run admin bootstrap.
pub mod setup;
mod users;

pub use gate::{AuthState, authorize, bearer_token, require_auth};
pub use jwt::{Claims, JwtManager, TOKEN_LIFETIME_SECS};
pub use users::{NewUser, PublicUser, User, UserRole, UserStore, UserUpdate};

use thiserror::Error;

/// Authentication errors.
///
/// Every variant except `Hashing` and `Signing` is reported to the client
/// as 401; the variant itself is kept for diagnostics.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// No `Authorization` header on the request.
    #[error("Authorization header required")]
    MissingHeader,

    /// Header or token could not be parsed.
    #[error("Invalid token format")]
    Malformed,

    /// Token MAC does not match.
    #[error("Invalid token signature")]
    InvalidSignature,

    /// Token is past its expiry.
    #[error("Token expired")]
    Expired,

    /// Email or password did not match.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Password hashing failed.
    #[error("Password hashing failed: {0}")]
    Hashing(String),

    /// Token signing failed.
    #[error("Token signing failed: {0}")]
    Signing(String),
}

impl AuthError {
    /// Machine-readable error code for responses.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::MissingHeader => "missing_authorization",
            Self::Malformed => "malformed_token",
            Self::InvalidSignature => "invalid_signature",
            Self::Expired => "token_expired",
            Self::InvalidCredentials => "invalid_credentials",
            Self::Hashing(_) | Self::Signing(_) => "internal_error",
        }
    }

    /// Whether this is a server-side failure rather than a rejected caller.
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Hashing(_) | Self::Signing(_))
    }
}
