//! # Yiaga API
//!
//! HTTP surface of the Yiaga CMS: login and signup, bearer-token gating,
//! public content reads, and the admin dashboard routes.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// Password hashing, tokens, the access gate, and user accounts.
pub mod auth;
/// API error type and JSON extractors.
pub mod error;
/// Request handlers.
pub mod handlers;
/// Route dispatch table.
pub mod routes;
mod server;

pub use auth::{AuthError, AuthState, Claims, JwtManager, User, UserRole, UserStore};
pub use error::{ApiError, ApiResult};
pub use server::{AppState, Server, ServerBuilder};

use yiaga_core::Config;

/// Start the API server.
///
/// # Errors
///
/// Returns error if server fails to start.
pub async fn start(config: Config) -> Result<(), ServerError> {
    let server = ServerBuilder::new().with_config(config).build()?;
    server.run().await
}

/// Server errors.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Server error.
    #[error("Server error: {0}")]
    Server(String),

    /// Configuration error.
    #[error("Config error: {0}")]
    Config(String),

    /// Storage error.
    #[error("Storage error: {0}")]
    Store(#[from] yiaga_core::StoreError),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
