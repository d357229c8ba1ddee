//! API server.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    http::{
        Method,
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
    },
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use yiaga_core::{Config, Store};

use crate::ServerError;
use crate::auth::{AuthState, JwtManager, UserStore, setup::auto_setup_from_env};
use crate::routes;

/// State shared by every handler.
#[derive(Clone)]
pub struct AppState {
    /// Loaded configuration.
    pub config: Arc<Config>,
    /// Token manager and credential store.
    pub auth: Arc<AuthState>,
    /// Record store.
    pub store: Store,
}

impl AppState {
    /// Wire up state from a configuration and an open store.
    ///
    /// # Errors
    ///
    /// Returns error if the user collection cannot be opened.
    pub fn new(config: Config, store: Store) -> Result<Self, ServerError> {
        let users = UserStore::open(&store, config.auth.org_email_domain.clone())?;
        let jwt = JwtManager::from_configured(config.auth.jwt_secret.as_deref());

        Ok(Self {
            config: Arc::new(config),
            auth: Arc::new(AuthState::new(jwt, users)),
            store,
        })
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("auth", &self.auth)
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}

/// API server.
#[derive(Debug)]
pub struct Server {
    state: AppState,
}

/// Builder for constructing a [`Server`].
#[derive(Debug, Default)]
pub struct ServerBuilder {
    config: Config,
    store: Option<Store>,
}

impl ServerBuilder {
    /// Create a new builder with default config.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set configuration.
    #[must_use]
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Use an already-open store instead of opening the configured one.
    #[must_use]
    pub fn with_store(mut self, store: Store) -> Self {
        self.store = Some(store);
        self
    }

    /// Build the server.
    ///
    /// Validates the configuration, opens the store, and bootstraps the
    /// first admin from the environment if no users exist.
    ///
    /// # Errors
    ///
    /// Returns error if the configuration is invalid or storage fails.
    pub fn build(self) -> Result<Server, ServerError> {
        self.config
            .validate()
            .map_err(|e| ServerError::Config(e.to_string()))?;

        let store = match self.store {
            Some(store) => store,
            None => {
                let data_dir = self.config.data_dir();
                std::fs::create_dir_all(&data_dir)?;
                Store::open(&data_dir)?
            }
        };

        let state = AppState::new(self.config, store)?;
        auto_setup_from_env(&state.auth.users)
            .map_err(|e| ServerError::Config(format!("Admin bootstrap failed: {e}")))?;

        if state.auth.users.is_empty() {
            tracing::warn!(
                "No users configured. Set YIAGA_ADMIN_EMAIL and YIAGA_ADMIN_PASSWORD or run `yiaga admin create`"
            );
        }

        Ok(Server { state })
    }
}

impl Server {
    /// Shared state.
    #[must_use]
    pub const fn state(&self) -> &AppState {
        &self.state
    }

    /// Full application: API routes, uploaded files, tracing, and CORS.
    pub fn app(&self) -> Router {
        let config = &self.state.config;
        let upload_prefix = format!("/{}", config.uploads.url_prefix.trim_matches('/'));

        let app = routes::router(self.state.clone())
            .nest_service(&upload_prefix, ServeDir::new(config.upload_dir()));

        let cors = config.server.cors.then(|| {
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PUT,
                    Method::DELETE,
                    Method::OPTIONS,
                ])
                .allow_headers([ACCEPT, AUTHORIZATION, CONTENT_TYPE])
                .max_age(Duration::from_secs(300))
        });

        app.layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .option_layer(cors),
        )
    }

    /// Run until Ctrl-C.
    ///
    /// # Errors
    ///
    /// Returns error if the address is invalid or the listener fails.
    pub async fn run(self) -> Result<(), ServerError> {
        let server = &self.state.config.server;
        let addr: SocketAddr = format!("{}:{}", server.bind_address, server.port)
            .parse()
            .map_err(|e| ServerError::Config(format!("Invalid address: {e}")))?;

        let app = self.app();
        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!("Yiaga API listening on http://{}", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| ServerError::Server(e.to_string()))?;

        self.state.store.flush()?;
        tracing::info!("Server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
