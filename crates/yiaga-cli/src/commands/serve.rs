//! Serve command - run the HTTP API.

use anyhow::Result;
use yiaga_core::Config;

use crate::ui;

/// Serve command arguments.
#[derive(Debug, Clone, Default)]
pub struct ServeArgs {
    /// Port override.
    pub port: Option<u16>,
    /// Bind address override.
    pub bind: Option<String>,
}

/// Start the API server and block until Ctrl-C.
///
/// # Errors
///
/// Returns error if the server fails to start.
pub async fn run_serve(mut config: Config, args: ServeArgs) -> Result<()> {
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(bind) = args.bind {
        config.server.bind_address = bind;
    }

    ui::header("Starting Yiaga API");
    ui::kv(
        "Address",
        &format!("{}:{}", config.server.bind_address, config.server.port),
    );
    ui::kv("Data", &config.data_dir().display().to_string());
    ui::kv("Uploads", &config.upload_dir().display().to_string());
    if config.auth.jwt_secret.is_none() {
        ui::warning("No signing secret configured; tokens will not survive a restart");
        ui::info("Run 'yiaga config init' to generate one");
    }
    println!();
    ui::info("Press Ctrl+C to stop");
    tracing::info!(
        bind = %config.server.bind_address,
        port = config.server.port,
        data_dir = %config.data_dir().display(),
        "Starting API server"
    );

    yiaga_api::start(config).await?;
    Ok(())
}
