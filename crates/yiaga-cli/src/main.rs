//! Yiaga CLI - run the CMS API and manage accounts.

mod commands;
mod ui;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};
use yiaga_core::{Config, config::LogFormat};

#[derive(Parser)]
#[command(name = "yiaga")]
#[command(about = "Yiaga CMS backend")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (defaults to ~/.yiaga/yiaga.json)
    #[arg(long, global = true, env = "YIAGA_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API server
    Serve {
        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,

        /// Bind address
        #[arg(long)]
        bind: Option<String>,
    },

    /// Account management, run against the database directly
    Admin {
        #[command(subcommand)]
        action: AdminCommands,

        /// Data directory override
        #[arg(long, global = true)]
        data_dir: Option<PathBuf>,
    },

    /// Configuration file helpers
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum AdminCommands {
    /// Create a new user
    Create {
        /// Username for the new user
        #[arg(long)]
        username: String,

        /// Email address
        #[arg(long)]
        email: String,

        /// Password (or use --generate-password)
        #[arg(long)]
        password: Option<String>,

        /// User role: admin, editor, technical, or user
        #[arg(long, default_value = "admin")]
        role: String,

        /// Generate a random password
        #[arg(long, conflicts_with = "password")]
        generate_password: bool,
    },

    /// List all users
    List,

    /// Reset a user's password
    ResetPassword {
        /// Email of the user
        #[arg(long)]
        email: String,

        /// New password; generated if omitted
        #[arg(long)]
        password: Option<String>,
    },

    /// Delete a user
    Delete {
        /// Email of the user to delete
        #[arg(long)]
        email: String,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Write a config file with a freshly generated signing secret
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Validate configuration
    Validate,

    /// Print the config file path
    Path,
}

fn init_logging(verbose: bool, format: LogFormat) {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let json = format == LogFormat::Json;

    tracing_subscriber::registry()
        .with(filter)
        .with(json.then(|| fmt::layer().json()))
        .with((!json).then(|| fmt::layer().with_target(false)))
        .init();
}

/// Load the config and start logging as it asks.
fn setup(config_path: &std::path::Path, verbose: bool) -> anyhow::Result<Config> {
    let config = commands::load_config(config_path)?;
    init_logging(verbose || config.settings.debug, config.settings.log_format);
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config_path = cli.config.unwrap_or_else(Config::default_path);

    match cli.command {
        Commands::Serve { port, bind } => {
            let config = setup(&config_path, cli.verbose)?;
            commands::run_serve(config, commands::serve::ServeArgs { port, bind }).await?;
        }

        Commands::Admin { action, data_dir } => {
            let config = setup(&config_path, cli.verbose)?;
            let args = commands::admin::AdminArgs {
                action: match action {
                    AdminCommands::Create {
                        username,
                        email,
                        password,
                        role,
                        generate_password,
                    } => commands::admin::AdminAction::Create {
                        username,
                        email,
                        password,
                        role,
                        generate_password,
                    },
                    AdminCommands::List => commands::admin::AdminAction::List,
                    AdminCommands::ResetPassword { email, password } => {
                        commands::admin::AdminAction::ResetPassword { email, password }
                    }
                    AdminCommands::Delete { email } => {
                        commands::admin::AdminAction::Delete { email }
                    }
                },
                data_dir,
            };
            commands::run_admin(&config, args)?;
        }

        // Works on the file itself, so a broken file must not stop it.
        Commands::Config { action } => {
            init_logging(cli.verbose, LogFormat::Pretty);
            let action = match action {
                ConfigCommands::Init { force } => commands::config::ConfigAction::Init { force },
                ConfigCommands::Validate => commands::config::ConfigAction::Validate,
                ConfigCommands::Path => commands::config::ConfigAction::Path,
            };
            commands::run_config(&config_path, action)?;
        }
    }

    Ok(())
}
