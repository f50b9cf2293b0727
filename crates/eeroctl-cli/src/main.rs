//! eeroctl - control an eero network from the terminal.
//!
//! Runs an interactive shell by default. Subcommands cover the one-shot
//! operations and `serve` starts the JSON bridge used by the chore
//! scheduler.

mod commands;
mod console;
mod server;
mod shell;

use std::io;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use eeroctl_core::{Config, EeroClient, Session};

use console::Console;
use server::AppState;
use shell::Shell;

#[derive(Debug, Parser)]
#[command(name = "eeroctl", version, about = "Control an eero network")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Interactive shell (the default)
    Shell,
    /// Log in with an SMS verification code
    Login {
        /// Phone number or email; prompted for when omitted
        #[arg(long)]
        phone: Option<String>,
    },
    /// Forget the stored session
    Logout,
    /// Show the device status of one or all configured profiles
    Status { profile: Option<String> },
    /// Pause a configured profile
    Pause { profile: String },
    /// Unpause a configured profile
    Unpause { profile: String },
    /// Wait until a profile gets paused, then unpause it
    UnpauseWhenReady { profile: String },
    /// Run the HTTP bridge
    Serve {
        #[arg(long, default_value = "0.0.0.0")]
        host: String,
        #[arg(long, env = "PORT", default_value_t = 3000)]
        port: u16,
    },
}

/// Initialize the tracing subscriber for logging
fn init_tracing(default_level: &str) {
    // RUST_LOG wins when set (e.g., RUST_LOG=eeroctl_core=debug)
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Commands::Shell);
    init_tracing(match command {
        Commands::Serve { .. } => "info",
        _ => "warn",
    });

    let config = Config::load().context("Failed to load config")?;
    let state_dir = config.state_dir();
    let session = Session::load(&state_dir)
        .with_context(|| format!("Failed to load session from {}", state_dir.display()))?
        .into_handle();
    let client = EeroClient::new(&config, session).context("Failed to create API client")?;
    info!(
        endpoint = %config.api_endpoint,
        authenticated = client.is_authenticated(),
        "eeroctl starting"
    );

    match command {
        Commands::Shell => Shell::new(client, config).run().await,
        Commands::Login { phone } => {
            let mut console = Console::new();
            commands::login(&client, &mut console, phone).await
        }
        Commands::Logout => commands::logout(&client),
        Commands::Status { profile } => {
            commands::status(&client, &config, profile.as_deref()).await
        }
        Commands::Pause { profile } => commands::set_paused(&client, &config, &profile, true).await,
        Commands::Unpause { profile } => {
            commands::set_paused(&client, &config, &profile, false).await
        }
        Commands::UnpauseWhenReady { profile } => {
            commands::unpause_when_ready(&client, &config, &profile).await
        }
        Commands::Serve { host, port } => {
            let state = Arc::new(AppState::new(client, config));
            server::serve(state, &host, port).await
        }
    }
}
