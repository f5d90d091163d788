// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # Hibiscus Registry CLI
//!
//! The `hibiscus` binary runs a registry node and administers running ones.
//!
//! ## Commands
//!
//! - `hibiscus serve` - Run the registry HTTP API
//! - `hibiscus peer add|list|show|update|probe|remove` - Manage federated registries
//! - `hibiscus key issue|revoke` - Manage API keys
//! - `hibiscus config show|validate|generate` - Configuration management
//! - `hibiscus migrate` - Apply database migrations
//!
//! Admin commands talk to a running node over HTTP and authenticate with
//! `--api-key` / `HIBISCUS_API_KEY`.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing::info;

use hibiscus_registry::client::RegistryClient;
use hibiscus_registry::commands::{self, ConfigCommand, KeyCommand, MigrateCommand, PeerCommand};
use hibiscus_registry::server;
use hibiscus_registry_core::domain::node_config::RegistryConfig;

/// Hibiscus - federated AI agent registry
#[derive(Parser)]
#[command(name = "hibiscus")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(
        short,
        long,
        global = true,
        env = "HIBISCUS_CONFIG_PATH",
        value_name = "FILE"
    )]
    config: Option<PathBuf>,

    /// HTTP API port (default: server.port from config, 8000)
    #[arg(long, global = true, env = "HIBISCUS_PORT")]
    port: Option<u16>,

    /// HTTP API host; bind address for `serve`, target for admin commands
    #[arg(long, global = true, env = "HIBISCUS_HOST")]
    host: Option<String>,

    /// API key sent with admin commands
    #[arg(long, global = true, env = "HIBISCUS_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "HIBISCUS_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Log output format
    #[arg(long, global = true, env = "HIBISCUS_LOG_FORMAT", value_enum, default_value_t = LogFormat::Compact)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Compact,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the registry HTTP API
    #[command(name = "serve")]
    Serve,

    /// Manage federated registries on a running node
    #[command(name = "peer")]
    Peer {
        #[command(subcommand)]
        command: PeerCommand,
    },

    /// Manage API keys on a running node
    #[command(name = "key")]
    Key {
        #[command(subcommand)]
        command: KeyCommand,
    },

    /// Configuration management
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },

    /// Apply database migrations
    #[command(name = "migrate")]
    Migrate {
        #[command(flatten)]
        command: MigrateCommand,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env is fine
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    init_logging(&cli.log_level, cli.log_format)?;

    match cli.command {
        Commands::Serve => {
            let mut config = RegistryConfig::load_or_default(cli.config)
                .context("Failed to load configuration")?;
            if let Some(host) = cli.host {
                config.server.host = host;
            }
            if let Some(port) = cli.port {
                config.server.port = port;
            }
            info!(node = %config.node.name, "Starting Hibiscus registry");
            server::start_server(config).await
        }
        Commands::Peer { command } => {
            let client = admin_client(cli.host.as_deref(), cli.port, cli.api_key)?;
            commands::peer::handle_command(command, &client).await
        }
        Commands::Key { command } => {
            let client = admin_client(cli.host.as_deref(), cli.port, cli.api_key)?;
            commands::key::handle_command(command, &client).await
        }
        Commands::Config { command } => commands::config::handle_command(command, cli.config).await,
        Commands::Migrate { command } => commands::migrate::execute(command, cli.config).await,
    }
}

fn admin_client(host: Option<&str>, port: Option<u16>, api_key: Option<String>) -> Result<RegistryClient> {
    RegistryClient::new(host.unwrap_or("127.0.0.1"), port.unwrap_or(8000), api_key)
}

/// Initialize tracing subscriber for logging
fn init_logging(level: &str, format: LogFormat) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))
        .context("Failed to create log filter")?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    match format {
        LogFormat::Compact => builder.compact().init(),
        LogFormat::Json => builder.json().init(),
    }

    Ok(())
}
