// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Configuration management commands
//!
//! Commands: show, validate, generate

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use std::path::PathBuf;

use hibiscus_registry_core::domain::node_config::{RegistryConfig, SearchIndexConfig};

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Show config file paths checked
        #[arg(long)]
        paths: bool,
    },

    /// Validate configuration file
    Validate {
        /// Path to config file (default: discover)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },

    /// Generate sample configuration
    Generate {
        /// Output path (default: ./hibiscus-config.yaml)
        #[arg(short, long, default_value = "./hibiscus-config.yaml")]
        output: PathBuf,

        /// Include examples and comments
        #[arg(long)]
        examples: bool,
    },
}

pub async fn handle_command(command: ConfigCommand, config_override: Option<PathBuf>) -> Result<()> {
    match command {
        ConfigCommand::Show { paths } => show(config_override, paths).await,
        ConfigCommand::Validate { file } => validate(file.or(config_override)).await,
        ConfigCommand::Generate { output, examples } => generate(output, examples).await,
    }
}

async fn show(config_override: Option<PathBuf>, show_paths: bool) -> Result<()> {
    let config = RegistryConfig::load_or_default(config_override.clone())
        .context("Failed to load configuration")?;

    if show_paths {
        println!("{}", "Configuration discovery paths:".bold());
        if let Some(path) = &config_override {
            println!("  1. --config flag: {}", path.display());
        } else {
            println!("  1. --config flag: {}", "(not set)".dimmed());
        }
        println!(
            "  2. HIBISCUS_CONFIG_PATH: {}",
            std::env::var("HIBISCUS_CONFIG_PATH")
                .unwrap_or_else(|_| "(not set)".to_string())
                .dimmed()
        );
        println!("  3. ./hibiscus-config.yaml");
        println!("  4. ~/.hibiscus/config.yaml");
        println!();
    }

    println!("{}", "Current configuration:".bold());
    println!();

    println!("{}", "Node:".bold());
    println!("  Name: {}", config.node.name);
    println!("  Listen: {}:{}", config.server.host, config.server.port);
    println!();

    println!("{}", "Storage:".bold());
    match &config.database {
        Some(db) => {
            // Connection strings carry credentials
            let shown = if db.url.starts_with("env:") { db.url.as_str() } else { "(inline)" };
            println!("  Backend: postgresql ({})", shown);
            println!("  Max connections: {}", db.max_connections);
        }
        None => println!("  Backend: in-memory"),
    }
    println!();

    println!("{}", "Search index:".bold());
    match &config.search_index {
        SearchIndexConfig::Memory => println!("  Backend: memory"),
        SearchIndexConfig::Typesense { url, collection, .. } => {
            println!("  Backend: typesense");
            println!("  URL: {}", url);
            println!("  Collection: {}", collection);
        }
    }
    println!();

    println!("{}", "Federation:".bold());
    println!("  Peer timeout: {} ms", config.federation.peer_timeout_ms);
    println!("  Probe timeout: {} ms", config.federation.probe_timeout_ms);
    println!("  Results per peer: {}", config.federation.max_results_per_peer);
    println!();

    println!("{}", "Auth:".bold());
    println!(
        "  Bootstrap admin key: {}",
        if config.auth.bootstrap_admin_key.is_some() { "configured" } else { "(none)" }
    );
    if let Some(metrics) = &config.metrics {
        println!();
        println!("{}", "Metrics:".bold());
        println!("  Prometheus port: {}", metrics.port);
    }

    Ok(())
}

async fn validate(config_path: Option<PathBuf>) -> Result<()> {
    println!("Validating configuration...");

    let config = RegistryConfig::load_or_default(config_path)
        .context("Failed to load configuration")?;

    config
        .validate()
        .context("Configuration validation failed")?;

    println!("{}", "✓ Configuration is valid".green());

    Ok(())
}

async fn generate(output: PathBuf, with_examples: bool) -> Result<()> {
    let sample = if with_examples {
        include_str!("../../templates/config-with-examples.yaml")
    } else {
        include_str!("../../templates/config-minimal.yaml")
    };

    std::fs::write(&output, sample)
        .with_context(|| format!("Failed to write config to {:?}", output))?;

    println!(
        "{}",
        format!("✓ Configuration generated: {}", output.display()).green()
    );

    Ok(())
}
