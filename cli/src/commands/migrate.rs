// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Database Migrate Command
//!
//! Implements `hibiscus migrate`, applying pending schema migrations to the
//! PostgreSQL database named in the `database` config section.
//!
//! # Usage
//!
//! ```bash
//! # Apply all pending migrations
//! hibiscus migrate
//!
//! # Preview migrations without applying
//! hibiscus migrate --dry-run
//! ```

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;

use hibiscus_registry_core::domain::node_config::RegistryConfig;
use hibiscus_registry_core::infrastructure::db::Database;

#[derive(Args)]
pub struct MigrateCommand {
    /// Perform a dry run without applying changes
    #[arg(long)]
    dry_run: bool,
}

pub async fn execute(cmd: MigrateCommand, config_path: Option<PathBuf>) -> Result<()> {
    println!("{}", "Hibiscus Migrate".bold().green());

    let config = RegistryConfig::load_or_default(config_path).context("Failed to load configuration")?;
    let backend = config.storage_backend()?;

    println!("Connecting to database...");
    let database = Database::connect(&backend)
        .await?
        .context("No database configured. Add a `database` section to run migrations.")?;

    let pending = database.pending_migrations().await?;
    if pending.is_empty() {
        println!("{}", "✓ Database is up to date.".green());
        return Ok(());
    }

    println!("Pending migrations:");
    for (version, description) in &pending {
        println!(" - {} {}", version, description);
    }

    if cmd.dry_run {
        println!("Skipping application due to --dry-run");
        return Ok(());
    }

    println!("Applying pending migrations...");
    database.migrate().await?;
    println!("{}", "✓ Database updated successfully.".green());

    Ok(())
}
