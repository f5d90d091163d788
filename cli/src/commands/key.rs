// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! API key management commands

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;
use uuid::Uuid;

use hibiscus_registry_core::domain::api_key::KeyScope;

use crate::client::RegistryClient;

#[derive(Subcommand)]
pub enum KeyCommand {
    /// Issue a new API key
    Issue {
        /// Label for the key
        #[arg(value_name = "NAME")]
        name: String,

        /// Owner recorded on agents registered with this key
        #[arg(long)]
        owner: String,

        /// Grant admin scope
        #[arg(long)]
        admin: bool,
    },

    /// Revoke an API key by id
    Revoke {
        #[arg(value_name = "KEY_ID")]
        id: Uuid,
    },
}

pub async fn handle_command(command: KeyCommand, client: &RegistryClient) -> Result<()> {
    match command {
        KeyCommand::Issue { name, owner, admin } => {
            let scope = if admin { KeyScope::Admin } else { KeyScope::Read };
            let issued = client.issue_key(&name, &owner, scope).await?;
            println!("{}", format!("✓ API key issued: {}", issued.id).green());
            println!("  Name: {}", issued.name);
            println!("  Owner: {}", issued.owner);
            println!("  Scope: {}", issued.scope.as_str());
            println!("  Secret: {}", issued.secret.bold());
            println!("{}", "Store the secret now; it cannot be shown again.".yellow());
        }
        KeyCommand::Revoke { id } => {
            client.revoke_key(id).await?;
            println!("{}", format!("✓ API key revoked: {}", id).green());
        }
    }

    Ok(())
}
