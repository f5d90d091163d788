// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Federated registry management commands
//!
//! Commands: add, list, show, update, probe, remove

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;
use uuid::Uuid;

use hibiscus_registry_core::domain::registry::{ReachabilityStatus, RegistrySummary};

use crate::client::{PeerUpdate, RegistryClient};

#[derive(Subcommand)]
pub enum PeerCommand {
    /// Add a federated registry
    Add {
        /// Display name
        #[arg(value_name = "NAME")]
        name: String,

        /// Base URL of the peer's public API
        #[arg(value_name = "URL")]
        url: String,

        /// API key presented to the peer
        #[arg(long)]
        peer_key: Option<String>,
    },

    /// List federated registries in configuration order
    List,

    /// Show one federated registry
    Show {
        #[arg(value_name = "REGISTRY_ID")]
        id: Uuid,
    },

    /// Update name, credential or enabled flag
    Update {
        #[arg(value_name = "REGISTRY_ID")]
        id: Uuid,

        #[arg(long)]
        name: Option<String>,

        /// Replace the peer API key
        #[arg(long, conflicts_with = "clear_peer_key")]
        peer_key: Option<String>,

        /// Remove the peer API key
        #[arg(long)]
        clear_peer_key: bool,

        #[arg(long, conflicts_with = "disable")]
        enable: bool,

        #[arg(long)]
        disable: bool,
    },

    /// Re-check a registry's reachability
    Probe {
        #[arg(value_name = "REGISTRY_ID")]
        id: Uuid,
    },

    /// Remove a federated registry
    Remove {
        #[arg(value_name = "REGISTRY_ID")]
        id: Uuid,
    },
}

pub async fn handle_command(command: PeerCommand, client: &RegistryClient) -> Result<()> {
    match command {
        PeerCommand::Add {
            name,
            url,
            peer_key,
        } => {
            let peer = client.add_peer(&name, &url, peer_key).await?;
            println!("{}", format!("✓ Federated registry added: {}", peer.id).green());
            if peer.status == ReachabilityStatus::Unreachable {
                println!(
                    "{}",
                    "⚠ The registry is currently unreachable; it will be skipped until it answers."
                        .yellow()
                );
            }
            print_peer(&peer);
        }
        PeerCommand::List => {
            let peers = client.list_peers().await?;
            if peers.is_empty() {
                println!("{}", "No federated registries configured.".dimmed());
                return Ok(());
            }
            println!(
                "{:<38} {:<20} {:<12} {:<8} {}",
                "ID".bold(),
                "NAME".bold(),
                "STATUS".bold(),
                "ENABLED".bold(),
                "URL".bold()
            );
            for peer in &peers {
                println!(
                    "{:<38} {:<20} {:<12} {:<8} {}",
                    peer.id,
                    peer.name,
                    colored_status(peer.status),
                    if peer.enabled { "yes" } else { "no" },
                    peer.url
                );
            }
        }
        PeerCommand::Show { id } => {
            let peer = client.get_peer(id).await?;
            print_peer(&peer);
        }
        PeerCommand::Update {
            id,
            name,
            peer_key,
            clear_peer_key,
            enable,
            disable,
        } => {
            let enabled = match (enable, disable) {
                (true, _) => Some(true),
                (_, true) => Some(false),
                _ => None,
            };
            let update = PeerUpdate {
                name,
                api_key: peer_key,
                clear_api_key: clear_peer_key,
                enabled,
            };
            let peer = client.update_peer(id, &update).await?;
            println!("{}", "✓ Federated registry updated".green());
            print_peer(&peer);
        }
        PeerCommand::Probe { id } => {
            let peer = client.probe_peer(id).await?;
            println!("{} is {}", peer.name.bold(), colored_status(peer.status));
        }
        PeerCommand::Remove { id } => {
            client.remove_peer(id).await?;
            println!("{}", format!("✓ Federated registry removed: {}", id).green());
        }
    }

    Ok(())
}

fn colored_status(status: ReachabilityStatus) -> colored::ColoredString {
    match status {
        ReachabilityStatus::Reachable => status.as_str().green(),
        ReachabilityStatus::Unreachable => status.as_str().red(),
        ReachabilityStatus::Unknown => status.as_str().dimmed(),
    }
}

fn print_peer(peer: &RegistrySummary) {
    println!("  ID: {}", peer.id);
    println!("  Name: {}", peer.name);
    println!("  URL: {}", peer.url);
    println!("  Status: {}", colored_status(peer.status));
    println!("  Enabled: {}", peer.enabled);
    println!("  API key: {}", if peer.has_api_key { "set" } else { "none" });
    match peer.last_checked_at {
        Some(at) => println!("  Last checked: {}", at.to_rfc3339()),
        None => println!("  Last checked: {}", "never".dimmed()),
    }
}
