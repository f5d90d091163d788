// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Registry Admin Use Case
//!
//! Administrative management of the peer set: add, list, inspect, update,
//! re-probe and remove federated registries.
//!
//! # Flow (add)
//!
//! 1. Validate name and URL, normalize the URL
//! 2. Reject a URL that is already configured
//! 3. Probe the peer's health endpoint synchronously
//! 4. Persist with status `reachable` or `unreachable`
//!
//! An unreachable peer is still accepted. It joins the active set and is
//! simply absent from results until it answers.

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use crate::domain::federation::FederationClient;
use crate::domain::registry::{FederatedRegistry, RegistryId};
use crate::domain::repository::{FederatedRegistryRepository, RepositoryError};
use crate::domain::validation::ValidationError;

#[derive(Debug, Error)]
pub enum AdminError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("federated registry {0} not found")]
    NotFound(RegistryId),

    #[error("registry store failed: {0}")]
    Repository(#[from] RepositoryError),
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewPeer {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub api_key: Option<String>,
}

/// Partial update of a peer. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PeerPatch {
    #[serde(default)]
    pub name: Option<String>,
    /// New credential. Ignored when `clear_api_key` is set.
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub clear_api_key: bool,
    #[serde(default)]
    pub enabled: Option<bool>,
}

#[async_trait]
pub trait RegistryAdminService: Send + Sync {
    async fn add_peer(&self, peer: NewPeer) -> Result<FederatedRegistry, AdminError>;

    /// All peers in configuration order.
    async fn list_peers(&self) -> Result<Vec<FederatedRegistry>, AdminError>;

    async fn get_peer(&self, id: RegistryId) -> Result<FederatedRegistry, AdminError>;

    async fn update_peer(&self, id: RegistryId, patch: PeerPatch) -> Result<FederatedRegistry, AdminError>;

    /// Re-run the health probe and record the outcome.
    async fn probe_peer(&self, id: RegistryId) -> Result<FederatedRegistry, AdminError>;

    async fn remove_peer(&self, id: RegistryId) -> Result<(), AdminError>;
}

pub struct StandardRegistryAdminService {
    registries: Arc<dyn FederatedRegistryRepository>,
    federation: Arc<dyn FederationClient>,
}

impl StandardRegistryAdminService {
    pub fn new(
        registries: Arc<dyn FederatedRegistryRepository>,
        federation: Arc<dyn FederationClient>,
    ) -> Self {
        Self {
            registries,
            federation,
        }
    }
}

#[async_trait]
impl RegistryAdminService for StandardRegistryAdminService {
    async fn add_peer(&self, peer: NewPeer) -> Result<FederatedRegistry, AdminError> {
        let mut registry = FederatedRegistry::new(&peer.name, &peer.url, peer.api_key)?;

        if self.registries.find_by_url(&registry.url).await?.is_some() {
            return Err(ValidationError::DuplicateUrl(registry.url).into());
        }

        let reachable = self.federation.probe(&registry).await;
        registry.record_probe(reachable, Utc::now());
        if !reachable {
            warn!(name = %registry.name, url = %registry.url, "Adding federated registry that is currently unreachable");
        }

        self.registries.save(&registry).await?;
        info!(id = %registry.id, name = %registry.name, status = %registry.status, "Federated registry added");
        Ok(registry)
    }

    async fn list_peers(&self) -> Result<Vec<FederatedRegistry>, AdminError> {
        let mut peers = self.registries.list_all().await?;
        peers.sort_by(FederatedRegistry::configuration_order);
        Ok(peers)
    }

    async fn get_peer(&self, id: RegistryId) -> Result<FederatedRegistry, AdminError> {
        self.registries
            .find_by_id(id)
            .await?
            .ok_or(AdminError::NotFound(id))
    }

    async fn update_peer(&self, id: RegistryId, patch: PeerPatch) -> Result<FederatedRegistry, AdminError> {
        let mut registry = self.get_peer(id).await?;

        if let Some(name) = &patch.name {
            registry.rename(name)?;
        }
        if patch.clear_api_key {
            registry.rotate_api_key(None);
        } else if patch.api_key.is_some() {
            registry.rotate_api_key(patch.api_key);
        }
        if let Some(enabled) = patch.enabled {
            registry.enabled = enabled;
        }

        self.registries.save(&registry).await?;
        info!(id = %registry.id, enabled = registry.enabled, "Federated registry updated");
        Ok(registry)
    }

    async fn probe_peer(&self, id: RegistryId) -> Result<FederatedRegistry, AdminError> {
        let mut registry = self.get_peer(id).await?;
        let reachable = self.federation.probe(&registry).await;
        registry.record_probe(reachable, Utc::now());
        self.registries.save(&registry).await?;
        Ok(registry)
    }

    async fn remove_peer(&self, id: RegistryId) -> Result<(), AdminError> {
        if !self.registries.delete(id).await? {
            return Err(AdminError::NotFound(id));
        }
        info!(%id, "Federated registry removed");
        Ok(())
    }
}
