// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Repository Factory - Application Layer
//!
//! Creates concrete repository and search-index implementations from the
//! node configuration, keeping the domain layer free of infrastructure
//! choices.
//!
//! - Domain layer: defines the repository and search-index traits
//! - Application layer: picks an implementation per configured backend
//! - Infrastructure layer: provides the implementations
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Wire storage and search backends

use anyhow::{Context, Result};
use std::sync::Arc;

use crate::domain::node_config::{resolve_secret, SearchIndexConfig};
use crate::domain::repository::{AgentRepository, ApiKeyRepository, FederatedRegistryRepository};
use crate::domain::search::SearchIndex;
use crate::infrastructure::db::Database;
use crate::infrastructure::repositories::postgres_agent::PostgresAgentRepository;
use crate::infrastructure::repositories::postgres_api_key::PostgresApiKeyRepository;
use crate::infrastructure::repositories::postgres_registry::PostgresFederatedRegistryRepository;
use crate::infrastructure::repositories::{
    InMemoryAgentRepository, InMemoryApiKeyRepository, InMemoryFederatedRegistryRepository,
};
use crate::infrastructure::search::{InMemorySearchIndex, TypesenseSearchIndex};

/// Creates an AgentRepository: PostgreSQL when a database is connected, else in-memory
pub fn create_agent_repository(db: Option<&Database>) -> Arc<dyn AgentRepository> {
    match db {
        Some(db) => Arc::new(PostgresAgentRepository::new(db.get_pool().clone())),
        None => Arc::new(InMemoryAgentRepository::new()),
    }
}

/// Creates a FederatedRegistryRepository for the configured backend
pub fn create_registry_repository(db: Option<&Database>) -> Arc<dyn FederatedRegistryRepository> {
    match db {
        Some(db) => Arc::new(PostgresFederatedRegistryRepository::new(db.get_pool().clone())),
        None => Arc::new(InMemoryFederatedRegistryRepository::new()),
    }
}

/// Creates an ApiKeyRepository for the configured backend
pub fn create_api_key_repository(db: Option<&Database>) -> Arc<dyn ApiKeyRepository> {
    match db {
        Some(db) => Arc::new(PostgresApiKeyRepository::new(db.get_pool().clone())),
        None => Arc::new(InMemoryApiKeyRepository::new()),
    }
}

/// Creates the local search index.
///
/// The in-memory index is seeded from the agent store; Typesense gets its
/// collection created if missing.
pub async fn create_search_index(
    config: &SearchIndexConfig,
    agents: &Arc<dyn AgentRepository>,
) -> Result<Arc<dyn SearchIndex>> {
    match config {
        SearchIndexConfig::Memory => {
            let existing = agents
                .list_all()
                .await
                .context("Failed to load agents for the in-memory search index")?;
            tracing::info!(agents = existing.len(), "Seeded in-memory search index");
            Ok(Arc::new(InMemorySearchIndex::from_agents(existing)))
        }
        SearchIndexConfig::Typesense {
            url,
            api_key,
            collection,
        } => {
            let api_key = resolve_secret(api_key).context("Failed to resolve search_index.api_key")?;
            let index = TypesenseSearchIndex::new(url.as_str(), api_key, collection.as_str())
                .context("Failed to build Typesense client")?;
            index
                .ensure_collection()
                .await
                .context("Failed to prepare Typesense collection")?;
            Ok(Arc::new(index))
        }
    }
}
