// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Domain Repository Interfaces
//!
//! Persistence contracts for each aggregate root, following the DDD Repository
//! pattern: one repository per aggregate, interface defined in the domain layer,
//! implemented in `crate::infrastructure::repositories`.
//!
//! | Trait | Aggregate | Implementations |
//! |-------|-----------|----------------|
//! | `AgentRepository` | `Agent` | `InMemoryAgentRepository`, `PostgresAgentRepository` |
//! | `FederatedRegistryRepository` | `FederatedRegistry` | `InMemoryFederatedRegistryRepository`, `PostgresFederatedRegistryRepository` |
//! | `ApiKeyRepository` | `ApiKey` | `InMemoryApiKeyRepository`, `PostgresApiKeyRepository` |
//!
//! ## Storage Backend Abstraction
//!
//! Concrete implementations are selected at startup: in-memory when no
//! `database.url` is configured, PostgreSQL otherwise.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::agent::{Agent, AgentId};
use crate::domain::api_key::ApiKey;
use crate::domain::registry::{FederatedRegistry, RegistryId};

/// Storage backend enum for pluggable persistence
#[derive(Debug, Clone)]
pub enum StorageBackend {
    InMemory,
    PostgreSQL(PostgresConfig),
}

#[derive(Debug, Clone)]
pub struct PostgresConfig {
    pub connection_string: String,
    pub max_connections: u32,
}

/// Repository interface for locally registered agents.
#[async_trait]
pub trait AgentRepository: Send + Sync {
    /// Save agent (create or update)
    async fn save(&self, agent: &Agent) -> Result<(), RepositoryError>;

    async fn find_by_id(&self, id: AgentId) -> Result<Option<Agent>, RepositoryError>;

    /// Fetch many agents at once. Order of the result is unspecified and
    /// unknown ids are silently absent.
    async fn find_by_ids(&self, ids: &[AgentId]) -> Result<Vec<Agent>, RepositoryError>;

    async fn list_all(&self) -> Result<Vec<Agent>, RepositoryError>;

    /// Returns `false` when no agent had this id.
    async fn delete(&self, id: AgentId) -> Result<bool, RepositoryError>;
}

/// Repository interface for configured peer registries.
#[async_trait]
pub trait FederatedRegistryRepository: Send + Sync {
    async fn save(&self, registry: &FederatedRegistry) -> Result<(), RepositoryError>;

    async fn find_by_id(&self, id: RegistryId) -> Result<Option<FederatedRegistry>, RepositoryError>;

    async fn find_by_url(&self, url: &str) -> Result<Option<FederatedRegistry>, RepositoryError>;

    /// All peers in configuration order.
    async fn list_all(&self) -> Result<Vec<FederatedRegistry>, RepositoryError>;

    /// Returns `false` when no peer had this id.
    async fn delete(&self, id: RegistryId) -> Result<bool, RepositoryError>;
}

#[async_trait]
pub trait ApiKeyRepository: Send + Sync {
    async fn save(&self, key: &ApiKey) -> Result<(), RepositoryError>;

    async fn find_by_hash(&self, key_hash: &str) -> Result<Option<ApiKey>, RepositoryError>;

    async fn delete(&self, id: Uuid) -> Result<bool, RepositoryError>;
}

/// Repository errors
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("Entity not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => RepositoryError::NotFound("Row not found".to_string()),
            _ => RepositoryError::Database(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for RepositoryError {
    fn from(err: serde_json::Error) -> Self {
        RepositoryError::Serialization(err.to_string())
    }
}
