// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Repository Implementations
//!
//! This module provides infrastructure implementations of repository abstractions
//! defined in the domain layer, following the Repository pattern from DDD.
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure
//! - **Purpose:** Persist and retrieve domain aggregates
//! - **Pattern:** Repository (DDD), Adapter (Hexagonal Architecture)
//!
//! # Available Implementations
//!
//! ## PostgreSQL Repositories
//!
//! - **PostgresAgentRepository** - Locally registered agents
//! - **PostgresFederatedRegistryRepository** - Configured peer registries
//! - **PostgresApiKeyRepository** - Hashed API credentials
//!
//! ## In-Memory Repositories
//!
//! Used when no database is configured, and by the test suites:
//! - **InMemoryAgentRepository**
//! - **InMemoryFederatedRegistryRepository**
//! - **InMemoryApiKeyRepository**

pub mod postgres_agent;
pub mod postgres_api_key;
pub mod postgres_registry;

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::agent::{Agent, AgentId};
use crate::domain::api_key::ApiKey;
use crate::domain::registry::{FederatedRegistry, RegistryId};
use crate::domain::repository::{
    AgentRepository, ApiKeyRepository, FederatedRegistryRepository, RepositoryError,
};

#[derive(Clone, Default)]
pub struct InMemoryAgentRepository {
    agents: Arc<RwLock<HashMap<AgentId, Agent>>>,
}

impl InMemoryAgentRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AgentRepository for InMemoryAgentRepository {
    async fn save(&self, agent: &Agent) -> Result<(), RepositoryError> {
        self.agents.write().insert(agent.id, agent.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: AgentId) -> Result<Option<Agent>, RepositoryError> {
        Ok(self.agents.read().get(&id).cloned())
    }

    async fn find_by_ids(&self, ids: &[AgentId]) -> Result<Vec<Agent>, RepositoryError> {
        let agents = self.agents.read();
        Ok(ids.iter().filter_map(|id| agents.get(id).cloned()).collect())
    }

    async fn list_all(&self) -> Result<Vec<Agent>, RepositoryError> {
        let mut all: Vec<Agent> = self.agents.read().values().cloned().collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(all)
    }

    async fn delete(&self, id: AgentId) -> Result<bool, RepositoryError> {
        Ok(self.agents.write().remove(&id).is_some())
    }
}

#[derive(Clone, Default)]
pub struct InMemoryFederatedRegistryRepository {
    registries: Arc<RwLock<HashMap<RegistryId, FederatedRegistry>>>,
}

impl InMemoryFederatedRegistryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FederatedRegistryRepository for InMemoryFederatedRegistryRepository {
    async fn save(&self, registry: &FederatedRegistry) -> Result<(), RepositoryError> {
        self.registries.write().insert(registry.id, registry.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: RegistryId) -> Result<Option<FederatedRegistry>, RepositoryError> {
        Ok(self.registries.read().get(&id).cloned())
    }

    async fn find_by_url(&self, url: &str) -> Result<Option<FederatedRegistry>, RepositoryError> {
        Ok(self
            .registries
            .read()
            .values()
            .find(|r| r.url == url)
            .cloned())
    }

    async fn list_all(&self) -> Result<Vec<FederatedRegistry>, RepositoryError> {
        let mut all: Vec<FederatedRegistry> = self.registries.read().values().cloned().collect();
        all.sort_by(FederatedRegistry::configuration_order);
        Ok(all)
    }

    async fn delete(&self, id: RegistryId) -> Result<bool, RepositoryError> {
        Ok(self.registries.write().remove(&id).is_some())
    }
}

#[derive(Clone, Default)]
pub struct InMemoryApiKeyRepository {
    keys: Arc<RwLock<HashMap<Uuid, ApiKey>>>,
}

impl InMemoryApiKeyRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ApiKeyRepository for InMemoryApiKeyRepository {
    async fn save(&self, key: &ApiKey) -> Result<(), RepositoryError> {
        self.keys.write().insert(key.id, key.clone());
        Ok(())
    }

    async fn find_by_hash(&self, key_hash: &str) -> Result<Option<ApiKey>, RepositoryError> {
        Ok(self
            .keys
            .read()
            .values()
            .find(|k| k.key_hash == key_hash)
            .cloned())
    }

    async fn delete(&self, id: Uuid) -> Result<bool, RepositoryError> {
        Ok(self.keys.write().remove(&id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::agent::AgentDraft;
    use crate::domain::api_key::KeyScope;
    use chrono::{Duration, Utc};

    fn agent(name: &str) -> Agent {
        Agent::register(
            AgentDraft {
                name: name.to_string(),
                description: format!("{} agent", name),
                ..Default::default()
            },
            "owner-1",
        )
    }

    #[tokio::test]
    async fn test_agent_find_by_ids_preserves_request_order() {
        let repo = InMemoryAgentRepository::new();
        let a = agent("a");
        let b = agent("b");
        repo.save(&a).await.unwrap();
        repo.save(&b).await.unwrap();

        let found = repo
            .find_by_ids(&[b.id, AgentId::new(), a.id])
            .await
            .unwrap();
        let ids: Vec<AgentId> = found.iter().map(|x| x.id).collect();
        assert_eq!(ids, vec![b.id, a.id]);
    }

    #[tokio::test]
    async fn test_agent_delete_reports_presence() {
        let repo = InMemoryAgentRepository::new();
        let a = agent("a");
        repo.save(&a).await.unwrap();

        assert!(repo.delete(a.id).await.unwrap());
        assert!(!repo.delete(a.id).await.unwrap());
        assert!(repo.find_by_id(a.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_registries_listed_in_configuration_order() {
        let repo = InMemoryFederatedRegistryRepository::new();
        let now = Utc::now();

        let mut first = FederatedRegistry::new("first", "https://one.example.com", None).unwrap();
        first.created_at = now - Duration::minutes(5);
        let mut second = FederatedRegistry::new("second", "https://two.example.com", None).unwrap();
        second.created_at = now;

        repo.save(&second).await.unwrap();
        repo.save(&first).await.unwrap();

        let names: Vec<String> = repo
            .list_all()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.name)
            .collect();
        assert_eq!(names, vec!["first", "second"]);

        let by_url = repo.find_by_url("https://two.example.com").await.unwrap();
        assert_eq!(by_url.map(|r| r.id), Some(second.id));
    }

    #[tokio::test]
    async fn test_api_key_lookup_by_hash() {
        let repo = InMemoryApiKeyRepository::new();
        let (key, secret) = ApiKey::issue("ci", "ops", KeyScope::Read);
        repo.save(&key).await.unwrap();

        let found = repo.find_by_hash(&ApiKey::hash_secret(&secret)).await.unwrap();
        assert_eq!(found.map(|k| k.id), Some(key.id));
        assert!(repo.find_by_hash("nope").await.unwrap().is_none());
    }
}
