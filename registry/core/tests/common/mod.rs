// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Shared fixtures: a scriptable in-process peer network and a fully wired
//! in-memory registry node.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use hibiscus_registry_core::application::{
    StandardAgentCatalogService, StandardAgentProxyService, StandardAuthService,
    StandardFederatedSearchService, StandardRegistryAdminService,
};
use hibiscus_registry_core::domain::agent::{Agent, AgentDraft, AgentId};
use hibiscus_registry_core::domain::federation::{FederationClient, FederationError, PeerAgentPage};
use hibiscus_registry_core::domain::node_config::FederationConfig;
use hibiscus_registry_core::domain::registry::FederatedRegistry;
use hibiscus_registry_core::domain::repository::{AgentRepository, FederatedRegistryRepository};
use hibiscus_registry_core::domain::search::{SearchIndex, SearchQuery};
use hibiscus_registry_core::infrastructure::repositories::{
    InMemoryAgentRepository, InMemoryApiKeyRepository, InMemoryFederatedRegistryRepository,
};
use hibiscus_registry_core::infrastructure::search::InMemorySearchIndex;

pub const PEER_TIMEOUT_MS: u64 = 150;

/// How a scripted peer answers.
#[derive(Clone)]
pub enum PeerBehavior {
    Serve(Vec<Agent>),
    Fail(FederationError),
    Hang,
}

/// Fake peer network keyed by registry URL.
#[derive(Default)]
pub struct ScriptedPeers {
    behaviors: RwLock<HashMap<String, PeerBehavior>>,
    calls: RwLock<Vec<(String, SearchQuery, usize)>>,
}

impl ScriptedPeers {
    pub fn script(&self, url: &str, behavior: PeerBehavior) {
        self.behaviors.write().insert(url.to_string(), behavior);
    }

    pub fn search_calls(&self) -> Vec<(String, SearchQuery, usize)> {
        self.calls.read().clone()
    }

    fn behavior(&self, peer: &FederatedRegistry) -> Option<PeerBehavior> {
        self.behaviors.read().get(&peer.url).cloned()
    }
}

#[async_trait]
impl FederationClient for ScriptedPeers {
    async fn fetch_agents(
        &self,
        peer: &FederatedRegistry,
        query: &SearchQuery,
        window: usize,
    ) -> Result<PeerAgentPage, FederationError> {
        self.calls
            .write()
            .push((peer.url.clone(), query.clone(), window));

        match self.behavior(peer) {
            Some(PeerBehavior::Serve(agents)) => Ok(PeerAgentPage {
                agents: agents.into_iter().take(window).collect(),
                dropped: 0,
            }),
            Some(PeerBehavior::Fail(e)) => Err(e),
            Some(PeerBehavior::Hang) => {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok(PeerAgentPage::default())
            }
            None => Err(FederationError::PeerUnreachable("connection refused".to_string())),
        }
    }

    async fn fetch_agent(
        &self,
        peer: &FederatedRegistry,
        agent_id: AgentId,
    ) -> Result<Agent, FederationError> {
        match self.behavior(peer) {
            Some(PeerBehavior::Serve(agents)) => agents
                .into_iter()
                .find(|a| a.id == agent_id)
                .ok_or(FederationError::PeerNotFound),
            Some(PeerBehavior::Fail(e)) => Err(e),
            Some(PeerBehavior::Hang) => {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Err(FederationError::PeerNotFound)
            }
            None => Err(FederationError::PeerUnreachable("connection refused".to_string())),
        }
    }

    async fn probe(&self, peer: &FederatedRegistry) -> bool {
        matches!(self.behavior(peer), Some(PeerBehavior::Serve(_)))
    }
}

/// Agents named `{prefix}{i}`, each tagged `shared` and `{prefix}`.
pub fn make_agents(prefix: &str, count: usize) -> Vec<Agent> {
    let base = Utc::now();
    (0..count)
        .map(|i| {
            let mut agent = Agent::register(
                AgentDraft {
                    name: format!("{}{}", prefix, i),
                    description: format!("{} agent number {}", prefix, i),
                    tags: vec!["shared".to_string(), prefix.to_lowercase()],
                    ..Default::default()
                },
                "fixture",
            );
            // Newest first in the local index, so index i is position i.
            agent.created_at = base - ChronoDuration::seconds(i as i64);
            agent
        })
        .collect()
}

pub fn names(agents: &[Agent]) -> Vec<String> {
    agents.iter().map(|a| a.name.clone()).collect()
}

pub struct TestNode {
    pub agents: Arc<InMemoryAgentRepository>,
    pub registries: Arc<InMemoryFederatedRegistryRepository>,
    pub peers: Arc<ScriptedPeers>,
    pub search: StandardFederatedSearchService,
    pub proxy: StandardAgentProxyService,
    pub admin: StandardRegistryAdminService,
    pub catalog: StandardAgentCatalogService,
    pub auth: StandardAuthService,
}

impl TestNode {
    pub async fn with_local(local: Vec<Agent>) -> Self {
        let config = FederationConfig {
            peer_timeout_ms: PEER_TIMEOUT_MS,
            probe_timeout_ms: PEER_TIMEOUT_MS,
            ..Default::default()
        };

        let agents = Arc::new(InMemoryAgentRepository::new());
        for agent in &local {
            agents.save(agent).await.unwrap();
        }
        let index: Arc<dyn SearchIndex> = Arc::new(InMemorySearchIndex::from_agents(local));
        let registries = Arc::new(InMemoryFederatedRegistryRepository::new());
        let peers = Arc::new(ScriptedPeers::default());

        Self {
            search: StandardFederatedSearchService::new(
                agents.clone(),
                registries.clone(),
                index.clone(),
                peers.clone(),
                &config,
            ),
            proxy: StandardAgentProxyService::new(
                agents.clone(),
                registries.clone(),
                peers.clone(),
                &config,
            ),
            admin: StandardRegistryAdminService::new(registries.clone(), peers.clone()),
            catalog: StandardAgentCatalogService::new(agents.clone(), index),
            auth: StandardAuthService::new(Arc::new(InMemoryApiKeyRepository::new())),
            agents,
            registries,
            peers,
        }
    }

    /// Configure a peer directly, `position` seconds after the first one.
    pub async fn add_peer(&self, name: &str, behavior: PeerBehavior, position: i64) -> FederatedRegistry {
        let url = format!("https://{}.example.org", name.to_lowercase());
        self.peers.script(&url, behavior);

        let mut peer = FederatedRegistry::new(name, &url, Some(format!("{}-key", name))).unwrap();
        peer.created_at = Utc::now() - ChronoDuration::hours(1) + ChronoDuration::seconds(position);
        self.registries.save(&peer).await.unwrap();
        peer
    }
}
