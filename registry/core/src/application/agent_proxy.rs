// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Agent Lookup Use Case
//!
//! Resolves a compound [`AgentRef`] to a full agent record. Local references
//! are answered from the agent store; federated references are proxied live
//! to the owning peer on every call, with no caching.
//!
//! Every unresolved lookup surfaces as [`ProxyError::NotFound`] carrying a
//! [`NotFoundCause`]. Callers see a plain "not found"; the cause is for logs.

use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

use crate::domain::agent::{Agent, AgentId, AgentRef, Provenance};
use crate::domain::federation::{FederationClient, FederationError};
use crate::domain::node_config::FederationConfig;
use crate::domain::registry::RegistryId;
use crate::domain::repository::{AgentRepository, FederatedRegistryRepository, RepositoryError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotFoundCause {
    LocalAgentAbsent,
    PeerNotConfigured,
    PeerDisabled,
    PeerUnreachable,
    AgentAbsentOnPeer,
    PeerMalformedResponse,
}

impl NotFoundCause {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotFoundCause::LocalAgentAbsent => "local_agent_absent",
            NotFoundCause::PeerNotConfigured => "peer_not_configured",
            NotFoundCause::PeerDisabled => "peer_disabled",
            NotFoundCause::PeerUnreachable => "peer_unreachable",
            NotFoundCause::AgentAbsentOnPeer => "agent_absent_on_peer",
            NotFoundCause::PeerMalformedResponse => "peer_malformed_response",
        }
    }
}

impl fmt::Display for NotFoundCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&FederationError> for NotFoundCause {
    fn from(err: &FederationError) -> Self {
        match err {
            FederationError::PeerNotFound => NotFoundCause::AgentAbsentOnPeer,
            FederationError::PeerMalformedResponse(_) => NotFoundCause::PeerMalformedResponse,
            FederationError::PeerUnreachable(_)
            | FederationError::PeerTimeout(_)
            | FederationError::PeerRejected(_) => NotFoundCause::PeerUnreachable,
        }
    }
}

#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("agent not found ({0})")]
    NotFound(NotFoundCause),

    #[error("agent store failed: {0}")]
    Repository(#[from] RepositoryError),
}

impl ProxyError {
    pub fn cause(&self) -> Option<NotFoundCause> {
        match self {
            ProxyError::NotFound(cause) => Some(*cause),
            ProxyError::Repository(_) => None,
        }
    }
}

#[async_trait]
pub trait AgentProxyService: Send + Sync {
    async fn get_agent(&self, reference: AgentRef) -> Result<Agent, ProxyError>;
}

pub struct StandardAgentProxyService {
    agents: Arc<dyn AgentRepository>,
    registries: Arc<dyn FederatedRegistryRepository>,
    federation: Arc<dyn FederationClient>,
    peer_timeout: Duration,
}

impl StandardAgentProxyService {
    pub fn new(
        agents: Arc<dyn AgentRepository>,
        registries: Arc<dyn FederatedRegistryRepository>,
        federation: Arc<dyn FederationClient>,
        config: &FederationConfig,
    ) -> Self {
        Self {
            agents,
            registries,
            federation,
            peer_timeout: Duration::from_millis(config.peer_timeout_ms),
        }
    }

    async fn local(&self, id: AgentId) -> Result<Agent, ProxyError> {
        self.agents
            .find_by_id(id)
            .await?
            .map(|a| a.with_provenance(Provenance::Local))
            .ok_or(ProxyError::NotFound(NotFoundCause::LocalAgentAbsent))
    }

    async fn federated(&self, registry_id: RegistryId, agent_id: AgentId) -> Result<Agent, ProxyError> {
        let peer = self
            .registries
            .find_by_id(registry_id)
            .await?
            .ok_or(ProxyError::NotFound(NotFoundCause::PeerNotConfigured))?;

        if !peer.enabled {
            return Err(ProxyError::NotFound(NotFoundCause::PeerDisabled));
        }

        let result = match tokio::time::timeout(
            self.peer_timeout,
            self.federation.fetch_agent(&peer, agent_id),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(FederationError::PeerTimeout(self.peer_timeout.as_millis() as u64)),
        };

        result
            .map(|agent| agent.with_provenance(Provenance::Federated { registry_id: peer.id }))
            .map_err(|e| {
                debug!(peer = %peer.name, error = %e, "Federated lookup failed");
                ProxyError::NotFound(NotFoundCause::from(&e))
            })
    }
}

#[async_trait]
impl AgentProxyService for StandardAgentProxyService {
    async fn get_agent(&self, reference: AgentRef) -> Result<Agent, ProxyError> {
        let result = match reference {
            AgentRef::Local(id) => self.local(id).await,
            AgentRef::Federated {
                registry_id,
                agent_id,
            } => self.federated(registry_id, agent_id).await,
        };

        if let Err(ProxyError::NotFound(cause)) = &result {
            info!(reference = %reference, %cause, "Agent lookup unresolved");
        }
        result
    }
}
