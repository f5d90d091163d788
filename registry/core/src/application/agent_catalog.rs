// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Agent Catalog Use Case
//!
//! Registration and removal of local agents. The agent store is
//! authoritative; the search index is kept in step on a best-effort basis
//! and a failed index write is logged, not surfaced.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use crate::application::auth::Principal;
use crate::domain::agent::{Agent, AgentDraft, AgentId};
use crate::domain::repository::{AgentRepository, RepositoryError};
use crate::domain::search::SearchIndex;
use crate::domain::validation::ValidationError;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("agent {0} not found")]
    NotFound(AgentId),

    #[error("only the owner or an admin may modify agent {0}")]
    Forbidden(AgentId),

    #[error("agent store failed: {0}")]
    Repository(#[from] RepositoryError),
}

#[async_trait]
pub trait AgentCatalogService: Send + Sync {
    async fn register_agent(&self, caller: &Principal, draft: AgentDraft) -> Result<Agent, CatalogError>;

    async fn delete_agent(&self, caller: &Principal, id: AgentId) -> Result<(), CatalogError>;
}

pub struct StandardAgentCatalogService {
    agents: Arc<dyn AgentRepository>,
    index: Arc<dyn SearchIndex>,
}

impl StandardAgentCatalogService {
    pub fn new(agents: Arc<dyn AgentRepository>, index: Arc<dyn SearchIndex>) -> Self {
        Self { agents, index }
    }

    async fn check_members(&self, members: &[AgentId]) -> Result<(), CatalogError> {
        let unique: HashSet<AgentId> = members.iter().copied().collect();
        if unique.len() != members.len() {
            return Err(ValidationError::InvalidTeam("duplicate team member".to_string()).into());
        }

        let found: HashSet<AgentId> = self
            .agents
            .find_by_ids(members)
            .await?
            .into_iter()
            .map(|a| a.id)
            .collect();
        if let Some(missing) = members.iter().find(|id| !found.contains(id)) {
            return Err(
                ValidationError::InvalidTeam(format!("member {} is not a registered agent", missing)).into(),
            );
        }
        Ok(())
    }
}

#[async_trait]
impl AgentCatalogService for StandardAgentCatalogService {
    async fn register_agent(&self, caller: &Principal, draft: AgentDraft) -> Result<Agent, CatalogError> {
        draft.validate()?;
        if draft.is_team {
            self.check_members(&draft.members).await?;
        }

        let agent = Agent::register(draft, caller.owner.clone());
        self.agents.save(&agent).await?;

        if let Err(e) = self.index.upsert(&agent).await {
            warn!(agent_id = %agent.id, error = %e, "Agent stored but not indexed");
        }
        info!(agent_id = %agent.id, name = %agent.name, owner = %caller.owner, "Agent registered");
        Ok(agent)
    }

    async fn delete_agent(&self, caller: &Principal, id: AgentId) -> Result<(), CatalogError> {
        let agent = self
            .agents
            .find_by_id(id)
            .await?
            .ok_or(CatalogError::NotFound(id))?;

        let owns = agent.owner_id.as_deref() == Some(caller.owner.as_str());
        if !owns && !caller.is_admin() {
            return Err(CatalogError::Forbidden(id));
        }

        self.agents.delete(id).await?;
        if let Err(e) = self.index.remove(id).await {
            warn!(agent_id = %id, error = %e, "Agent deleted but still indexed");
        }
        info!(agent_id = %id, "Agent deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::api_key::KeyScope;
    use crate::domain::search::SearchQuery;
    use crate::infrastructure::repositories::InMemoryAgentRepository;
    use crate::infrastructure::search::InMemorySearchIndex;

    fn principal(owner: &str, scope: KeyScope) -> Principal {
        Principal {
            key_id: uuid::Uuid::new_v4(),
            owner: owner.to_string(),
            scope,
        }
    }

    fn draft(name: &str) -> AgentDraft {
        AgentDraft {
            name: name.to_string(),
            description: format!("{} agent", name),
            ..Default::default()
        }
    }

    fn service() -> (StandardAgentCatalogService, InMemorySearchIndex) {
        let index = InMemorySearchIndex::new();
        let service = StandardAgentCatalogService::new(
            Arc::new(InMemoryAgentRepository::new()),
            Arc::new(index.clone()),
        );
        (service, index)
    }

    #[tokio::test]
    async fn test_register_indexes_agent() {
        let (catalog, index) = service();
        let owner = principal("team-a", KeyScope::Read);

        let agent = catalog.register_agent(&owner, draft("Scout")).await.unwrap();
        assert_eq!(agent.owner_id.as_deref(), Some("team-a"));
        assert!(agent.provenance.is_local());

        let page = index.search(&SearchQuery::default().with_search("scout")).await.unwrap();
        assert_eq!(page.hits, vec![agent.id]);
    }

    #[tokio::test]
    async fn test_team_members_must_exist() {
        let (catalog, _) = service();
        let owner = principal("team-a", KeyScope::Read);
        let member = catalog.register_agent(&owner, draft("Member")).await.unwrap();

        let mut team = draft("Team");
        team.is_team = true;
        team.members = vec![member.id, AgentId::new()];
        assert!(matches!(
            catalog.register_agent(&owner, team.clone()).await,
            Err(CatalogError::Validation(ValidationError::InvalidTeam(_)))
        ));

        team.members = vec![member.id];
        assert!(catalog.register_agent(&owner, team).await.is_ok());
    }

    #[tokio::test]
    async fn test_delete_requires_owner_or_admin() {
        let (catalog, index) = service();
        let owner = principal("team-a", KeyScope::Read);
        let stranger = principal("team-b", KeyScope::Read);
        let admin = principal("ops", KeyScope::Admin);

        let agent = catalog.register_agent(&owner, draft("Scout")).await.unwrap();
        assert!(matches!(
            catalog.delete_agent(&stranger, agent.id).await,
            Err(CatalogError::Forbidden(_))
        ));

        catalog.delete_agent(&admin, agent.id).await.unwrap();
        assert!(index.is_empty());
        assert!(matches!(
            catalog.delete_agent(&owner, agent.id).await,
            Err(CatalogError::NotFound(_))
        ));
    }
}
