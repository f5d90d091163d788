// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # PostgreSQL Agent Repository
//!
//! `AgentRepository` backed by the `agents` table. List-valued fields are
//! stored as JSONB. Only local agents are ever written here; federated
//! agents live for the duration of one request.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgRow};
use sqlx::Row;
use uuid::Uuid;

use crate::domain::agent::{Agent, AgentId, Provenance};
use crate::domain::repository::{AgentRepository, RepositoryError};

const AGENT_COLUMNS: &str = "id, name, description, domains, capabilities, tags, owner_id, \
     is_team, members, api_endpoint, version, created_at, updated_at";

pub struct PostgresAgentRepository {
    pool: PgPool,
}

impl PostgresAgentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_agent(row: &PgRow) -> Result<Agent, RepositoryError> {
        let id: Uuid = row.get("id");
        let domains: serde_json::Value = row.get("domains");
        let capabilities: serde_json::Value = row.get("capabilities");
        let tags: serde_json::Value = row.get("tags");
        let members: serde_json::Value = row.get("members");
        let created_at: DateTime<Utc> = row.get("created_at");
        let updated_at: Option<DateTime<Utc>> = row.get("updated_at");

        Ok(Agent {
            id: AgentId(id),
            name: row.get("name"),
            description: row.get("description"),
            domains: serde_json::from_value(domains)?,
            capabilities: serde_json::from_value(capabilities)?,
            tags: serde_json::from_value(tags)?,
            owner_id: row.get("owner_id"),
            created_at,
            updated_at,
            is_team: row.get("is_team"),
            members: serde_json::from_value(members)?,
            api_endpoint: row.get("api_endpoint"),
            version: row.get("version"),
            provenance: Provenance::Local,
        })
    }
}

#[async_trait]
impl AgentRepository for PostgresAgentRepository {
    async fn save(&self, agent: &Agent) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO agents (
                id, name, description, domains, capabilities, tags, owner_id,
                is_team, members, api_endpoint, version, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            ON CONFLICT (id) DO UPDATE SET
                name = EXCLUDED.name,
                description = EXCLUDED.description,
                domains = EXCLUDED.domains,
                capabilities = EXCLUDED.capabilities,
                tags = EXCLUDED.tags,
                is_team = EXCLUDED.is_team,
                members = EXCLUDED.members,
                api_endpoint = EXCLUDED.api_endpoint,
                version = EXCLUDED.version,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(agent.id.0)
        .bind(&agent.name)
        .bind(&agent.description)
        .bind(serde_json::to_value(&agent.domains)?)
        .bind(serde_json::to_value(&agent.capabilities)?)
        .bind(serde_json::to_value(&agent.tags)?)
        .bind(&agent.owner_id)
        .bind(agent.is_team)
        .bind(serde_json::to_value(&agent.members)?)
        .bind(&agent.api_endpoint)
        .bind(&agent.version)
        .bind(agent.created_at)
        .bind(agent.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(format!("Failed to save agent: {}", e)))?;

        Ok(())
    }

    async fn find_by_id(&self, id: AgentId) -> Result<Option<Agent>, RepositoryError> {
        let row = sqlx::query(&format!("SELECT {} FROM agents WHERE id = $1", AGENT_COLUMNS))
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::row_to_agent).transpose()
    }

    async fn find_by_ids(&self, ids: &[AgentId]) -> Result<Vec<Agent>, RepositoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let raw: Vec<Uuid> = ids.iter().map(|id| id.0).collect();

        let rows = sqlx::query(&format!(
            "SELECT {} FROM agents WHERE id = ANY($1)",
            AGENT_COLUMNS
        ))
        .bind(&raw)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_agent).collect()
    }

    async fn list_all(&self) -> Result<Vec<Agent>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM agents ORDER BY created_at DESC, id ASC",
            AGENT_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_agent).collect()
    }

    async fn delete(&self, id: AgentId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM agents WHERE id = $1")
            .bind(id.0)
            .execute(&self.pool)
            .await
            .map_err(|e| RepositoryError::Database(format!("Failed to delete agent: {}", e)))?;

        Ok(result.rows_affected() > 0)
    }
}
