// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # PostgreSQL Federated Registry Repository
//!
//! Peer registries in the `federated_registries` table. `list_all` returns
//! rows in configuration order (`created_at`, then `id`).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgRow};
use sqlx::Row;
use uuid::Uuid;

use crate::domain::registry::{FederatedRegistry, ReachabilityStatus, RegistryId};
use crate::domain::repository::{FederatedRegistryRepository, RepositoryError};

pub struct PostgresFederatedRegistryRepository {
    pool: PgPool,
}

impl PostgresFederatedRegistryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_registry(row: &PgRow) -> FederatedRegistry {
        let id: Uuid = row.get("id");
        let status: String = row.get("status");
        let created_at: DateTime<Utc> = row.get("created_at");
        let last_checked_at: Option<DateTime<Utc>> = row.get("last_checked_at");

        FederatedRegistry {
            id: RegistryId(id),
            name: row.get("name"),
            url: row.get("url"),
            api_key: row.get("api_key"),
            status: ReachabilityStatus::parse(&status),
            enabled: row.get("enabled"),
            created_at,
            last_checked_at,
        }
    }
}

#[async_trait]
impl FederatedRegistryRepository for PostgresFederatedRegistryRepository {
    async fn save(&self, registry: &FederatedRegistry) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO federated_registries (
                id, name, url, api_key, status, enabled, created_at, last_checked_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (id) DO UPDATE SET
                name = EXCLUDED.name,
                url = EXCLUDED.url,
                api_key = EXCLUDED.api_key,
                status = EXCLUDED.status,
                enabled = EXCLUDED.enabled,
                last_checked_at = EXCLUDED.last_checked_at
            "#,
        )
        .bind(registry.id.0)
        .bind(&registry.name)
        .bind(&registry.url)
        .bind(&registry.api_key)
        .bind(registry.status.as_str())
        .bind(registry.enabled)
        .bind(registry.created_at)
        .bind(registry.last_checked_at)
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(format!("Failed to save federated registry: {}", e)))?;

        Ok(())
    }

    async fn find_by_id(&self, id: RegistryId) -> Result<Option<FederatedRegistry>, RepositoryError> {
        let row = sqlx::query(
            r#"
            SELECT id, name, url, api_key, status, enabled, created_at, last_checked_at
            FROM federated_registries
            WHERE id = $1
            "#,
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(Self::row_to_registry))
    }

    async fn find_by_url(&self, url: &str) -> Result<Option<FederatedRegistry>, RepositoryError> {
        let row = sqlx::query(
            r#"
            SELECT id, name, url, api_key, status, enabled, created_at, last_checked_at
            FROM federated_registries
            WHERE url = $1
            "#,
        )
        .bind(url)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(Self::row_to_registry))
    }

    async fn list_all(&self) -> Result<Vec<FederatedRegistry>, RepositoryError> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, url, api_key, status, enabled, created_at, last_checked_at
            FROM federated_registries
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(Self::row_to_registry).collect())
    }

    async fn delete(&self, id: RegistryId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM federated_registries WHERE id = $1")
            .bind(id.0)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
