// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use async_trait::async_trait;
use sqlx::postgres::PgPool;
use sqlx::Row;
use uuid::Uuid;

use crate::domain::api_key::{ApiKey, KeyScope};
use crate::domain::repository::{ApiKeyRepository, RepositoryError};

pub struct PostgresApiKeyRepository {
    pool: PgPool,
}

impl PostgresApiKeyRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ApiKeyRepository for PostgresApiKeyRepository {
    async fn save(&self, key: &ApiKey) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO api_keys (id, name, owner, key_hash, scope, created_at, expires_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (key_hash) DO UPDATE SET
                name = EXCLUDED.name,
                owner = EXCLUDED.owner,
                scope = EXCLUDED.scope,
                expires_at = EXCLUDED.expires_at
            "#,
        )
        .bind(key.id)
        .bind(&key.name)
        .bind(&key.owner)
        .bind(&key.key_hash)
        .bind(key.scope.as_str())
        .bind(key.created_at)
        .bind(key.expires_at)
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(format!("Failed to save API key: {}", e)))?;

        Ok(())
    }

    async fn find_by_hash(&self, key_hash: &str) -> Result<Option<ApiKey>, RepositoryError> {
        let row = sqlx::query(
            r#"
            SELECT id, name, owner, key_hash, scope, created_at, expires_at
            FROM api_keys
            WHERE key_hash = $1
            "#,
        )
        .bind(key_hash)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| {
            let scope: String = row.get("scope");
            ApiKey {
                id: row.get("id"),
                name: row.get("name"),
                owner: row.get("owner"),
                key_hash: row.get("key_hash"),
                scope: KeyScope::parse(&scope),
                created_at: row.get("created_at"),
                expires_at: row.get("expires_at"),
            }
        }))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM api_keys WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
