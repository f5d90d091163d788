// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # PostgreSQL Connection Pool
//!
//! Wraps `sqlx::postgres::PgPool` in a thin `Database` newtype that can be
//! injected into all PostgreSQL repository implementations. Only constructed
//! when `database.url` is configured; otherwise every repository is
//! in-memory.

use anyhow::{Context, Result};
use sqlx::postgres::{PgPool, PgPoolOptions};

use crate::domain::repository::{PostgresConfig, StorageBackend};

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    pub async fn new(config: &PostgresConfig) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.connection_string)
            .await
            .context("Failed to connect to PostgreSQL")?;

        Ok(Self { pool })
    }

    /// Connect when the backend is PostgreSQL; `None` for in-memory.
    pub async fn connect(backend: &StorageBackend) -> Result<Option<Self>> {
        match backend {
            StorageBackend::InMemory => Ok(None),
            StorageBackend::PostgreSQL(config) => Ok(Some(Self::new(config).await?)),
        }
    }

    /// Apply pending schema migrations.
    pub async fn migrate(&self) -> Result<()> {
        MIGRATOR
            .run(&self.pool)
            .await
            .context("Failed to apply migrations")?;
        tracing::info!("Database migrations applied");
        Ok(())
    }

    /// Migrations embedded in this build that the database has not applied.
    pub async fn pending_migrations(&self) -> Result<Vec<(i64, String)>> {
        // The tracking table does not exist before the first migration run.
        let applied: Vec<i64> = sqlx::query_scalar("SELECT version FROM _sqlx_migrations")
            .fetch_all(&self.pool)
            .await
            .unwrap_or_default();

        Ok(MIGRATOR
            .iter()
            .filter(|m| !applied.contains(&m.version))
            .map(|m| (m.version, m.description.to_string()))
            .collect())
    }

    pub fn get_pool(&self) -> &PgPool {
        &self.pool
    }
}
