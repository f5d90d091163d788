// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! API key authentication.
//!
//! Secrets arrive in the `X-API-Key` header, are hashed with SHA-256 and
//! looked up in the `ApiKeyRepository`. A bootstrap admin key from the
//! configuration is installed at startup so a fresh node can be administered.

use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

use crate::domain::api_key::{ApiKey, KeyScope};
use crate::domain::repository::{ApiKeyRepository, RepositoryError};

const BOOTSTRAP_KEY_NAME: &str = "bootstrap";
const BOOTSTRAP_OWNER: &str = "admin";

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("missing API key")]
    MissingKey,

    #[error("invalid or expired API key")]
    InvalidKey,

    #[error("this operation requires an admin key")]
    Forbidden,

    #[error("key store failed: {0}")]
    Repository(#[from] RepositoryError),
}

/// The authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Principal {
    pub key_id: uuid::Uuid,
    pub owner: String,
    pub scope: KeyScope,
}

impl Principal {
    pub fn is_admin(&self) -> bool {
        self.scope == KeyScope::Admin
    }

    pub fn require_admin(&self) -> Result<(), AuthError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AuthError::Forbidden)
        }
    }
}

impl From<&ApiKey> for Principal {
    fn from(key: &ApiKey) -> Self {
        Self {
            key_id: key.id,
            owner: key.owner.clone(),
            scope: key.scope,
        }
    }
}

/// A freshly issued key. `secret` is only ever returned here.
#[derive(Debug, Clone, Serialize)]
pub struct IssuedKey {
    #[serde(flatten)]
    pub key: ApiKey,
    pub secret: String,
}

#[async_trait]
pub trait AuthService: Send + Sync {
    async fn authenticate(&self, secret: Option<&str>) -> Result<Principal, AuthError>;

    async fn issue_key(&self, name: &str, owner: &str, scope: KeyScope) -> Result<IssuedKey, AuthError>;

    /// Returns `false` when no key had this id.
    async fn revoke_key(&self, id: uuid::Uuid) -> Result<bool, AuthError>;
}

pub struct StandardAuthService {
    keys: Arc<dyn ApiKeyRepository>,
}

impl StandardAuthService {
    pub fn new(keys: Arc<dyn ApiKeyRepository>) -> Self {
        Self { keys }
    }

    /// Install `secret` as an admin key unless it is already known.
    pub async fn install_bootstrap_key(&self, secret: &str) -> Result<(), AuthError> {
        let hash = ApiKey::hash_secret(secret);
        if self.keys.find_by_hash(&hash).await?.is_some() {
            return Ok(());
        }

        let key = ApiKey::from_secret(BOOTSTRAP_KEY_NAME, BOOTSTRAP_OWNER, KeyScope::Admin, secret);
        self.keys.save(&key).await?;
        info!(key_id = %key.id, "Bootstrap admin key installed");
        Ok(())
    }
}

#[async_trait]
impl AuthService for StandardAuthService {
    async fn authenticate(&self, secret: Option<&str>) -> Result<Principal, AuthError> {
        let secret = secret
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or(AuthError::MissingKey)?;

        let key = self
            .keys
            .find_by_hash(&ApiKey::hash_secret(secret))
            .await?
            .ok_or(AuthError::InvalidKey)?;

        if !key.verify(secret) || key.is_expired(Utc::now()) {
            return Err(AuthError::InvalidKey);
        }
        Ok(Principal::from(&key))
    }

    async fn issue_key(&self, name: &str, owner: &str, scope: KeyScope) -> Result<IssuedKey, AuthError> {
        let (key, secret) = ApiKey::issue(name, owner, scope);
        self.keys.save(&key).await?;
        info!(key_id = %key.id, %owner, scope = scope.as_str(), "API key issued");
        Ok(IssuedKey { key, secret })
    }

    async fn revoke_key(&self, id: uuid::Uuid) -> Result<bool, AuthError> {
        let revoked = self.keys.delete(id).await?;
        if revoked {
            info!(key_id = %id, "API key revoked");
        }
        Ok(revoked)
    }
}
