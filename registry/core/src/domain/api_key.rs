// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # API Keys
//!
//! Callers authenticate with an `X-API-Key` header. Only the SHA-256 digest
//! of a key is stored; the raw secret is shown once, at issue time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use uuid::Uuid;

const KEY_PREFIX: &str = "hib_";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyScope {
    Read,
    Admin,
}

impl KeyScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyScope::Read => "read",
            KeyScope::Admin => "admin",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "admin" => KeyScope::Admin,
            _ => KeyScope::Read,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiKey {
    pub id: Uuid,
    pub name: String,
    /// Principal the key acts for; recorded as `owner_id` on agents it creates.
    pub owner: String,
    #[serde(skip_serializing)]
    pub key_hash: String,
    pub scope: KeyScope,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl ApiKey {
    /// Generate a fresh key. Returns the record and the raw secret.
    pub fn issue(name: &str, owner: &str, scope: KeyScope) -> (Self, String) {
        let secret = format!(
            "{}{}{}",
            KEY_PREFIX,
            Uuid::new_v4().simple(),
            Uuid::new_v4().simple()
        );
        let key = Self::from_secret(name, owner, scope, &secret);
        (key, secret)
    }

    /// Build a record for a secret supplied out of band (bootstrap keys).
    pub fn from_secret(name: &str, owner: &str, scope: KeyScope, secret: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            owner: owner.to_string(),
            key_hash: Self::hash_secret(secret),
            scope,
            created_at: Utc::now(),
            expires_at: None,
        }
    }

    pub fn hash_secret(secret: &str) -> String {
        hex::encode(Sha256::digest(secret.as_bytes()))
    }

    pub fn verify(&self, secret: &str) -> bool {
        let candidate = Self::hash_secret(secret);
        candidate.as_bytes().ct_eq(self.key_hash.as_bytes()).into()
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }

    pub fn is_admin(&self) -> bool {
        self.scope == KeyScope::Admin
    }
}
