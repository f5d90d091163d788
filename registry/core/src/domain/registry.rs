// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Federated Registry Aggregate
//!
//! A `FederatedRegistry` is a peer instance of this service that has been
//! explicitly configured by an operator. It is the unit the federation
//! client talks to and the source named in a federated agent's provenance.
//!
//! Lifecycle: created by an admin action after an initial reachability
//! probe, updated by re-probes and credential rotation, deleted on request.
//! Deletion only removes the peer from the active set; nothing fetched from
//! a peer is ever persisted.
//!
//! Configuration order (`created_at`, then `id`) is the order in which peer
//! results are merged into a federated search.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use url::Url;
use uuid::Uuid;

use crate::domain::validation::{require_text, ValidationError};

const MAX_REGISTRY_NAME_LEN: usize = 128;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegistryId(pub Uuid);

impl RegistryId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl Default for RegistryId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RegistryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Last known reachability of a peer, as recorded by the most recent probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReachabilityStatus {
    Reachable,
    Unreachable,
    #[default]
    Unknown,
}

impl ReachabilityStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReachabilityStatus::Reachable => "reachable",
            ReachabilityStatus::Unreachable => "unreachable",
            ReachabilityStatus::Unknown => "unknown",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "reachable" => ReachabilityStatus::Reachable,
            "unreachable" => ReachabilityStatus::Unreachable,
            _ => ReachabilityStatus::Unknown,
        }
    }
}

impl fmt::Display for ReachabilityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FederatedRegistry {
    pub id: RegistryId,
    pub name: String,
    /// Normalized base URL, no trailing slash.
    pub url: String,
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub status: ReachabilityStatus,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub last_checked_at: Option<DateTime<Utc>>,
}

impl FederatedRegistry {
    /// Validate admin input and build an unprobed registry record.
    pub fn new(name: &str, url: &str, api_key: Option<String>) -> Result<Self, ValidationError> {
        require_text("name", name, MAX_REGISTRY_NAME_LEN)?;
        let url = normalize_registry_url(url)?;

        Ok(Self {
            id: RegistryId::new(),
            name: name.trim().to_string(),
            url,
            api_key: normalize_api_key(api_key),
            status: ReachabilityStatus::Unknown,
            enabled: true,
            created_at: Utc::now(),
            last_checked_at: None,
        })
    }

    pub fn record_probe(&mut self, reachable: bool, at: DateTime<Utc>) {
        self.status = if reachable {
            ReachabilityStatus::Reachable
        } else {
            ReachabilityStatus::Unreachable
        };
        self.last_checked_at = Some(at);
    }

    pub fn rotate_api_key(&mut self, api_key: Option<String>) {
        self.api_key = normalize_api_key(api_key);
    }

    pub fn rename(&mut self, name: &str) -> Result<(), ValidationError> {
        require_text("name", name, MAX_REGISTRY_NAME_LEN)?;
        self.name = name.trim().to_string();
        Ok(())
    }

    /// Absolute URL of `path` on this peer.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.url, path.trim_start_matches('/'))
    }

    /// Ordering used for snapshots and for merging peer results.
    pub fn configuration_order(a: &Self, b: &Self) -> Ordering {
        a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id))
    }

    pub fn summary(&self) -> RegistrySummary {
        RegistrySummary::from(self)
    }
}

/// Client-facing view of a peer with its credential redacted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistrySummary {
    pub id: RegistryId,
    pub name: String,
    pub url: String,
    pub has_api_key: bool,
    pub status: ReachabilityStatus,
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
    pub last_checked_at: Option<DateTime<Utc>>,
}

impl From<&FederatedRegistry> for RegistrySummary {
    fn from(registry: &FederatedRegistry) -> Self {
        Self {
            id: registry.id,
            name: registry.name.clone(),
            url: registry.url.clone(),
            has_api_key: registry.api_key.is_some(),
            status: registry.status,
            enabled: registry.enabled,
            created_at: registry.created_at,
            last_checked_at: registry.last_checked_at,
        }
    }
}

/// Require an absolute http(s) URL with a host; strip query, fragment and
/// trailing slashes.
pub fn normalize_registry_url(raw: &str) -> Result<String, ValidationError> {
    let invalid = |reason: &str| ValidationError::InvalidUrl {
        url: raw.to_string(),
        reason: reason.to_string(),
    };

    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField { field: "url" });
    }

    let parsed = Url::parse(trimmed).map_err(|e| invalid(&e.to_string()))?;
    match parsed.scheme() {
        "http" | "https" => {}
        other => return Err(invalid(&format!("unsupported scheme '{}'", other))),
    }
    if parsed.host_str().map_or(true, str::is_empty) {
        return Err(invalid("missing host"));
    }
    if parsed.query().is_some() || parsed.fragment().is_some() {
        return Err(invalid("query strings and fragments are not allowed"));
    }

    Ok(parsed.as_str().trim_end_matches('/').to_string())
}

fn normalize_api_key(api_key: Option<String>) -> Option<String> {
    api_key
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty())
}

fn default_enabled() -> bool {
    true
}
