// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Agent Aggregate
//!
//! An `Agent` is a registered capability provider. Every agent carries a
//! [`Provenance`]: either it was registered on this registry (`local`) or it
//! was fetched from a configured peer (`federated`).
//!
//! Raw agent ids are only unique inside their source registry, so anything
//! handed to a client is addressed through an [`AgentRef`], a compound
//! value pairing the source with the raw id.
//!
//! | Reference form | Meaning |
//! |----------------|---------|
//! | `<agent-uuid>` | local agent |
//! | `local:<agent-uuid>` | local agent (explicit) |
//! | `fed:<registry-uuid>:<agent-uuid>` | agent owned by a peer registry |

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::domain::registry::RegistryId;
use crate::domain::validation::{require_text, ValidationError};

const MAX_NAME_LEN: usize = 128;
const MAX_DESCRIPTION_LEN: usize = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentId(pub Uuid);

impl AgentId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl Default for AgentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where an agent record originated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Provenance {
    #[default]
    Local,
    Federated { registry_id: RegistryId },
}

impl Provenance {
    pub fn is_local(&self) -> bool {
        matches!(self, Provenance::Local)
    }
}

/// Compound, globally unambiguous agent reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AgentRef {
    Local(AgentId),
    Federated {
        registry_id: RegistryId,
        agent_id: AgentId,
    },
}

impl AgentRef {
    pub fn agent_id(&self) -> AgentId {
        match self {
            AgentRef::Local(id) => *id,
            AgentRef::Federated { agent_id, .. } => *agent_id,
        }
    }

    pub fn provenance(&self) -> Provenance {
        match self {
            AgentRef::Local(_) => Provenance::Local,
            AgentRef::Federated { registry_id, .. } => Provenance::Federated {
                registry_id: *registry_id,
            },
        }
    }
}

impl fmt::Display for AgentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgentRef::Local(id) => write!(f, "{}", id),
            AgentRef::Federated { registry_id, agent_id } => {
                write!(f, "fed:{}:{}", registry_id, agent_id)
            }
        }
    }
}

impl FromStr for AgentRef {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ValidationError::InvalidReference(s.to_string());
        let trimmed = s.trim();

        if let Some(rest) = trimmed.strip_prefix("fed:") {
            let (registry, agent) = rest.split_once(':').ok_or_else(invalid)?;
            let registry_id = RegistryId::from_string(registry).map_err(|_| invalid())?;
            let agent_id = AgentId::from_string(agent).map_err(|_| invalid())?;
            return Ok(AgentRef::Federated { registry_id, agent_id });
        }

        let raw = trimmed.strip_prefix("local:").unwrap_or(trimmed);
        AgentId::from_string(raw)
            .map(AgentRef::Local)
            .map_err(|_| invalid())
    }
}

impl Serialize for AgentRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for AgentRef {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    pub id: AgentId,
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub domains: Vec<String>,
    #[serde(default)]
    pub capabilities: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_team: bool,
    #[serde(default)]
    pub members: Vec<AgentId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_endpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default)]
    pub provenance: Provenance,
}

impl Agent {
    /// Build a local agent from a validated draft.
    pub fn register(draft: AgentDraft, owner_id: impl Into<String>) -> Self {
        Self {
            id: AgentId::new(),
            name: draft.name.trim().to_string(),
            description: draft.description.trim().to_string(),
            domains: draft.domains,
            capabilities: draft.capabilities,
            tags: draft.tags,
            owner_id: Some(owner_id.into()),
            created_at: Utc::now(),
            updated_at: None,
            is_team: draft.is_team,
            members: draft.members,
            api_endpoint: draft.api_endpoint,
            version: draft.version,
            provenance: Provenance::Local,
        }
    }

    pub fn reference(&self) -> AgentRef {
        match self.provenance {
            Provenance::Local => AgentRef::Local(self.id),
            Provenance::Federated { registry_id } => AgentRef::Federated {
                registry_id,
                agent_id: self.id,
            },
        }
    }

    /// Team members addressed in this agent's source namespace. Member ids
    /// of a federated team belong to the peer that owns the team.
    pub fn member_refs(&self) -> Vec<AgentRef> {
        self.members
            .iter()
            .map(|&agent_id| match self.provenance {
                Provenance::Local => AgentRef::Local(agent_id),
                Provenance::Federated { registry_id } => AgentRef::Federated {
                    registry_id,
                    agent_id,
                },
            })
            .collect()
    }

    pub fn with_provenance(mut self, provenance: Provenance) -> Self {
        self.provenance = provenance;
        self
    }

    /// True when every requested tag is present (case-insensitive).
    pub fn has_all_tags(&self, tags: &[String]) -> bool {
        tags.iter()
            .all(|wanted| self.tags.iter().any(|t| t.eq_ignore_ascii_case(wanted)))
    }

    /// Shape checks applied to records received from peers.
    pub fn check_shape(&self) -> Result<(), ValidationError> {
        require_text("name", &self.name, MAX_NAME_LEN)?;
        if self.description.chars().count() > MAX_DESCRIPTION_LEN {
            return Err(ValidationError::TooLong {
                field: "description",
                max: MAX_DESCRIPTION_LEN,
            });
        }
        Ok(())
    }
}

/// Caller-supplied fields for registering a local agent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentDraft {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub domains: Vec<String>,
    #[serde(default)]
    pub capabilities: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub is_team: bool,
    #[serde(default)]
    pub members: Vec<AgentId>,
    #[serde(default)]
    pub api_endpoint: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
}

impl AgentDraft {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("name", &self.name, MAX_NAME_LEN)?;
        require_text("description", &self.description, MAX_DESCRIPTION_LEN)?;

        if !self.is_team && !self.members.is_empty() {
            return Err(ValidationError::InvalidTeam(
                "members are only allowed when is_team is set".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> AgentDraft {
        AgentDraft {
            name: "Text Generation Assistant".to_string(),
            description: "Generates and edits text content".to_string(),
            tags: vec!["text".to_string(), "Summarization".to_string()],
            ..Default::default()
        }
    }

    #[test]
    fn test_local_reference_roundtrip() {
        let agent = Agent::register(draft(), "owner-1");
        let reference = agent.reference();

        assert_eq!(reference, AgentRef::Local(agent.id));
        assert_eq!(reference.to_string(), agent.id.to_string());
        assert_eq!(reference.to_string().parse::<AgentRef>().unwrap(), reference);
    }

    #[test]
    fn test_federated_reference_format() {
        let registry_id = RegistryId::new();
        let agent = Agent::register(draft(), "owner-1")
            .with_provenance(Provenance::Federated { registry_id });

        let rendered = agent.reference().to_string();
        assert_eq!(rendered, format!("fed:{}:{}", registry_id, agent.id));

        let parsed: AgentRef = rendered.parse().unwrap();
        assert_eq!(parsed.agent_id(), agent.id);
        assert_eq!(parsed.provenance(), Provenance::Federated { registry_id });
    }

    #[test]
    fn test_explicit_local_prefix() {
        let id = AgentId::new();
        let parsed: AgentRef = format!("local:{}", id).parse().unwrap();
        assert_eq!(parsed, AgentRef::Local(id));
    }

    #[test]
    fn test_invalid_references_rejected() {
        let id = AgentId::new();
        for raw in [
            "".to_string(),
            "not-a-uuid".to_string(),
            format!("fed:{}", id),
            format!("fed:nope:{}", id),
            format!("remote:{}", id),
        ] {
            assert!(raw.parse::<AgentRef>().is_err(), "accepted {}", raw);
        }
    }

    #[test]
    fn test_provenance_serialization() {
        let registry_id = RegistryId::new();
        let local = serde_json::to_value(Provenance::Local).unwrap();
        assert_eq!(local, serde_json::json!({"type": "local"}));

        let federated = serde_json::to_value(Provenance::Federated { registry_id }).unwrap();
        assert_eq!(federated["type"], "federated");
        assert_eq!(federated["registry_id"], registry_id.to_string());
    }

    #[test]
    fn test_member_refs_follow_team_provenance() {
        let member = AgentId::new();
        let mut team = draft();
        team.is_team = true;
        team.members = vec![member];
        let team = Agent::register(team, "owner-1");
        assert_eq!(team.member_refs(), vec![AgentRef::Local(member)]);

        let registry_id = RegistryId::new();
        let team = team.with_provenance(Provenance::Federated { registry_id });
        let refs = team.member_refs();
        assert_eq!(
            refs,
            vec![AgentRef::Federated {
                registry_id,
                agent_id: member
            }]
        );
        assert_eq!(refs[0].to_string(), format!("fed:{}:{}", registry_id, member));
    }

    #[test]
    fn test_has_all_tags_case_insensitive() {
        let agent = Agent::register(draft(), "owner-1");
        assert!(agent.has_all_tags(&["TEXT".to_string()]));
        assert!(agent.has_all_tags(&["text".to_string(), "summarization".to_string()]));
        assert!(!agent.has_all_tags(&["image".to_string()]));
        assert!(agent.has_all_tags(&[]));
    }

    #[test]
    fn test_draft_validation() {
        assert!(draft().validate().is_ok());

        let mut unnamed = draft();
        unnamed.name = " ".to_string();
        assert!(matches!(
            unnamed.validate(),
            Err(ValidationError::EmptyField { field: "name" })
        ));

        let mut members_without_team = draft();
        members_without_team.members = vec![AgentId::new()];
        assert!(matches!(
            members_without_team.validate(),
            Err(ValidationError::InvalidTeam(_))
        ));
    }

    #[test]
    fn test_agent_deserializes_with_defaults() {
        let id = AgentId::new();
        let agent: Agent = serde_json::from_value(serde_json::json!({
            "id": id.to_string(),
            "name": "Image Generator",
            "description": "Generates images",
            "created_at": "2023-02-20T15:30:00Z"
        }))
        .unwrap();

        assert_eq!(agent.id, id);
        assert!(agent.tags.is_empty());
        assert!(agent.provenance.is_local());
    }
}
