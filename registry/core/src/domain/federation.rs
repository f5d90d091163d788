// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Federation Client Port
//!
//! Outbound contract for talking to a peer registry's public API. The
//! concrete HTTP implementation lives in
//! `crate::infrastructure::federation_client`.
//!
//! Every operation is fallible but *isolated*: a `FederationError` describes
//! why one peer could not answer one call. Callers decide how much of that
//! failure to surface; the search aggregator absorbs it entirely.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::agent::{Agent, AgentId};
use crate::domain::registry::FederatedRegistry;
use crate::domain::search::SearchQuery;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FederationError {
    #[error("peer unreachable: {0}")]
    PeerUnreachable(String),

    #[error("peer did not answer within {0} ms")]
    PeerTimeout(u64),

    #[error("peer returned a malformed response: {0}")]
    PeerMalformedResponse(String),

    #[error("peer has no such agent")]
    PeerNotFound,

    #[error("peer rejected the request with HTTP {0}")]
    PeerRejected(u16),
}

impl FederationError {
    /// Short label used for metrics and log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            FederationError::PeerUnreachable(_) => "unreachable",
            FederationError::PeerTimeout(_) => "timeout",
            FederationError::PeerMalformedResponse(_) => "malformed",
            FederationError::PeerNotFound => "not_found",
            FederationError::PeerRejected(_) => "rejected",
        }
    }
}

impl From<reqwest::Error> for FederationError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            FederationError::PeerMalformedResponse(err.to_string())
        } else {
            FederationError::PeerUnreachable(err.to_string())
        }
    }
}

/// Agents returned by one peer for one search.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PeerAgentPage {
    /// Valid agents in the order the peer returned them.
    pub agents: Vec<Agent>,
    /// Entries discarded because they did not match the agent shape.
    pub dropped: usize,
}

#[async_trait]
pub trait FederationClient: Send + Sync {
    /// Query the peer's `/agents` endpoint for at most `window` results.
    async fn fetch_agents(
        &self,
        peer: &FederatedRegistry,
        query: &SearchQuery,
        window: usize,
    ) -> Result<PeerAgentPage, FederationError>;

    /// Fetch one agent by the id it has on the peer.
    async fn fetch_agent(
        &self,
        peer: &FederatedRegistry,
        agent_id: AgentId,
    ) -> Result<Agent, FederationError>;

    /// Reachability check; never fails, only answers.
    async fn probe(&self, peer: &FederatedRegistry) -> bool;
}
