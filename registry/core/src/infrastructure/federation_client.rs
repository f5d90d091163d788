// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! HTTP Federation Client
//!
//! `FederationClient` implementation that talks to peer registries over
//! their public HTTP API.
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure
//! - **Purpose:** Outbound search, lookup and health probes against peers
//! - **Integration:** Federated search / agent proxy → peer `/agents`, `/health`
//!
//! Outbound searches always send `include_federated=false` so that a peer
//! answers only with its own agents. Peer payloads are validated entry by
//! entry: one malformed record never poisons the rest of the page.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde_json::Value;
use std::time::Duration;

use crate::domain::agent::{Agent, AgentId};
use crate::domain::federation::{FederationClient, FederationError, PeerAgentPage};
use crate::domain::node_config::FederationConfig;
use crate::domain::registry::FederatedRegistry;
use crate::domain::search::SearchQuery;

pub const API_KEY_HEADER: &str = "X-API-Key";

pub struct HttpFederationClient {
    client: Client,
    peer_timeout: Duration,
    probe_timeout: Duration,
}

impl HttpFederationClient {
    pub fn new(peer_timeout: Duration, probe_timeout: Duration) -> Result<Self, FederationError> {
        let client = Client::builder()
            .timeout(peer_timeout)
            .user_agent(concat!("hibiscus-registry/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            peer_timeout,
            probe_timeout,
        })
    }

    pub fn from_config(config: &FederationConfig) -> Result<Self, FederationError> {
        Self::new(
            Duration::from_millis(config.peer_timeout_ms),
            Duration::from_millis(config.probe_timeout_ms),
        )
    }

    fn authorized(builder: RequestBuilder, peer: &FederatedRegistry) -> RequestBuilder {
        match &peer.api_key {
            Some(key) => builder.header(API_KEY_HEADER, key),
            None => builder,
        }
    }

    fn classify(&self, err: reqwest::Error) -> FederationError {
        if err.is_timeout() {
            FederationError::PeerTimeout(self.peer_timeout.as_millis() as u64)
        } else {
            FederationError::from(err)
        }
    }

    fn search_params(query: &SearchQuery, window: usize) -> Vec<(&'static str, String)> {
        let mut params = Vec::with_capacity(7);
        if let Some(term) = query.term() {
            params.push(("search", term.to_string()));
        }
        if !query.tags.is_empty() {
            params.push(("tags", query.tags.join(",")));
        }
        if let Some(team) = query.is_team {
            params.push(("is_team", team.to_string()));
        }
        params.push(("offset", "0".to_string()));
        params.push(("limit", window.to_string()));
        params.push(("include_federated", "false".to_string()));
        params
    }
}

/// Split a peer search payload into valid agents and a dropped count.
///
/// Accepts either a result-set object with an `items` array or a bare array.
pub fn parse_agent_page(body: Value, window: usize) -> Result<PeerAgentPage, FederationError> {
    let entries = match body {
        Value::Array(entries) => entries,
        Value::Object(mut map) => match map.remove("items") {
            Some(Value::Array(entries)) => entries,
            _ => {
                return Err(FederationError::PeerMalformedResponse(
                    "expected an `items` array".to_string(),
                ))
            }
        },
        _ => {
            return Err(FederationError::PeerMalformedResponse(
                "expected a JSON object or array".to_string(),
            ))
        }
    };

    let mut page = PeerAgentPage::default();
    for entry in entries {
        match parse_agent(entry) {
            Ok(agent) if agent.provenance.is_local() => page.agents.push(agent),
            Ok(agent) => {
                tracing::debug!(agent_id = %agent.id, "Dropping peer entry with federated provenance");
                page.dropped += 1;
            }
            Err(reason) => {
                tracing::warn!(%reason, "Dropping malformed peer entry");
                page.dropped += 1;
            }
        }
    }
    page.agents.truncate(window);
    Ok(page)
}

fn parse_agent(entry: Value) -> Result<Agent, String> {
    let agent: Agent = serde_json::from_value(entry).map_err(|e| e.to_string())?;
    agent.check_shape().map_err(|e| e.to_string())?;
    Ok(agent)
}

#[async_trait]
impl FederationClient for HttpFederationClient {
    async fn fetch_agents(
        &self,
        peer: &FederatedRegistry,
        query: &SearchQuery,
        window: usize,
    ) -> Result<PeerAgentPage, FederationError> {
        let request = self
            .client
            .get(peer.endpoint("agents"))
            .query(&Self::search_params(query, window));

        let response = Self::authorized(request, peer)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        if !response.status().is_success() {
            return Err(FederationError::PeerRejected(response.status().as_u16()));
        }

        let body: Value = response.json().await.map_err(|e| self.classify(e))?;
        let page = parse_agent_page(body, window)?;

        tracing::debug!(
            peer = %peer.name,
            returned = page.agents.len(),
            dropped = page.dropped,
            "Peer search answered"
        );
        Ok(page)
    }

    async fn fetch_agent(
        &self,
        peer: &FederatedRegistry,
        agent_id: AgentId,
    ) -> Result<Agent, FederationError> {
        let request = self
            .client
            .get(peer.endpoint(&format!("agents/{}", agent_id)));

        let response = Self::authorized(request, peer)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        match response.status() {
            StatusCode::NOT_FOUND => return Err(FederationError::PeerNotFound),
            status if !status.is_success() => {
                return Err(FederationError::PeerRejected(status.as_u16()))
            }
            _ => {}
        }

        let body: Value = response.json().await.map_err(|e| self.classify(e))?;
        let agent = parse_agent(body).map_err(FederationError::PeerMalformedResponse)?;
        if agent.id != agent_id {
            return Err(FederationError::PeerMalformedResponse(format!(
                "asked for agent {} but received {}",
                agent_id, agent.id
            )));
        }
        Ok(agent)
    }

    async fn probe(&self, peer: &FederatedRegistry) -> bool {
        let request = self
            .client
            .get(peer.endpoint("health"))
            .timeout(self.probe_timeout);

        match Self::authorized(request, peer).send().await {
            Ok(response) if response.status().is_success() => true,
            Ok(response) => {
                tracing::warn!(peer = %peer.name, status = %response.status(), "Peer health check failed");
                false
            }
            Err(e) => {
                tracing::warn!(peer = %peer.name, error = %e, "Peer unreachable");
                false
            }
        }
    }
}
