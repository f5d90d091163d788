// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Federated Search Use Case
//!
//! Answers one search request from the local index plus every enabled peer.
//!
//! # DDD Pattern: Application Service
//!
//! - **Layer:** Application
//! - **Responsibility:** Fan out, absorb peer failures, merge, paginate
//! - **Collaborators:**
//!   - Domain: SearchQuery, SearchResultSet, Provenance
//!   - Ports: SearchIndex, AgentRepository, FederatedRegistryRepository, FederationClient
//!
//! # Flow
//!
//! 1. Normalize the query
//! 2. Snapshot enabled peers in configuration order
//! 3. Concurrently query the local index and every peer (each peer bounded by
//!    its own timeout)
//! 4. Hydrate local hits from the agent store, in index order, evicting hits
//!    the store no longer holds
//! 5. Tag provenance and merge: local results first, then each peer's results
//!    in configuration order
//! 6. Slice `[offset, offset + limit)` out of the merged sequence
//!
//! Every peer contributes a fixed window (its first `max_results_per_peer`
//! results) regardless of the requested page, so the merged sequence is the
//! same for every page of a query while peers answer the same way.
//!
//! # Error Handling
//!
//! Only a local index or store failure fails the request. A peer that is
//! unreachable, slow, or answers garbage contributes nothing and is logged.

use async_trait::async_trait;
use futures::future::join_all;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::domain::agent::{Agent, AgentId, Provenance};
use crate::domain::federation::{FederationClient, FederationError};
use crate::domain::node_config::FederationConfig;
use crate::domain::registry::{FederatedRegistry, RegistryId};
use crate::domain::repository::{AgentRepository, FederatedRegistryRepository, RepositoryError};
use crate::domain::search::{SearchIndex, SearchIndexError, SearchQuery, SearchResultSet};
use crate::domain::validation::ValidationError;

#[derive(Debug, Error)]
pub enum SearchError {
    #[error(transparent)]
    InvalidQuery(#[from] ValidationError),

    #[error("local search index failed: {0}")]
    LocalIndex(#[from] SearchIndexError),

    #[error("agent store failed: {0}")]
    Repository(#[from] RepositoryError),
}

/// Agents one peer contributed to a search, already tagged with provenance.
#[derive(Debug, Clone)]
pub struct PeerContribution {
    pub registry_id: RegistryId,
    pub agents: Vec<Agent>,
}

#[async_trait]
pub trait FederatedSearchService: Send + Sync {
    /// Merged, paginated search across this registry and its peers.
    async fn search(&self, query: SearchQuery) -> Result<SearchResultSet, SearchError>;
}

pub struct StandardFederatedSearchService {
    agents: Arc<dyn AgentRepository>,
    registries: Arc<dyn FederatedRegistryRepository>,
    index: Arc<dyn SearchIndex>,
    federation: Arc<dyn FederationClient>,
    peer_timeout: Duration,
    max_results_per_peer: usize,
}

impl StandardFederatedSearchService {
    pub fn new(
        agents: Arc<dyn AgentRepository>,
        registries: Arc<dyn FederatedRegistryRepository>,
        index: Arc<dyn SearchIndex>,
        federation: Arc<dyn FederationClient>,
        config: &FederationConfig,
    ) -> Self {
        Self {
            agents,
            registries,
            index,
            federation,
            peer_timeout: Duration::from_millis(config.peer_timeout_ms),
            max_results_per_peer: config.max_results_per_peer,
        }
    }

    /// Enabled peers in configuration order. A failing registry store only
    /// costs the federated part of the answer.
    async fn peer_snapshot(&self) -> Vec<FederatedRegistry> {
        match self.registries.list_all().await {
            Ok(mut peers) => {
                peers.retain(|p| p.enabled);
                peers.sort_by(FederatedRegistry::configuration_order);
                peers
            }
            Err(e) => {
                warn!(error = %e, "Could not load federated registries; answering locally");
                Vec::new()
            }
        }
    }

    async fn query_peer(&self, peer: &FederatedRegistry, query: &SearchQuery) -> Option<PeerContribution> {
        let started = Instant::now();
        let result = match tokio::time::timeout(
            self.peer_timeout,
            self.federation
                .fetch_agents(peer, query, self.max_results_per_peer),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(FederationError::PeerTimeout(self.peer_timeout.as_millis() as u64)),
        };
        metrics::histogram!("hibiscus_federation_peer_latency_seconds")
            .record(started.elapsed().as_secs_f64());

        match result {
            Ok(page) => {
                metrics::counter!("hibiscus_federation_peer_requests_total", "outcome" => "success")
                    .increment(1);
                if page.dropped > 0 {
                    warn!(peer = %peer.name, dropped = page.dropped, "Peer returned malformed entries");
                }
                let provenance = Provenance::Federated { registry_id: peer.id };
                let agents = page
                    .agents
                    .into_iter()
                    .take(self.max_results_per_peer)
                    .map(|a| a.with_provenance(provenance))
                    .collect();
                Some(PeerContribution {
                    registry_id: peer.id,
                    agents,
                })
            }
            Err(e) => {
                metrics::counter!("hibiscus_federation_peer_requests_total", "outcome" => e.kind())
                    .increment(1);
                warn!(peer = %peer.name, url = %peer.url, error = %e, "Federated search skipped peer");
                None
            }
        }
    }

    async fn fan_out(&self, peers: &[FederatedRegistry], query: &SearchQuery) -> Vec<PeerContribution> {
        // join_all yields results in input order, which is configuration order
        join_all(peers.iter().map(|peer| self.query_peer(peer, query)))
            .await
            .into_iter()
            .flatten()
            .collect()
    }

    /// Load index hits from the store, keeping index order.
    ///
    /// Hits with no stored agent are evicted from the index so later
    /// requests see a consistent local sequence. Returns the agents and the
    /// number of stale hits.
    async fn hydrate(&self, hits: &[AgentId]) -> Result<(Vec<Agent>, usize), RepositoryError> {
        let mut found = self.agents.find_by_ids(hits).await?;
        let mut ordered = Vec::with_capacity(hits.len());
        let mut stale = 0;
        for id in hits {
            match found.iter().position(|a| a.id == *id) {
                Some(pos) => ordered.push(found.swap_remove(pos).with_provenance(Provenance::Local)),
                None => {
                    stale += 1;
                    warn!(agent_id = %id, "Search index hit missing from agent store; evicting");
                    if let Err(e) = self.index.remove(*id).await {
                        warn!(agent_id = %id, error = %e, "Could not evict stale index entry");
                    }
                }
            }
        }
        Ok((ordered, stale))
    }
}

/// Slice one page out of the merged sequence
/// `local[0..local_total) ++ peer_1 ++ peer_2 ...`.
///
/// `local_page` holds the local agents already windowed to
/// `[offset, offset + limit)`. Returns the page and the merged total.
///
/// Federated positions are derived from `local_total`, so a local window
/// that came back short leaves the page short rather than pulling
/// federated results forward, which would repeat them on the next page.
pub fn merge_page(
    local_page: Vec<Agent>,
    local_total: usize,
    peers: Vec<PeerContribution>,
    offset: usize,
    limit: usize,
) -> (Vec<Agent>, usize) {
    let federated: Vec<Agent> = peers.into_iter().flat_map(|p| p.agents).collect();
    let total = local_total + federated.len();

    let end = offset.saturating_add(limit);
    let fed_start = offset.saturating_sub(local_total);
    let fed_end = end.saturating_sub(local_total);

    let mut items = local_page;
    items.truncate(limit);
    items.extend(
        federated
            .into_iter()
            .skip(fed_start)
            .take(fed_end - fed_start),
    );
    (items, total)
}

#[async_trait]
impl FederatedSearchService for StandardFederatedSearchService {
    async fn search(&self, query: SearchQuery) -> Result<SearchResultSet, SearchError> {
        let query = query.normalized()?;
        metrics::counter!("hibiscus_search_requests_total").increment(1);

        let peers = if query.include_federated {
            self.peer_snapshot().await
        } else {
            Vec::new()
        };
        debug!(
            term = ?query.term(),
            tags = ?query.tags,
            offset = query.offset,
            limit = query.limit,
            peers = peers.len(),
            "Federated search"
        );

        let (local, contributions) =
            tokio::join!(self.index.search(&query), self.fan_out(&peers, &query));

        let local = local.map_err(|e| {
            error!(error = %e, "Local search index failed");
            e
        })?;
        let (local_agents, stale) = self.hydrate(&local.hits).await?;
        if stale > 0 {
            metrics::counter!("hibiscus_search_stale_hits_total").increment(stale as u64);
        }

        let answered = contributions.len();
        let (items, total) = merge_page(
            local_agents,
            local.found,
            contributions,
            query.offset,
            query.limit,
        );

        if answered < peers.len() {
            info!(
                answered,
                configured = peers.len(),
                "Federated search completed with partial peer coverage"
            );
        }

        Ok(SearchResultSet {
            items,
            total,
            offset: query.offset,
            limit: query.limit,
            search: query.search,
            tags: query.tags,
        })
    }
}
