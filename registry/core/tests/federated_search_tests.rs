// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Integration tests for federated search
//!
//! A node backed by in-memory storage is wired to a scripted peer network
//! and searched end to end:
//! 1. Local results always come first, then peers in configuration order
//! 2. Failing, slow or disabled peers are skipped without failing the request
//! 3. Totals and page boundaries are stable across repeated requests

mod common;

use common::{make_agents, names, PeerBehavior, TestNode, PEER_TIMEOUT_MS};
use hibiscus_registry_core::application::FederatedSearchService;
use hibiscus_registry_core::domain::agent::Provenance;
use hibiscus_registry_core::domain::federation::FederationError;
use hibiscus_registry_core::domain::repository::{AgentRepository, FederatedRegistryRepository};
use hibiscus_registry_core::domain::search::SearchQuery;
use std::time::{Duration, Instant};

#[tokio::test]
async fn test_zero_peers_answers_locally() {
    let node = TestNode::with_local(make_agents("L", 3)).await;

    let result = node.search.search(SearchQuery::default()).await.unwrap();

    assert_eq!(result.total, 3);
    assert_eq!(names(&result.items), vec!["L0", "L1", "L2"]);
    assert!(result.items.iter().all(|a| a.provenance.is_local()));
    assert!(node.peers.search_calls().is_empty());
}

#[tokio::test]
async fn test_five_local_three_remote_one_timeout() {
    let node = TestNode::with_local(make_agents("L", 5)).await;
    let fast = node.add_peer("Fast", PeerBehavior::Serve(make_agents("R", 3)), 0).await;
    node.add_peer("Slow", PeerBehavior::Hang, 1).await;

    let started = Instant::now();
    let result = node.search.search(SearchQuery::default()).await.unwrap();

    assert!(started.elapsed() < Duration::from_millis(PEER_TIMEOUT_MS * 10));
    assert_eq!(result.total, 8);
    assert_eq!(
        names(&result.items),
        vec!["L0", "L1", "L2", "L3", "L4", "R0", "R1", "R2"]
    );
    for agent in &result.items[5..] {
        assert_eq!(agent.provenance, Provenance::Federated { registry_id: fast.id });
    }
}

#[tokio::test]
async fn test_peers_merge_in_configuration_order() {
    let node = TestNode::with_local(make_agents("L", 1)).await;
    // Inserted out of order; configuration order follows creation time.
    node.add_peer("Second", PeerBehavior::Serve(make_agents("B", 2)), 20).await;
    node.add_peer("First", PeerBehavior::Serve(make_agents("A", 2)), 10).await;

    let result = node.search.search(SearchQuery::default()).await.unwrap();

    assert_eq!(names(&result.items), vec!["L0", "A0", "A1", "B0", "B1"]);
}

#[tokio::test]
async fn test_failing_peers_are_isolated() {
    let node = TestNode::with_local(make_agents("L", 2)).await;
    node.add_peer(
        "Broken",
        PeerBehavior::Fail(FederationError::PeerMalformedResponse("not json".to_string())),
        0,
    )
    .await;
    node.add_peer("Denied", PeerBehavior::Fail(FederationError::PeerRejected(401)), 1).await;
    node.add_peer("Healthy", PeerBehavior::Serve(make_agents("H", 1)), 2).await;

    let result = node.search.search(SearchQuery::default()).await.unwrap();

    assert_eq!(result.total, 3);
    assert_eq!(names(&result.items), vec!["L0", "L1", "H0"]);
}

#[tokio::test]
async fn test_repeated_searches_are_identical() {
    let node = TestNode::with_local(make_agents("L", 4)).await;
    node.add_peer("A", PeerBehavior::Serve(make_agents("A", 3)), 0).await;
    node.add_peer("B", PeerBehavior::Serve(make_agents("B", 2)), 1).await;

    let query = SearchQuery::default().page(2, 5);
    let first = node.search.search(query.clone()).await.unwrap();
    let second = node.search.search(query).await.unwrap();

    assert_eq!(first, second);
}

#[tokio::test]
async fn test_pages_tile_the_full_result() {
    let node = TestNode::with_local(make_agents("L", 5)).await;
    node.add_peer("A", PeerBehavior::Serve(make_agents("A", 4)), 0).await;
    node.add_peer("B", PeerBehavior::Serve(make_agents("B", 3)), 1).await;

    let full = node
        .search
        .search(SearchQuery::default().page(0, 100))
        .await
        .unwrap();
    assert_eq!(full.total, 12);

    let mut paged = Vec::new();
    for offset in (0..full.total).step_by(5) {
        let page = node
            .search
            .search(SearchQuery::default().page(offset, 5))
            .await
            .unwrap();
        assert_eq!(page.total, 12);
        paged.extend(page.items);
    }

    assert_eq!(names(&paged), names(&full.items));

    let past_end = node
        .search
        .search(SearchQuery::default().page(40, 5))
        .await
        .unwrap();
    assert!(past_end.items.is_empty());
    assert_eq!(past_end.total, 12);
}

#[tokio::test]
async fn test_include_federated_false_never_contacts_peers() {
    let node = TestNode::with_local(make_agents("L", 2)).await;
    node.add_peer("A", PeerBehavior::Serve(make_agents("A", 3)), 0).await;

    let result = node
        .search
        .search(SearchQuery::default().local_only())
        .await
        .unwrap();

    assert_eq!(result.total, 2);
    assert!(node.peers.search_calls().is_empty());
}

#[tokio::test]
async fn test_outbound_queries_are_local_only_with_fixed_window() {
    let node = TestNode::with_local(Vec::new()).await;
    node.add_peer("A", PeerBehavior::Serve(make_agents("A", 1)), 0).await;

    node.search
        .search(
            SearchQuery::default()
                .with_search("  translate ")
                .with_tags(["nlp"])
                .page(40, 10),
        )
        .await
        .unwrap();

    let calls = node.peers.search_calls();
    assert_eq!(calls.len(), 1);
    let (_, query, window) = &calls[0];
    assert_eq!(query.term(), Some("translate"));
    assert_eq!(query.tags, vec!["nlp".to_string()]);
    assert_eq!(*window, 100);
}

#[tokio::test]
async fn test_disabled_peer_is_skipped() {
    let node = TestNode::with_local(make_agents("L", 1)).await;
    let mut peer = node.add_peer("A", PeerBehavior::Serve(make_agents("A", 2)), 0).await;
    peer.enabled = false;
    node.registries.save(&peer).await.unwrap();

    let result = node.search.search(SearchQuery::default()).await.unwrap();

    assert_eq!(result.total, 1);
    assert!(node.peers.search_calls().is_empty());
}

#[tokio::test]
async fn test_local_tag_filter_applies() {
    let mut local = make_agents("L", 3);
    local[1].tags.push("vision".to_string());
    let node = TestNode::with_local(local).await;

    let result = node
        .search
        .search(SearchQuery::default().with_tags(["VISION"]).local_only())
        .await
        .unwrap();

    assert_eq!(names(&result.items), vec!["L1"]);
}

#[tokio::test]
async fn test_invalid_limit_is_rejected() {
    let node = TestNode::with_local(Vec::new()).await;
    assert!(node
        .search
        .search(SearchQuery::default().page(0, 0))
        .await
        .is_err());
}

#[tokio::test]
async fn test_stale_index_hit_shortens_one_page_then_is_evicted() {
    let local = make_agents("L", 5);
    let node = TestNode::with_local(local.clone()).await;
    node.add_peer("Peer", PeerBehavior::Serve(make_agents("R", 3)), 0).await;
    node.agents.delete(local[1].id).await.unwrap();

    let first = node.search.search(SearchQuery::default().page(0, 5)).await.unwrap();
    assert_eq!(names(&first.items), vec!["L0", "L2", "L3", "L4"]);

    let second = node.search.search(SearchQuery::default().page(0, 5)).await.unwrap();
    assert_eq!(second.total, 7);
    assert_eq!(names(&second.items), vec!["L0", "L2", "L3", "L4", "R0"]);

    let next = node.search.search(SearchQuery::default().page(5, 5)).await.unwrap();
    assert_eq!(names(&next.items), vec!["R1", "R2"]);
}
