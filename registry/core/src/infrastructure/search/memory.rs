// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! In-memory search index.
//!
//! Relevance is a weighted count of fields containing the search term
//! (case-insensitive): name 3, domains and tags 2, description and
//! capabilities 1. Ties break on `created_at` descending, then id, matching
//! the `_text_match:desc,created_at:desc` ordering of the Typesense adapter.
//! Without a term every agent matches and the order is newest first.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::cmp::Reverse;
use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::agent::{Agent, AgentId};
use crate::domain::search::{IndexPage, SearchIndex, SearchIndexError, SearchQuery};

#[derive(Clone, Default)]
pub struct InMemorySearchIndex {
    documents: Arc<RwLock<HashMap<AgentId, Agent>>>,
}

impl InMemorySearchIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an index over an existing set of local agents.
    pub fn from_agents(agents: impl IntoIterator<Item = Agent>) -> Self {
        let documents = agents.into_iter().map(|a| (a.id, a)).collect();
        Self {
            documents: Arc::new(RwLock::new(documents)),
        }
    }

    pub fn len(&self) -> usize {
        self.documents.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.read().is_empty()
    }

    fn score(agent: &Agent, term: &str) -> u32 {
        let contains = |text: &str| text.to_lowercase().contains(term);
        let any = |values: &[String]| values.iter().any(|v| contains(v));

        let mut score = 0;
        if contains(&agent.name) {
            score += 3;
        }
        if any(&agent.domains) {
            score += 2;
        }
        if any(&agent.tags) {
            score += 2;
        }
        if contains(&agent.description) {
            score += 1;
        }
        if any(&agent.capabilities) {
            score += 1;
        }
        score
    }
}

#[async_trait]
impl SearchIndex for InMemorySearchIndex {
    async fn search(&self, query: &SearchQuery) -> Result<IndexPage, SearchIndexError> {
        let term = query.term().map(str::to_lowercase);
        let documents = self.documents.read();

        let mut matches: Vec<(u32, &Agent)> = documents
            .values()
            .filter(|a| query.is_team.map_or(true, |team| a.is_team == team))
            .filter(|a| a.has_all_tags(&query.tags))
            .filter_map(|a| match &term {
                Some(term) => {
                    let score = Self::score(a, term);
                    (score > 0).then_some((score, a))
                }
                None => Some((0, a)),
            })
            .collect();

        matches.sort_by_key(|(score, a)| (Reverse(*score), Reverse(a.created_at), a.id));

        let found = matches.len();
        let hits = matches
            .into_iter()
            .skip(query.offset)
            .take(query.limit)
            .map(|(_, a)| a.id)
            .collect();

        Ok(IndexPage { hits, found })
    }

    async fn upsert(&self, agent: &Agent) -> Result<(), SearchIndexError> {
        self.documents.write().insert(agent.id, agent.clone());
        Ok(())
    }

    async fn remove(&self, id: AgentId) -> Result<(), SearchIndexError> {
        self.documents.write().remove(&id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::agent::AgentDraft;
    use chrono::{Duration, Utc};

    fn agent(name: &str, description: &str, tags: &[&str], age_minutes: i64) -> Agent {
        let mut agent = Agent::register(
            AgentDraft {
                name: name.to_string(),
                description: description.to_string(),
                tags: tags.iter().map(|t| t.to_string()).collect(),
                ..Default::default()
            },
            "owner-1",
        );
        agent.created_at = Utc::now() - Duration::minutes(age_minutes);
        agent
    }

    #[tokio::test]
    async fn test_name_match_outranks_description_match() {
        let by_description = agent("Helper", "a translator for documents", &[], 1);
        let by_name = agent("Translator", "converts text", &[], 10);
        let index = InMemorySearchIndex::from_agents([by_description.clone(), by_name.clone()]);

        let page = index
            .search(&SearchQuery::default().with_search("translator"))
            .await
            .unwrap();

        assert_eq!(page.found, 2);
        assert_eq!(page.hits, vec![by_name.id, by_description.id]);
    }

    #[tokio::test]
    async fn test_no_term_lists_newest_first() {
        let old = agent("Old", "old agent", &[], 30);
        let new = agent("New", "new agent", &[], 1);
        let index = InMemorySearchIndex::from_agents([old.clone(), new.clone()]);

        let page = index.search(&SearchQuery::default()).await.unwrap();
        assert_eq!(page.hits, vec![new.id, old.id]);
    }

    #[tokio::test]
    async fn test_tag_filter_and_window() {
        let agents: Vec<Agent> = (0..5)
            .map(|i| agent(&format!("Agent {}", i), "summarizer", &["nlp"], i))
            .chain([agent("Painter", "draws", &["image"], 0)])
            .collect();
        let index = InMemorySearchIndex::from_agents(agents.clone());

        let query = SearchQuery::default().with_tags(["NLP"]).page(1, 2);
        let page = index.search(&query).await.unwrap();

        assert_eq!(page.found, 5);
        assert_eq!(page.hits, vec![agents[1].id, agents[2].id]);
    }

    #[tokio::test]
    async fn test_upsert_and_remove() {
        let index = InMemorySearchIndex::new();
        let a = agent("Scout", "finds things", &[], 0);

        index.upsert(&a).await.unwrap();
        assert_eq!(index.len(), 1);

        index.remove(a.id).await.unwrap();
        assert!(index.is_empty());
    }
}
