// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Typesense Search Index
//!
//! `SearchIndex` over a Typesense collection, spoken to through its REST API
//! with `reqwest`.
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure
//! - **Purpose:** Relevance-ranked lookup of local agents
//! - **Integration:** Agent catalog → Typesense collection → Federated search
//!
//! Documents carry the agent id as the Typesense document `id`. Searches use
//! `query_by=name,description,domains,tags` and
//! `sort_by=_text_match:desc,created_at:desc`; tag filters are ANDed.
//! Tags are indexed and filtered lowercased, since `tags:=` is an exact
//! match and tag filters are case-insensitive.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;

use crate::domain::agent::{Agent, AgentId};
use crate::domain::search::{IndexPage, SearchIndex, SearchIndexError, SearchQuery};

const API_KEY_HEADER: &str = "X-TYPESENSE-API-KEY";
const QUERY_BY: &str = "name,description,domains,tags";
const SORT_BY: &str = "_text_match:desc,created_at:desc";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

// ============================================================================
// Wire Models
// ============================================================================

#[derive(Debug, Serialize)]
struct AgentDocument<'a> {
    id: String,
    name: &'a str,
    description: &'a str,
    domains: &'a [String],
    tags: Vec<String>,
    is_team: bool,
    created_at: i64,
}

impl<'a> From<&'a Agent> for AgentDocument<'a> {
    fn from(agent: &'a Agent) -> Self {
        Self {
            id: agent.id.to_string(),
            name: &agent.name,
            description: &agent.description,
            domains: &agent.domains,
            tags: agent.tags.iter().map(|t| t.to_lowercase()).collect(),
            is_team: agent.is_team,
            created_at: agent.created_at.timestamp(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    found: usize,
    #[serde(default)]
    hits: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    document: HitDocument,
}

#[derive(Debug, Deserialize)]
struct HitDocument {
    id: String,
}

// ============================================================================
// Client Implementation
// ============================================================================

pub struct TypesenseSearchIndex {
    base_url: String,
    api_key: String,
    collection: String,
    client: Client,
}

impl TypesenseSearchIndex {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        collection: impl Into<String>,
    ) -> Result<Self, SearchIndexError> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            collection: collection.into(),
            client,
        })
    }

    fn documents_url(&self) -> String {
        format!("{}/collections/{}/documents", self.base_url, self.collection)
    }

    /// Create the collection when it does not exist yet.
    pub async fn ensure_collection(&self) -> Result<(), SearchIndexError> {
        let url = format!("{}/collections/{}", self.base_url, self.collection);
        let response = self
            .client
            .get(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await?;

        if response.status().is_success() {
            tracing::info!(collection = %self.collection, "Typesense collection already exists");
            return Ok(());
        }
        if response.status() != StatusCode::NOT_FOUND {
            return Err(Self::rejected(response).await);
        }

        let schema = json!({
            "name": self.collection,
            "fields": [
                {"name": "name", "type": "string", "sort": true},
                {"name": "description", "type": "string"},
                {"name": "domains", "type": "string[]", "optional": true},
                {"name": "tags", "type": "string[]", "optional": true, "facet": true},
                {"name": "is_team", "type": "bool", "facet": true},
                {"name": "created_at", "type": "int64", "sort": true}
            ],
            "default_sorting_field": "created_at",
            "token_separators": ["_", "-"]
        });

        let response = self
            .client
            .post(format!("{}/collections", self.base_url))
            .header(API_KEY_HEADER, &self.api_key)
            .json(&schema)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::rejected(response).await);
        }
        tracing::info!(collection = %self.collection, "Typesense collection created");
        Ok(())
    }

    fn filter_by(query: &SearchQuery) -> Option<String> {
        let mut clauses: Vec<String> = query
            .tags
            .iter()
            .map(|tag| format!("tags:=[`{}`]", tag.replace('`', "").to_lowercase()))
            .collect();
        if let Some(team) = query.is_team {
            clauses.push(format!("is_team:={}", team));
        }
        (!clauses.is_empty()).then(|| clauses.join(" && "))
    }

    async fn rejected(response: reqwest::Response) -> SearchIndexError {
        let status = response.status().as_u16();
        let message = response.text().await.unwrap_or_default();
        SearchIndexError::Rejected { status, message }
    }
}

#[async_trait]
impl SearchIndex for TypesenseSearchIndex {
    async fn search(&self, query: &SearchQuery) -> Result<IndexPage, SearchIndexError> {
        let mut params: Vec<(&str, String)> = vec![
            ("q", query.term().unwrap_or("*").to_string()),
            ("query_by", QUERY_BY.to_string()),
            ("sort_by", SORT_BY.to_string()),
            ("offset", query.offset.to_string()),
            ("limit", query.limit.to_string()),
        ];
        if let Some(filter) = Self::filter_by(query) {
            params.push(("filter_by", filter));
        }

        let response = self
            .client
            .get(format!("{}/search", self.documents_url()))
            .header(API_KEY_HEADER, &self.api_key)
            .query(&params)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::rejected(response).await);
        }

        let body: SearchResponse = response.json().await?;
        let hits = body
            .hits
            .into_iter()
            .map(|hit| {
                AgentId::from_string(&hit.document.id).map_err(|_| {
                    SearchIndexError::Malformed(format!("non-uuid document id '{}'", hit.document.id))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!(found = body.found, returned = hits.len(), "Typesense search");
        Ok(IndexPage {
            hits,
            found: body.found,
        })
    }

    async fn upsert(&self, agent: &Agent) -> Result<(), SearchIndexError> {
        let response = self
            .client
            .post(self.documents_url())
            .header(API_KEY_HEADER, &self.api_key)
            .query(&[("action", "upsert")])
            .json(&AgentDocument::from(agent))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::rejected(response).await);
        }
        Ok(())
    }

    async fn remove(&self, id: AgentId) -> Result<(), SearchIndexError> {
        let response = self
            .client
            .delete(format!("{}/{}", self.documents_url(), id))
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await?;

        // Already absent is fine
        if response.status().is_success() || response.status() == StatusCode::NOT_FOUND {
            return Ok(());
        }
        Err(Self::rejected(response).await)
    }
}
