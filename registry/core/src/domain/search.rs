// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Search Query, Result Set and Search Index Port
//!
//! `SearchQuery` carries the free-text term, tag filters and pagination of a
//! single search request. `SearchResultSet` is the request-scoped merged
//! answer; it is never cached or shared across requests.
//!
//! `SearchIndex` is the port onto the managed text-search service holding a
//! denormalized copy of local agents. The index answers with ordered agent
//! ids; hydration from the agent store happens in the application layer.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::agent::{Agent, AgentId};
use crate::domain::validation::ValidationError;

pub const DEFAULT_PAGE_LIMIT: usize = 20;
pub const MAX_PAGE_LIMIT: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub is_team: Option<bool>,
    #[serde(default)]
    pub offset: usize,
    #[serde(default = "default_limit")]
    pub limit: usize,
    #[serde(default = "default_include_federated")]
    pub include_federated: bool,
}

impl Default for SearchQuery {
    fn default() -> Self {
        Self {
            search: None,
            tags: Vec::new(),
            is_team: None,
            offset: 0,
            limit: DEFAULT_PAGE_LIMIT,
            include_federated: true,
        }
    }
}

impl SearchQuery {
    pub fn with_search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn page(mut self, offset: usize, limit: usize) -> Self {
        self.offset = offset;
        self.limit = limit;
        self
    }

    pub fn local_only(mut self) -> Self {
        self.include_federated = false;
        self
    }

    /// Trim the term, drop blank or duplicate tags and enforce the page limit.
    pub fn normalized(mut self) -> Result<Self, ValidationError> {
        if self.limit == 0 {
            return Err(ValidationError::InvalidPagination(
                "limit must be at least 1".to_string(),
            ));
        }
        if self.limit > MAX_PAGE_LIMIT {
            return Err(ValidationError::InvalidPagination(format!(
                "limit must not exceed {}",
                MAX_PAGE_LIMIT
            )));
        }

        self.search = self
            .search
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        let mut tags: Vec<String> = Vec::with_capacity(self.tags.len());
        for tag in self.tags.iter().map(|t| t.trim()).filter(|t| !t.is_empty()) {
            if !tags.iter().any(|seen| seen.eq_ignore_ascii_case(tag)) {
                tags.push(tag.to_string());
            }
        }
        self.tags = tags;

        Ok(self)
    }

    pub fn term(&self) -> Option<&str> {
        self.search.as_deref()
    }
}

/// Merged, paginated answer to one search request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResultSet {
    pub items: Vec<Agent>,
    pub total: usize,
    pub offset: usize,
    pub limit: usize,
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl SearchResultSet {
    pub fn empty(query: &SearchQuery) -> Self {
        Self {
            items: Vec::new(),
            total: 0,
            offset: query.offset,
            limit: query.limit,
            search: query.search.clone(),
            tags: query.tags.clone(),
        }
    }
}

/// One page of local index hits, best match first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexPage {
    pub hits: Vec<AgentId>,
    /// Total number of local matches, independent of the page window.
    pub found: usize,
}

#[derive(Debug, Clone, Error)]
pub enum SearchIndexError {
    #[error("search index unavailable: {0}")]
    Unavailable(String),

    #[error("search index rejected the request (HTTP {status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("malformed search index response: {0}")]
    Malformed(String),
}

impl From<reqwest::Error> for SearchIndexError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            SearchIndexError::Malformed(err.to_string())
        } else {
            SearchIndexError::Unavailable(err.to_string())
        }
    }
}

#[async_trait]
pub trait SearchIndex: Send + Sync {
    /// Local matches for `query` within `[query.offset, query.offset + query.limit)`.
    async fn search(&self, query: &SearchQuery) -> Result<IndexPage, SearchIndexError>;

    /// Insert or replace the denormalized copy of a local agent.
    async fn upsert(&self, agent: &Agent) -> Result<(), SearchIndexError>;

    async fn remove(&self, id: AgentId) -> Result<(), SearchIndexError>;
}

fn default_limit() -> usize {
    DEFAULT_PAGE_LIMIT
}

fn default_include_federated() -> bool {
    true
}
