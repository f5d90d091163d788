// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Input Validation Errors
//!
//! Synchronous rejections of malformed caller input: peer registration
//! payloads, agent drafts, compound agent references and pagination
//! parameters. A `ValidationError` is always raised *before* anything is
//! persisted.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} cannot be empty")]
    EmptyField { field: &'static str },

    #[error("{field} exceeds {max} characters")]
    TooLong { field: &'static str, max: usize },

    #[error("invalid registry URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("a federated registry with URL '{0}' is already configured")]
    DuplicateUrl(String),

    #[error("invalid agent reference '{0}'")]
    InvalidReference(String),

    #[error("invalid team definition: {0}")]
    InvalidTeam(String),

    #[error("invalid pagination: {0}")]
    InvalidPagination(String),
}

/// Reject blank strings and strings longer than `max` characters.
pub fn require_text(field: &'static str, value: &str, max: usize) -> Result<(), ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField { field });
    }
    if trimmed.chars().count() > max {
        return Err(ValidationError::TooLong { field, max });
    }
    Ok(())
}
