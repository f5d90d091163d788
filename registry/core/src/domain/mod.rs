// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Domain layer: aggregates, value objects and the ports the outer layers
//! implement.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Agents, peer registries, search queries, API keys and the
//!   repository, search-index and federation-client contracts

pub mod agent;
pub mod api_key;
pub mod federation;
pub mod node_config;
pub mod registry;
pub mod repository;
pub mod search;
pub mod validation;
