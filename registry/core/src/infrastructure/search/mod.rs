// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Search Index Adapters
//!
//! Implementations of the `SearchIndex` port.
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure
//! - **Purpose:** Full-text lookup over locally registered agents
//!
//! | Adapter | Backend |
//! |---------|---------|
//! | `InMemorySearchIndex` | process-local, rebuilt from the agent store at startup |
//! | `TypesenseSearchIndex` | Typesense collection over its REST API |

pub mod memory;
pub mod typesense;

pub use memory::InMemorySearchIndex;
pub use typesense::TypesenseSearchIndex;
