// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod agent_catalog;
pub mod agent_proxy;
pub mod auth;
pub mod federated_search;
pub mod registry_admin;
pub mod repository_factory;

// Re-export use cases for convenience
pub use agent_catalog::{AgentCatalogService, CatalogError, StandardAgentCatalogService};
pub use agent_proxy::{AgentProxyService, NotFoundCause, ProxyError, StandardAgentProxyService};
pub use auth::{AuthError, AuthService, IssuedKey, Principal, StandardAuthService};
pub use federated_search::{FederatedSearchService, SearchError, StandardFederatedSearchService};
pub use registry_admin::{AdminError, NewPeer, PeerPatch, RegistryAdminService, StandardRegistryAdminService};
