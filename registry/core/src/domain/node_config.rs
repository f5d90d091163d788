// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Registry Configuration
//
// Defines the YAML configuration schema for one Hibiscus registry node:
// - Node identity
// - HTTP listener
// - Storage (PostgreSQL or in-memory)
// - Local search index backend
// - Federation timeouts and per-peer result windows
// - Bootstrap credentials and metrics exposition

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::domain::repository::{PostgresConfig, StorageBackend};
use crate::domain::search::MAX_PAGE_LIMIT;

const ENV_SECRET_PREFIX: &str = "env:";

/// Top-level registry configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistryConfig {
    #[serde(default)]
    pub node: NodeIdentity,

    #[serde(default)]
    pub server: ServerConfig,

    /// PostgreSQL settings. Absent means the in-memory store.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<DatabaseConfig>,

    #[serde(default)]
    pub search_index: SearchIndexConfig,

    #[serde(default)]
    pub federation: FederationConfig,

    #[serde(default)]
    pub auth: AuthConfig,

    /// Prometheus listener. Absent means metrics are recorded but not exposed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<MetricsConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeIdentity {
    /// Human-readable registry name, reported by `/health`
    #[serde(default = "default_node_name")]
    pub name: String,
}

impl Default for NodeIdentity {
    fn default() -> Self {
        Self {
            name: default_node_name(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_address")]
    pub host: String,

    #[serde(default = "default_api_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_bind_address(),
            port: default_api_port(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Connection string; accepts `env:VAR_NAME`
    pub url: String,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

/// Local search index backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum SearchIndexConfig {
    /// Process-local index rebuilt from the agent store at startup
    Memory,
    Typesense {
        url: String,
        /// Accepts `env:VAR_NAME`
        api_key: String,
        #[serde(default = "default_collection")]
        collection: String,
    },
}

impl Default for SearchIndexConfig {
    fn default() -> Self {
        SearchIndexConfig::Memory
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FederationConfig {
    /// Upper bound for one peer search or lookup
    #[serde(default = "default_peer_timeout_ms")]
    pub peer_timeout_ms: u64,

    #[serde(default = "default_probe_timeout_ms")]
    pub probe_timeout_ms: u64,

    /// Fixed result window requested from every peer
    #[serde(default = "default_max_results_per_peer")]
    pub max_results_per_peer: usize,
}

impl Default for FederationConfig {
    fn default() -> Self {
        Self {
            peer_timeout_ms: default_peer_timeout_ms(),
            probe_timeout_ms: default_probe_timeout_ms(),
            max_results_per_peer: default_max_results_per_peer(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Admin key installed at startup; accepts `env:VAR_NAME`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bootstrap_admin_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    #[serde(default = "default_metrics_port")]
    pub port: u16,
}

fn default_node_name() -> String {
    "hibiscus-registry".to_string()
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_api_port() -> u16 {
    8000
}

fn default_max_connections() -> u32 {
    5
}

fn default_collection() -> String {
    "agents".to_string()
}

fn default_peer_timeout_ms() -> u64 {
    3000
}

fn default_probe_timeout_ms() -> u64 {
    5000
}

fn default_max_results_per_peer() -> usize {
    100
}

fn default_metrics_port() -> u16 {
    9090
}

/// Resolve a secret value. `env:NAME` reads the named environment variable,
/// anything else is returned as-is.
pub fn resolve_secret(raw: &str) -> anyhow::Result<String> {
    match raw.strip_prefix(ENV_SECRET_PREFIX) {
        Some(var) => std::env::var(var.trim())
            .map_err(|_| anyhow::anyhow!("environment variable '{}' is not set", var.trim())),
        None => Ok(raw.to_string()),
    }
}

impl RegistryConfig {
    /// Load configuration from YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to YAML file
    pub fn to_yaml_file(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        let config = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Discover configuration file using precedence order
    /// 1. HIBISCUS_CONFIG_PATH environment variable
    /// 2. ./hibiscus-config.yaml (working directory)
    /// 3. ~/.hibiscus/config.yaml (user home)
    pub fn discover_config() -> Option<PathBuf> {
        if let Ok(path) = std::env::var("HIBISCUS_CONFIG_PATH") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        Self::discover_in(Path::new("."), dirs::home_dir().as_deref())
    }

    /// File-system part of discovery, rooted at `cwd` and `home`.
    pub fn discover_in(cwd: &Path, home: Option<&Path>) -> Option<PathBuf> {
        let local = cwd.join("hibiscus-config.yaml");
        if local.exists() {
            return Some(local);
        }

        if let Some(home) = home {
            let user_config = home.join(".hibiscus").join("config.yaml");
            if user_config.exists() {
                return Some(user_config);
            }
        }

        None
    }

    /// Load configuration with discovery, fallback to default
    pub fn load_or_default(cli_path: Option<PathBuf>) -> anyhow::Result<Self> {
        // An explicit path must exist and parse
        if let Some(path) = cli_path {
            tracing::info!("Loading configuration from explicit path: {:?}", path);
            return Self::from_yaml_file(&path)
                .map_err(|e| anyhow::anyhow!("Failed to load config at {:?}: {}", path, e));
        }

        if let Some(config_path) = Self::discover_config() {
            tracing::info!("Loading configuration from discovered path: {:?}", config_path);
            Self::from_yaml_file(config_path)
        } else {
            tracing::warn!("No configuration file found in standard locations. Using defaults.");
            Ok(Self::default())
        }
    }

    /// Database URL with `env:` indirection applied.
    pub fn database_url(&self) -> anyhow::Result<Option<String>> {
        self.database
            .as_ref()
            .map(|db| resolve_secret(&db.url))
            .transpose()
    }

    /// Persistence backend selected by the `database` section.
    pub fn storage_backend(&self) -> anyhow::Result<StorageBackend> {
        match (&self.database, self.database_url()?) {
            (Some(db), Some(url)) => Ok(StorageBackend::PostgreSQL(PostgresConfig {
                connection_string: url,
                max_connections: db.max_connections,
            })),
            _ => Ok(StorageBackend::InMemory),
        }
    }

    pub fn bootstrap_admin_key(&self) -> anyhow::Result<Option<String>> {
        self.auth
            .bootstrap_admin_key
            .as_deref()
            .map(resolve_secret)
            .transpose()
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.node.name.trim().is_empty() {
            anyhow::bail!("node.name cannot be empty");
        }

        if self.server.host.trim().is_empty() {
            anyhow::bail!("server.host cannot be empty");
        }

        if let Some(db) = &self.database {
            if db.url.trim().is_empty() {
                anyhow::bail!("database.url cannot be empty when a database section is present");
            }
            if db.max_connections == 0 {
                anyhow::bail!("database.max_connections must be at least 1");
            }
        }

        if let SearchIndexConfig::Typesense {
            url,
            api_key,
            collection,
        } = &self.search_index
        {
            let parsed = url::Url::parse(url)
                .map_err(|e| anyhow::anyhow!("search_index.url '{}' is invalid: {}", url, e))?;
            if !matches!(parsed.scheme(), "http" | "https") {
                anyhow::bail!("search_index.url must use http or https");
            }
            if api_key.trim().is_empty() {
                anyhow::bail!("search_index.api_key cannot be empty for the typesense backend");
            }
            if collection.trim().is_empty() {
                anyhow::bail!("search_index.collection cannot be empty");
            }
        }

        let federation = &self.federation;
        if federation.peer_timeout_ms == 0 {
            anyhow::bail!("federation.peer_timeout_ms must be greater than zero");
        }
        if federation.probe_timeout_ms == 0 {
            anyhow::bail!("federation.probe_timeout_ms must be greater than zero");
        }
        // peers answer at most one page of MAX_PAGE_LIMIT per search
        if !(1..=MAX_PAGE_LIMIT).contains(&federation.max_results_per_peer) {
            anyhow::bail!(
                "federation.max_results_per_peer must be between 1 and {}",
                MAX_PAGE_LIMIT
            );
        }

        if let Some(key) = &self.auth.bootstrap_admin_key {
            if key.trim().is_empty() {
                anyhow::bail!("auth.bootstrap_admin_key cannot be blank");
            }
        }

        if let Some(metrics) = &self.metrics {
            if metrics.port == self.server.port {
                anyhow::bail!(
                    "metrics.port {} collides with server.port",
                    metrics.port
                );
            }
        }

        Ok(())
    }
}
