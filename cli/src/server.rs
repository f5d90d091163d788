// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Registry HTTP server bootstrap
//!
//! Wires storage, the search index, the federation client and the
//! application services into the HTTP router, then serves until Ctrl+C or
//! SIGTERM.

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{info, warn};

use hibiscus_registry_core::{
    application::{
        repository_factory::{
            create_agent_repository, create_api_key_repository, create_registry_repository,
            create_search_index,
        },
        StandardAgentCatalogService, StandardAgentProxyService, StandardAuthService,
        StandardFederatedSearchService, StandardRegistryAdminService,
    },
    domain::node_config::RegistryConfig,
    infrastructure::{db::Database, HttpFederationClient},
    presentation::api::{app, AppState},
};

pub async fn start_server(config: RegistryConfig) -> Result<()> {
    config
        .validate()
        .context("Configuration validation failed")?;

    let state = build_state(&config).await?;

    if let Some(metrics) = &config.metrics {
        install_metrics_exporter(metrics.port)?;
    }

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!("Registry listening on {}", addr);

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("Registry shutting down");

    Ok(())
}

/// Build every service the router needs from configuration.
pub async fn build_state(config: &RegistryConfig) -> Result<AppState> {
    let backend = config.storage_backend()?;
    let database = Database::connect(&backend).await?;
    match &database {
        Some(db) => db.migrate().await?,
        None => warn!("No database configured; using in-memory storage. Data is lost on restart"),
    }

    let agent_repo = create_agent_repository(database.as_ref());
    let registry_repo = create_registry_repository(database.as_ref());
    let key_repo = create_api_key_repository(database.as_ref());
    let index = create_search_index(&config.search_index, &agent_repo).await?;

    let federation = Arc::new(
        HttpFederationClient::from_config(&config.federation)
            .context("Failed to create federation HTTP client")?,
    );

    let auth = StandardAuthService::new(key_repo);
    match config.bootstrap_admin_key()? {
        Some(secret) => auth
            .install_bootstrap_key(&secret)
            .await
            .context("Failed to install bootstrap admin key")?,
        None => warn!("No bootstrap admin key configured; admin endpoints need an existing admin key"),
    }

    Ok(AppState {
        search: Arc::new(StandardFederatedSearchService::new(
            agent_repo.clone(),
            registry_repo.clone(),
            index.clone(),
            federation.clone(),
            &config.federation,
        )),
        proxy: Arc::new(StandardAgentProxyService::new(
            agent_repo.clone(),
            registry_repo.clone(),
            federation.clone(),
            &config.federation,
        )),
        admin: Arc::new(StandardRegistryAdminService::new(registry_repo, federation)),
        catalog: Arc::new(StandardAgentCatalogService::new(agent_repo, index)),
        auth: Arc::new(auth),
        node_name: config.node.name.clone(),
        start_time: Instant::now(),
    })
}

fn install_metrics_exporter(port: u16) -> Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .context("Failed to install Prometheus exporter")?;
    info!("Prometheus metrics exposed on {}", addr);
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }
}
