// SPDX-License-Identifier: GPL-3.0-only

//! Sharemount Service - D-Bus service orchestrating network share mounts
//!
//! Discovers SMB shares on the local network, resolves credentials (password
//! or Kerberos SSO), drives the external mount backend daemon, and restores
//! previously-mounted shares across restarts.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing_subscriber::{EnvFilter, fmt};
use zbus::connection::Builder as ConnectionBuilder;

mod adapters;
mod backends;
mod config;
mod credentials;
mod discovery;
mod error;
mod handlers;
mod identity;
mod orchestrator;
mod policy;
mod routing;
mod service;

use config::{DEFAULT_CONFIG_PATH, ServiceConfig};
use handlers::MountsHandler;
use orchestrator::MountOrchestrator;
use routing::CollaboratorRegistry;
use service::SharemountService;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging to journald/stderr
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("sharemount_service=info,warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("Starting Sharemount Service v{}", env!("CARGO_PKG_VERSION"));

    let config_path = std::env::var("SHAREMOUNT_CONFIG")
        .unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let config = ServiceConfig::load(Path::new(&config_path))?;

    // Build D-Bus connection and the fixed collaborator routing; fail fast
    // when a required daemon is unreachable.
    let connection = ConnectionBuilder::session()?
        .name("org.sharemount.Service")?
        .serve_at("/org/sharemount/Service", SharemountService::new())?
        .build()
        .await
        .context("connecting to session bus")?;

    let collaborators = CollaboratorRegistry::build(&config, &connection).await?;
    tracing::info!("Mount backend: {}", collaborators.backend_kind());

    let orchestrator = Arc::new(MountOrchestrator::new(
        collaborators.backend(),
        collaborators.discovery(),
        collaborators.registry(),
        collaborators.prompt(),
        collaborators.policy(),
    ));

    connection
        .object_server()
        .at(
            "/org/sharemount/Mounts",
            MountsHandler::new(orchestrator.clone()),
        )
        .await?;

    tracing::info!("Service registered on D-Bus session bus");
    tracing::info!("  - org.sharemount.Service at /org/sharemount/Service");
    tracing::info!("  - Mounts interface at /org/sharemount/Mounts");

    // Refresh the resolution cache whenever the network changes.
    match zbus::Connection::system().await {
        Ok(system) => match adapters::network::network_change_events(&system).await {
            Ok(events) => {
                orchestrator.watch_network_changes(events);
                tracing::info!("Network change monitoring enabled");
            }
            Err(e) => tracing::warn!("Network change monitoring unavailable: {e}"),
        },
        Err(e) => tracing::warn!("System bus unavailable, network monitoring disabled: {e}"),
    }

    // Kerberos setup, locator registration, and restore of persisted mounts.
    orchestrator.start().await;

    tracing::info!("Service ready, waiting for requests...");
    tokio::signal::ctrl_c().await?;
    tracing::info!("Received shutdown signal");

    orchestrator.shutdown();
    tracing::info!("Sharemount Service shutting down");
    Ok(())
}
