// SPDX-License-Identifier: GPL-3.0-only

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

use sharemount_types::ShareUrl;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiscoveryError {
    #[error("discovery transport failure: {0}")]
    Transport(String),
}

impl From<zbus::Error> for DiscoveryError {
    fn from(err: zbus::Error) -> Self {
        DiscoveryError::Transport(err.to_string())
    }
}

/// Host-discovery transports the discovery service can run. The transports
/// themselves (packet parsing, sockets) live in the discovery daemon; the
/// orchestrator only decides which ones to register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostLocatorKind {
    Mdns,
    NetBios,
}

/// The external share-discovery service.
///
/// All resolution state (hostname -> address) is cached inside the service;
/// `try_resolve` serves only that cache and never touches the network.
#[async_trait]
pub trait ShareDiscovery: Send + Sync {
    /// Run a full host-discovery pass. Resolves when host discovery is
    /// complete and the resolution cache has been refreshed.
    async fn discover_hosts(&self) -> Result<(), DiscoveryError>;

    /// Enumerate shares on every discovered host. Batches of found shares are
    /// delivered on `shares` as they arrive; the call returns once host
    /// discovery is complete (share batches may continue after that until the
    /// sender is dropped).
    async fn gather_shares(
        &self,
        shares: mpsc::Sender<Vec<ShareUrl>>,
    ) -> Result<(), DiscoveryError>;

    /// Cache-only hostname resolution. Never blocks on the network.
    async fn try_resolve(&self, url: &ShareUrl) -> Option<ShareUrl>;

    async fn register_host_locator(&self, locator: HostLocatorKind) -> Result<(), DiscoveryError>;
}
