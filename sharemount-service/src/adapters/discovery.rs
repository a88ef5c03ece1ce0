// SPDX-License-Identifier: GPL-3.0-only

//! Share-discovery daemon client
//!
//! The daemon owns the discovery transports and the hostname resolution
//! cache; this adapter maps the D-Bus surface onto
//! [`sharemount_contracts::ShareDiscovery`]. Share batches arrive as
//! `SharesFound` signals until one carries `done`.

use async_trait::async_trait;
use futures_util::StreamExt;
use tokio::sync::mpsc;
use zbus::Connection;
use zbus_macros::proxy;

use sharemount_contracts::{DiscoveryError, HostLocatorKind, ShareDiscovery};
use sharemount_types::ShareUrl;

#[proxy(
    default_service = "org.sharemount.Discovery",
    default_path = "/org/sharemount/Discovery",
    interface = "org.sharemount.Discovery1"
)]
trait DiscoveryDaemon {
    /// Returns once host discovery has completed and the resolution cache is
    /// fresh.
    fn discover_hosts(&self) -> zbus::Result<()>;

    /// Returns once host discovery has completed; found shares keep arriving
    /// as `SharesFound` signals until one carries `done = true`.
    fn gather_shares(&self) -> zbus::Result<()>;

    fn try_resolve(&self, url: &str) -> zbus::Result<(bool, String)>;

    fn register_host_locator(&self, kind: &str) -> zbus::Result<()>;

    #[zbus(signal)]
    fn shares_found(&self, shares: Vec<String>, done: bool) -> zbus::Result<()>;
}

pub struct DiscoveryClient {
    proxy: DiscoveryDaemonProxy<'static>,
}

impl DiscoveryClient {
    pub async fn new(connection: &Connection) -> zbus::Result<Self> {
        Ok(Self {
            proxy: DiscoveryDaemonProxy::new(connection).await?,
        })
    }
}

fn locator_name(kind: HostLocatorKind) -> &'static str {
    match kind {
        HostLocatorKind::Mdns => "mdns",
        HostLocatorKind::NetBios => "netbios",
    }
}

#[async_trait]
impl ShareDiscovery for DiscoveryClient {
    async fn discover_hosts(&self) -> Result<(), DiscoveryError> {
        self.proxy.discover_hosts().await?;
        Ok(())
    }

    async fn gather_shares(
        &self,
        shares: mpsc::Sender<Vec<ShareUrl>>,
    ) -> Result<(), DiscoveryError> {
        // Subscribe before triggering so no early batch is missed.
        let mut signals = self.proxy.receive_shares_found().await.map_err(|e| {
            DiscoveryError::Transport(format!("subscribing to share batches: {e}"))
        })?;

        tokio::spawn(async move {
            while let Some(signal) = signals.next().await {
                let Ok(args) = signal.args() else {
                    tracing::warn!("Dropping undecodable share batch");
                    continue;
                };
                let batch: Vec<ShareUrl> = args
                    .shares
                    .iter()
                    .filter_map(|raw| match ShareUrl::parse(raw) {
                        Ok(url) => Some(url),
                        Err(e) => {
                            tracing::warn!("Ignoring discovered share {raw:?}: {e}");
                            None
                        }
                    })
                    .collect();
                if !batch.is_empty() && shares.send(batch).await.is_err() {
                    return;
                }
                if args.done {
                    return;
                }
            }
        });

        self.proxy.gather_shares().await?;
        Ok(())
    }

    async fn try_resolve(&self, url: &ShareUrl) -> Option<ShareUrl> {
        let (ok, resolved) = match self.proxy.try_resolve(url.as_str()).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::warn!("Resolution lookup for {url} failed: {e}");
                return None;
            }
        };
        if !ok {
            return None;
        }
        match ShareUrl::parse(&resolved) {
            Ok(resolved_url) => Some(resolved_url),
            Err(e) => {
                tracing::warn!("Discovery returned unparseable url {resolved:?}: {e}");
                None
            }
        }
    }

    async fn register_host_locator(&self, locator: HostLocatorKind) -> Result<(), DiscoveryError> {
        self.proxy
            .register_host_locator(locator_name(locator))
            .await?;
        Ok(())
    }
}
