// SPDX-License-Identifier: GPL-3.0-only

//! Credential dialog client
//!
//! Opening the dialog is fire-and-forget; the user's answer flows back
//! through the service's `update_credentials` entry point.

use async_trait::async_trait;
use zbus::Connection;
use zbus_macros::proxy;

use sharemount_contracts::CredentialsPrompt;
use sharemount_types::{MountId, ShareUrl};

#[proxy(
    default_service = "org.sharemount.CredentialsDialog",
    default_path = "/org/sharemount/CredentialsDialog",
    interface = "org.sharemount.CredentialsDialog1"
)]
trait CredentialsDialog {
    fn show(&self, mount_id: &str, share_path: &str) -> zbus::Result<()>;
}

pub struct DialogClient {
    proxy: CredentialsDialogProxy<'static>,
}

impl DialogClient {
    pub async fn new(connection: &Connection) -> zbus::Result<Self> {
        Ok(Self {
            proxy: CredentialsDialogProxy::new(connection).await?,
        })
    }
}

#[async_trait]
impl CredentialsPrompt for DialogClient {
    async fn show(&self, mount_id: &MountId, share_url: &ShareUrl) {
        if let Err(e) = self.proxy.show(mount_id.as_str(), share_url.as_str()).await {
            tracing::warn!("Failed to open credentials dialog for {share_url}: {e}");
        }
    }
}
