// SPDX-License-Identifier: GPL-3.0-only

use zbus::proxy;

use sharemount_types::MountedShare;

use crate::client::connection::shared_connection;
use crate::client::ClientError;

/// D-Bus proxy interface for the sharemount mounts surface
#[proxy(
    interface = "org.sharemount.Mounts1",
    default_service = "org.sharemount.Service",
    default_path = "/org/sharemount/Mounts"
)]
pub trait MountsInterface {
    /// Mount a share; returns the persisted share identity
    async fn mount(
        &self,
        share_path: &str,
        display_name: &str,
        username: &str,
        password: &str,
        use_kerberos: bool,
        save_credentials: bool,
    ) -> zbus::Result<String>;

    /// Unmount by persisted identity; reason is "user" or "shutdown"
    async fn unmount(&self, identity: &str, reason: &str) -> zbus::Result<()>;

    /// Currently mounted shares as a JSON document
    async fn list_mounts(&self) -> zbus::Result<String>;

    /// Start gathering shares; results arrive as SharesFound signals
    async fn gather_shares(&self) -> zbus::Result<()>;

    /// Open the credentials dialog for a mount
    async fn request_credentials(&self, mount_id: &str) -> zbus::Result<()>;

    /// Push updated credentials down to the backend
    async fn update_credentials(
        &self,
        mount_id: &str,
        username: &str,
        password: &str,
    ) -> zbus::Result<()>;

    /// Re-resolve a share's host; returns whether to retry the pending read
    async fn request_updated_share_path(
        &self,
        mount_id: &str,
        share_path: &str,
    ) -> zbus::Result<bool>;

    /// Re-prime backend Kerberos state after ticket renewal
    async fn update_kerberos_credentials(&self, account_identifier: &str) -> zbus::Result<()>;

    /// Signal emitted with each batch of discovered shares
    #[zbus(signal)]
    async fn shares_found(&self, shares: Vec<String>, done: bool) -> zbus::Result<()>;

    /// Signal emitted when a requested credential update has settled
    #[zbus(signal)]
    async fn credentials_updated(&self, mount_id: &str, success: bool) -> zbus::Result<()>;
}

/// Client for mount operations, for UI and tooling
pub struct MountsClient {
    proxy: MountsInterfaceProxy<'static>,
}

impl MountsClient {
    /// Create a new mounts client connected to the sharemount service
    pub async fn new() -> Result<Self, ClientError> {
        let conn = shared_connection().await?;

        let proxy = MountsInterfaceProxy::new(conn)
            .await
            .map_err(|e| ClientError::Connection(format!("Failed to create mounts proxy: {e}")))?;

        Ok(Self { proxy })
    }

    pub async fn mount(
        &self,
        share_path: &str,
        display_name: &str,
        username: &str,
        password: &str,
        use_kerberos: bool,
        save_credentials: bool,
    ) -> Result<String, ClientError> {
        Ok(self
            .proxy
            .mount(
                share_path,
                display_name,
                username,
                password,
                use_kerberos,
                save_credentials,
            )
            .await?)
    }

    pub async fn unmount(&self, identity: &str, reason: &str) -> Result<(), ClientError> {
        Ok(self.proxy.unmount(identity, reason).await?)
    }

    /// Currently mounted shares, decoded from the service's JSON reply
    pub async fn list_mounts(&self) -> Result<Vec<MountedShare>, ClientError> {
        let raw = self.proxy.list_mounts().await?;
        serde_json::from_str(&raw)
            .map_err(|e| ClientError::Protocol(format!("Failed to decode mount list: {e}")))
    }

    pub async fn request_updated_share_path(
        &self,
        mount_id: &str,
        share_path: &str,
    ) -> Result<bool, ClientError> {
        Ok(self
            .proxy
            .request_updated_share_path(mount_id, share_path)
            .await?)
    }

    /// Access the underlying proxy, e.g. to subscribe to signals
    pub fn proxy(&self) -> &MountsInterfaceProxy<'static> {
        &self.proxy
    }
}
