// SPDX-License-Identifier: GPL-3.0-only

//! FUSE daemon client
//!
//! The FUSE daemon exposes each share as a local filesystem and identifies
//! mounts by an opaque string token of its own choosing.

use async_trait::async_trait;
use zbus::Connection;
use zbus_macros::proxy;

use sharemount_contracts::{BackendError, BackendErrorCode, BackendMountOptions, MountBackend};
use sharemount_types::{BackendKind, MountId};

#[proxy(
    default_service = "org.sharemount.Fuse",
    default_path = "/org/sharemount/Fuse",
    interface = "org.sharemount.Fuse1"
)]
trait FuseDaemon {
    /// Returns `(status, mount_token)`; the token is only meaningful when
    /// `status` is 0.
    fn mount(&self, path: &str, options: &str, password: &[u8]) -> zbus::Result<(u32, String)>;

    fn unmount(&self, mount_token: &str, remove_password: bool) -> zbus::Result<u32>;

    fn update_credentials(
        &self,
        mount_token: &str,
        workgroup: &str,
        username: &str,
        password: &[u8],
    ) -> zbus::Result<u32>;

    fn update_share_path(&self, mount_token: &str, share_path: &str) -> zbus::Result<u32>;

    fn setup_kerberos(&self, account_identifier: &str) -> zbus::Result<bool>;
}

pub struct FuseBackend {
    proxy: FuseDaemonProxy<'static>,
}

impl FuseBackend {
    pub async fn new(connection: &Connection) -> zbus::Result<Self> {
        Ok(Self {
            proxy: FuseDaemonProxy::new(connection).await?,
        })
    }

    fn check(status: u32) -> Result<(), BackendError> {
        match BackendErrorCode::from_wire(status) {
            None => Ok(()),
            Some(code) => Err(BackendError::Call(code)),
        }
    }
}

#[async_trait]
impl MountBackend for FuseBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Fuse
    }

    async fn mount(
        &self,
        path: &str,
        options: &BackendMountOptions,
        password: &str,
    ) -> Result<MountId, BackendError> {
        let options_json = serde_json::to_string(options)
            .map_err(|e| BackendError::Transport(format!("options serialization: {e}")))?;
        let (status, token) = self
            .proxy
            .mount(path, &options_json, password.as_bytes())
            .await?;
        Self::check(status)?;
        Ok(MountId::new(token))
    }

    async fn unmount(&self, mount_id: &MountId, remove_password: bool) -> Result<(), BackendError> {
        let status = self
            .proxy
            .unmount(mount_id.as_str(), remove_password)
            .await?;
        Self::check(status)
    }

    async fn update_credentials(
        &self,
        mount_id: &MountId,
        workgroup: &str,
        username: &str,
        password: &str,
    ) -> Result<(), BackendError> {
        let status = self
            .proxy
            .update_credentials(mount_id.as_str(), workgroup, username, password.as_bytes())
            .await?;
        Self::check(status)
    }

    async fn update_share_path(
        &self,
        mount_id: &MountId,
        new_path: &str,
    ) -> Result<(), BackendError> {
        let status = self
            .proxy
            .update_share_path(mount_id.as_str(), new_path)
            .await?;
        Self::check(status)
    }

    async fn setup_kerberos(&self, account_identifier: &str) -> bool {
        match self.proxy.setup_kerberos(account_identifier).await {
            Ok(success) => success,
            Err(e) => {
                tracing::warn!("FUSE Kerberos setup call failed: {e}");
                false
            }
        }
    }
}
