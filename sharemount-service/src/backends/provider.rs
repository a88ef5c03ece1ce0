// SPDX-License-Identifier: GPL-3.0-only

//! Provider daemon client
//!
//! The provider daemon exposes one D-Bus method per filesystem operation and
//! identifies mounts by a signed integer it assigns. Status values come back
//! as wire codes decoded by [`BackendErrorCode::from_wire`].

use async_trait::async_trait;
use zbus::Connection;
use zbus_macros::proxy;

use sharemount_contracts::{BackendError, BackendErrorCode, BackendMountOptions, MountBackend};
use sharemount_types::{BackendKind, MountId};

#[proxy(
    default_service = "org.sharemount.Provider",
    default_path = "/org/sharemount/Provider",
    interface = "org.sharemount.Provider1"
)]
trait ProviderDaemon {
    /// Returns `(status, mount_id)`; `mount_id` is only meaningful when
    /// `status` is 0.
    fn mount(&self, path: &str, options: &str, password: &[u8]) -> zbus::Result<(u32, i32)>;

    fn unmount(&self, mount_id: i32, remove_password: bool) -> zbus::Result<u32>;

    fn update_mount_credentials(
        &self,
        mount_id: i32,
        workgroup: &str,
        username: &str,
        password: &[u8],
    ) -> zbus::Result<u32>;

    fn update_share_path(&self, mount_id: i32, share_path: &str) -> zbus::Result<u32>;

    fn setup_kerberos(&self, account_identifier: &str) -> zbus::Result<bool>;
}

pub struct ProviderBackend {
    proxy: ProviderDaemonProxy<'static>,
}

impl ProviderBackend {
    pub async fn new(connection: &Connection) -> zbus::Result<Self> {
        Ok(Self {
            proxy: ProviderDaemonProxy::new(connection).await?,
        })
    }

    fn numeric_id(mount_id: &MountId) -> Result<i32, BackendError> {
        mount_id.as_str().parse().map_err(|_| {
            BackendError::Transport(format!("non-numeric provider mount id: {mount_id}"))
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
impl MountBackend for ProviderBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Provider
    }

    async fn mount(
        &self,
        path: &str,
        options: &BackendMountOptions,
        password: &str,
    ) -> Result<MountId, BackendError> {
        let options_json = serde_json::to_string(options)
            .map_err(|e| BackendError::Transport(format!("options serialization: {e}")))?;
        let (status, mount_id) = self
            .proxy
            .mount(path, &options_json, password.as_bytes())
            .await?;
        Self::check(status)?;
        Ok(MountId::new(mount_id.to_string()))
    }

    async fn unmount(&self, mount_id: &MountId, remove_password: bool) -> Result<(), BackendError> {
        let status = self
            .proxy
            .unmount(Self::numeric_id(mount_id)?, remove_password)
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
            .update_mount_credentials(
                Self::numeric_id(mount_id)?,
                workgroup,
                username,
                password.as_bytes(),
            )
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
            .update_share_path(Self::numeric_id(mount_id)?, new_path)
            .await?;
        Self::check(status)
    }

    async fn setup_kerberos(&self, account_identifier: &str) -> bool {
        match self.proxy.setup_kerberos(account_identifier).await {
            Ok(success) => success,
            Err(e) => {
                tracing::warn!("Provider Kerberos setup call failed: {e}");
                false
            }
        }
    }
}
