// SPDX-License-Identifier: GPL-3.0-only

//! VFS mount-point registry client
//!
//! The registry is the OS-level layer that makes a mount visible to
//! applications and remembers persistent registrations across restarts. All
//! calls are scoped to this service's provider id.

use async_trait::async_trait;
use zbus::Connection;
use zbus_macros::proxy;

use sharemount_contracts::{MountPointRegistry, RegistrationOptions, RegistryError};
use sharemount_types::{ShareIdentity, UnmountReason};

/// Provider id under which every sharemount mount point is registered.
pub const PROVIDER_ID: &str = "smb";

#[proxy(
    default_service = "org.sharemount.Vfs",
    default_path = "/org/sharemount/Vfs",
    interface = "org.sharemount.Vfs1"
)]
trait VfsRegistry {
    fn register_mount_point(&self, provider_id: &str, options: &str) -> zbus::Result<u32>;

    fn unregister_mount_point(
        &self,
        provider_id: &str,
        identity: &str,
        reason: &str,
    ) -> zbus::Result<u32>;

    fn list_registered_mounts(&self, provider_id: &str) -> zbus::Result<Vec<String>>;
}

pub struct VfsRegistryClient {
    proxy: VfsRegistryProxy<'static>,
}

impl VfsRegistryClient {
    pub async fn new(connection: &Connection) -> zbus::Result<Self> {
        Ok(Self {
            proxy: VfsRegistryProxy::new(connection).await?,
        })
    }

    fn check(status: u32) -> Result<(), RegistryError> {
        match status {
            0 => Ok(()),
            2 => Err(RegistryError::AlreadyRegistered),
            other => Err(RegistryError::Rejected(format!("registry status {other}"))),
        }
    }
}

fn reason_name(reason: UnmountReason) -> &'static str {
    match reason {
        UnmountReason::User => "user",
        UnmountReason::Shutdown => "shutdown",
    }
}

#[async_trait]
impl MountPointRegistry for VfsRegistryClient {
    async fn register(&self, options: &RegistrationOptions) -> Result<(), RegistryError> {
        let options_json = serde_json::to_string(options)
            .map_err(|e| RegistryError::Rejected(format!("options serialization: {e}")))?;
        let status = self
            .proxy
            .register_mount_point(PROVIDER_ID, &options_json)
            .await?;
        Self::check(status)
    }

    async fn unregister(
        &self,
        identity: &ShareIdentity,
        reason: UnmountReason,
    ) -> Result<(), RegistryError> {
        let status = self
            .proxy
            .unregister_mount_point(PROVIDER_ID, identity.as_str(), reason_name(reason))
            .await?;
        Self::check(status)
    }

    async fn registered_identities(&self) -> Result<Vec<ShareIdentity>, RegistryError> {
        let raw = self.proxy.list_registered_mounts(PROVIDER_ID).await?;
        Ok(raw.into_iter().map(ShareIdentity::new).collect())
    }
}
