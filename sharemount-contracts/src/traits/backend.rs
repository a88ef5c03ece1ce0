// SPDX-License-Identifier: GPL-3.0-only

use async_trait::async_trait;

use sharemount_types::{BackendKind, MountId};

use crate::protocol::{BackendError, BackendMountOptions};

/// The external mount backend daemon.
///
/// Two interchangeable implementations exist (provider daemon, FUSE daemon);
/// one is selected at service construction and carried as `Arc<dyn
/// MountBackend>`. The backend owns mount ids; the orchestrator only stores
/// what [`MountBackend::mount`] returned.
#[async_trait]
pub trait MountBackend: Send + Sync {
    fn kind(&self) -> BackendKind;

    /// Mount `path` (already host-resolved where applicable) and return the
    /// backend-assigned mount id.
    async fn mount(
        &self,
        path: &str,
        options: &BackendMountOptions,
        password: &str,
    ) -> Result<MountId, BackendError>;

    /// `remove_password` also deletes any password the daemon saved for this
    /// mount.
    async fn unmount(&self, mount_id: &MountId, remove_password: bool) -> Result<(), BackendError>;

    async fn update_credentials(
        &self,
        mount_id: &MountId,
        workgroup: &str,
        username: &str,
        password: &str,
    ) -> Result<(), BackendError>;

    async fn update_share_path(
        &self,
        mount_id: &MountId,
        new_path: &str,
    ) -> Result<(), BackendError>;

    /// Prime the daemon's Kerberos state for `account_identifier`. Returns
    /// whether setup succeeded; failure is not fatal to service startup.
    async fn setup_kerberos(&self, account_identifier: &str) -> bool;
}
