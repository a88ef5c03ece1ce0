// SPDX-License-Identifier: GPL-3.0-only

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use sharemount_types::{ShareIdentity, UnmountReason};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("a mount point with this identity is already registered")]
    AlreadyRegistered,

    #[error("mount point registration rejected: {0}")]
    Rejected(String),

    #[error("registry transport failure: {0}")]
    Transport(String),
}

impl From<zbus::Error> for RegistryError {
    fn from(err: zbus::Error) -> Self {
        RegistryError::Transport(err.to_string())
    }
}

/// Options for exposing a mount point to applications.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationOptions {
    /// The persisted share identity; doubles as the registry key.
    pub identity: ShareIdentity,
    pub display_name: String,
    pub writable: bool,
    /// Persistent registrations are returned by `registered_identities` on
    /// the next restart; premounts register non-persistent.
    pub persistent: bool,
}

/// The OS-level virtual-filesystem registration layer.
///
/// Registering makes a mount visible to applications; the persistent subset
/// of registrations is the restore set after a service restart.
#[async_trait]
pub trait MountPointRegistry: Send + Sync {
    async fn register(&self, options: &RegistrationOptions) -> Result<(), RegistryError>;

    async fn unregister(
        &self,
        identity: &ShareIdentity,
        reason: UnmountReason,
    ) -> Result<(), RegistryError>;

    /// Identities registered with `persistent: true`, surviving restarts.
    async fn registered_identities(&self) -> Result<Vec<ShareIdentity>, RegistryError>;
}
