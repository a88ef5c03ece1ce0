//! Mount results, identifiers and records

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::share_url::ShareUrl;

/// Opaque identifier assigned by the mount backend to an active mount.
///
/// The orchestrator never invents one; it only carries what the backend
/// returned. Distinct from [`ShareIdentity`], which survives restarts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MountId(String);

impl MountId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Persisted, stable identity of a mounted share.
///
/// This string is the only artifact that survives a restart; the identity
/// codec in the service crate owns its grammar. Treated as opaque everywhere
/// else.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShareIdentity(String);

impl ShareIdentity {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ShareIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which backend implementation carries a mount. Selected once at service
/// construction and never mixed for the same identity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Provider daemon speaking the original per-operation protocol.
    #[default]
    Provider,
    /// FUSE-based daemon exposing the share as a local filesystem.
    Fuse,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Provider => write!(f, "provider"),
            BackendKind::Fuse => write!(f, "fuse"),
        }
    }
}

impl std::str::FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "provider" => Ok(BackendKind::Provider),
            "fuse" => Ok(BackendKind::Fuse),
            _ => Err(format!("Invalid backend kind: {s}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnmountReason {
    /// Explicit user action; saved credentials and persisted state go away.
    User,
    /// Service shutdown; persisted state is kept for the next restore.
    Shutdown,
}

/// Uniform mount failure taxonomy surfaced to callers.
///
/// Backend-native codes are translated into this set at the orchestrator
/// boundary; callers never see them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MountError {
    #[error("share location is malformed or missing a share name")]
    InvalidUrl,

    #[error("Kerberos mounts require a hostname, not an IP address")]
    InvalidSsoUrl,

    #[error("share is already mounted")]
    MountExists,

    #[error("server rejected the supplied credentials")]
    AuthenticationFailed,

    #[error("mount failed")]
    UnknownFailure,
}

impl MountError {
    /// Stable wire code for the D-Bus surface. Existing values never change;
    /// new variants append.
    pub fn code(self) -> u16 {
        match self {
            Self::UnknownFailure => 1,
            Self::AuthenticationFailed => 2,
            Self::MountExists => 3,
            Self::InvalidUrl => 4,
            Self::InvalidSsoUrl => 5,
        }
    }
}

/// One entry per currently-mounted share.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MountedShare {
    pub identity: ShareIdentity,
    pub share_url: ShareUrl,
    pub mount_id: MountId,
    pub backend: BackendKind,
}
