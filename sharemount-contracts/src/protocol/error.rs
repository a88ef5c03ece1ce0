// SPDX-License-Identifier: GPL-3.0-only

use serde::{Deserialize, Serialize};
use thiserror::Error;

use sharemount_types::MountError;

/// Wire-level error codes reported by the mount backend daemons.
///
/// These travel over D-Bus as integers; existing values never change and new
/// ones append. They stay inside the orchestrator boundary; callers above it
/// only ever see [`MountError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendErrorCode {
    Failed,
    AccessDenied,
    NotFound,
    Exists,
    InvalidUrl,
    InvalidOperation,
    Io,
    NoMemory,
    Aborted,
    Unavailable,
}

impl BackendErrorCode {
    /// Decode a daemon status integer. `0` means success and is not an error
    /// code; unknown values collapse to [`BackendErrorCode::Failed`].
    pub fn from_wire(value: u32) -> Option<Self> {
        match value {
            0 => None,
            1 => Some(Self::Failed),
            2 => Some(Self::AccessDenied),
            3 => Some(Self::NotFound),
            4 => Some(Self::Exists),
            5 => Some(Self::InvalidUrl),
            6 => Some(Self::InvalidOperation),
            7 => Some(Self::Io),
            8 => Some(Self::NoMemory),
            9 => Some(Self::Aborted),
            10 => Some(Self::Unavailable),
            _ => Some(Self::Failed),
        }
    }

    pub fn to_wire(self) -> u32 {
        match self {
            Self::Failed => 1,
            Self::AccessDenied => 2,
            Self::NotFound => 3,
            Self::Exists => 4,
            Self::InvalidUrl => 5,
            Self::InvalidOperation => 6,
            Self::Io => 7,
            Self::NoMemory => 8,
            Self::Aborted => 9,
            Self::Unavailable => 10,
        }
    }
}

/// A failed backend call: either the daemon answered with an error code, or
/// the call itself never completed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    #[error("backend reported {0:?}")]
    Call(BackendErrorCode),

    #[error("backend transport failure: {0}")]
    Transport(String),
}

impl BackendError {
    /// The single translation point from backend-native errors into the
    /// uniform taxonomy surfaced to callers.
    pub fn to_mount_error(&self) -> MountError {
        match self {
            BackendError::Call(BackendErrorCode::AccessDenied) => MountError::AuthenticationFailed,
            BackendError::Call(BackendErrorCode::InvalidUrl) => MountError::InvalidUrl,
            BackendError::Call(BackendErrorCode::Exists) => MountError::MountExists,
            BackendError::Call(_) | BackendError::Transport(_) => MountError::UnknownFailure,
        }
    }
}

impl From<zbus::Error> for BackendError {
    fn from(err: zbus::Error) -> Self {
        BackendError::Transport(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_codes_round_trip() {
        for code in [
            BackendErrorCode::Failed,
            BackendErrorCode::AccessDenied,
            BackendErrorCode::NotFound,
            BackendErrorCode::Exists,
            BackendErrorCode::InvalidUrl,
            BackendErrorCode::InvalidOperation,
            BackendErrorCode::Io,
            BackendErrorCode::NoMemory,
            BackendErrorCode::Aborted,
            BackendErrorCode::Unavailable,
        ] {
            assert_eq!(BackendErrorCode::from_wire(code.to_wire()), Some(code));
        }
    }

    #[test]
    fn zero_is_success_and_unknown_values_collapse() {
        assert_eq!(BackendErrorCode::from_wire(0), None);
        assert_eq!(
            BackendErrorCode::from_wire(9999),
            Some(BackendErrorCode::Failed)
        );
    }

    #[test]
    fn translation_hides_backend_native_codes() {
        assert_eq!(
            BackendError::Call(BackendErrorCode::AccessDenied).to_mount_error(),
            MountError::AuthenticationFailed
        );
        assert_eq!(
            BackendError::Call(BackendErrorCode::InvalidUrl).to_mount_error(),
            MountError::InvalidUrl
        );
        assert_eq!(
            BackendError::Call(BackendErrorCode::Exists).to_mount_error(),
            MountError::MountExists
        );
        assert_eq!(
            BackendError::Call(BackendErrorCode::Io).to_mount_error(),
            MountError::UnknownFailure
        );
        assert_eq!(
            BackendError::Transport("daemon gone".into()).to_mount_error(),
            MountError::UnknownFailure
        );
    }
}
