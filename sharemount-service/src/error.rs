// SPDX-License-Identifier: GPL-3.0-only

use thiserror::Error;
use zbus::fdo;

use sharemount_types::MountError;

/// Service-specific errors
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("mount failed: {0}")]
    Mount(#[from] MountError),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("operation failed: {0}")]
    OperationFailed(String),

    #[error("mount not found: {0}")]
    MountNotFound(String),
}

impl From<ServiceError> for fdo::Error {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Mount(mount) => {
                fdo::Error::Failed(format!("{mount} (code {})", mount.code()))
            }
            ServiceError::InvalidArgument(msg) => fdo::Error::InvalidArgs(msg),
            ServiceError::MountNotFound(msg) => {
                fdo::Error::Failed(format!("Mount not found: {msg}"))
            }
            ServiceError::OperationFailed(msg) => fdo::Error::Failed(msg),
        }
    }
}

pub type Result<T> = std::result::Result<T, ServiceError>;
