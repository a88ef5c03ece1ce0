// SPDX-License-Identifier: GPL-3.0-only

pub mod connection;
pub mod mounts;

use thiserror::Error;

pub use connection::shared_connection;
pub use mounts::MountsClient;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("call failed: {0}")]
    Call(String),

    #[error("protocol error: {0}")]
    Protocol(String),
}

impl From<zbus::Error> for ClientError {
    fn from(err: zbus::Error) -> Self {
        ClientError::Call(err.to_string())
    }
}
