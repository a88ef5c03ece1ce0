// SPDX-License-Identifier: GPL-3.0-only

//! Shared D-Bus connection management
//!
//! Provides a cached session bus connection reused across all collaborator
//! proxies, avoiding repeated connection establishment.

use std::sync::OnceLock;

use zbus::Connection;

use super::ClientError;

/// Cached D-Bus session bus connection
static SESSION_CONNECTION: OnceLock<Connection> = OnceLock::new();

/// Get or create the shared session bus connection
///
/// The connection is established lazily on first use and cached for
/// subsequent calls.
pub async fn shared_connection() -> Result<&'static Connection, ClientError> {
    if let Some(conn) = SESSION_CONNECTION.get() {
        return Ok(conn);
    }

    // Race during startup is acceptable; the OnceLock retains one connection
    let conn = Connection::session()
        .await
        .map_err(|e| ClientError::Connection(format!("Failed to connect to session bus: {e}")))?;

    let _ = SESSION_CONNECTION.set(conn);

    SESSION_CONNECTION.get().ok_or_else(|| {
        ClientError::Connection("Failed to initialize shared session bus connection".to_string())
    })
}
