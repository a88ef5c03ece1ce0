// SPDX-License-Identifier: GPL-3.0-only

//! Network-change events
//!
//! Watches NetworkManager's state on the system bus and forwards each change
//! as a unit event. The orchestrator reacts by refreshing host discovery so
//! the resolution cache tracks the network the device is actually on.

use futures_util::StreamExt;
use tokio::sync::mpsc;
use zbus::Connection;
use zbus_macros::proxy;

#[proxy(
    default_service = "org.freedesktop.NetworkManager",
    default_path = "/org/freedesktop/NetworkManager",
    interface = "org.freedesktop.NetworkManager"
)]
trait NetworkManager {
    #[zbus(signal)]
    fn state_changed(&self, state: u32) -> zbus::Result<()>;
}

/// Subscribe to network state changes. The receiver yields one `()` per
/// change; the forwarding task stops when the receiver is dropped.
pub async fn network_change_events(connection: &Connection) -> zbus::Result<mpsc::Receiver<()>> {
    let proxy = NetworkManagerProxy::new(connection).await?;
    let mut signals = proxy.receive_state_changed().await?;
    let (tx, rx) = mpsc::channel(4);

    tokio::spawn(async move {
        while let Some(_signal) = signals.next().await {
            if tx.send(()).await.is_err() {
                return;
            }
        }
    });

    Ok(rx)
}
