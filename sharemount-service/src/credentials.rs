// SPDX-License-Identifier: GPL-3.0-only

//! Pending credential-update replies
//!
//! While a credential dialog is open for a mount, one reply is parked here.
//! The backend's update result consumes it: success fires the reply, anything
//! else drops it so the waiter observes closure instead of hanging forever.

use std::collections::HashMap;
use std::sync::Mutex;

use thiserror::Error;
use tokio::sync::oneshot;

use sharemount_types::MountId;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("a credential update is already pending for mount {0}")]
pub struct ReplyAlreadyPending(pub MountId);

#[derive(Default)]
pub struct CredentialReplies {
    pending: Mutex<HashMap<MountId, oneshot::Sender<()>>>,
}

impl CredentialReplies {
    /// Park a reply for `mount_id`. At most one credential-update flow may be
    /// outstanding per mount.
    pub fn insert(&self, mount_id: MountId) -> Result<oneshot::Receiver<()>, ReplyAlreadyPending> {
        let mut pending = self.pending.lock().unwrap();
        if pending.contains_key(&mount_id) {
            return Err(ReplyAlreadyPending(mount_id));
        }
        let (tx, rx) = oneshot::channel();
        pending.insert(mount_id, tx);
        Ok(rx)
    }

    /// Consume the parked reply: fire it on success, drop it otherwise. The
    /// entry is removed either way.
    pub fn complete(&self, mount_id: &MountId, success: bool) {
        let Some(sender) = self.pending.lock().unwrap().remove(mount_id) else {
            tracing::warn!("No pending credential reply for mount {mount_id}");
            return;
        };
        if success {
            let _ = sender.send(());
        }
    }

    /// Drop every parked reply; waiters observe closure. Used at teardown.
    pub fn clear(&self) {
        self.pending.lock().unwrap().clear();
    }
}
