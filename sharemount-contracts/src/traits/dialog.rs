// SPDX-License-Identifier: GPL-3.0-only

use async_trait::async_trait;

use sharemount_types::{MountId, ShareUrl};

/// The external credential-entry dialog.
///
/// `show` is fire-and-forget: the user's answer arrives later through the
/// orchestrator's `update_credentials` entry point, not through a return
/// value here.
#[async_trait]
pub trait CredentialsPrompt: Send + Sync {
    async fn show(&self, mount_id: &MountId, share_url: &ShareUrl);
}
