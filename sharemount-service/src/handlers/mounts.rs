// SPDX-License-Identifier: GPL-3.0-only

//! Mount management D-Bus interface
//!
//! The outer surface of the orchestrator: mount/unmount entry points, share
//! gathering with a `SharesFound` signal stream, and the credential and
//! share-path update flows. Passwords pass through here and are never logged.

use std::sync::Arc;

use tokio::sync::oneshot;
use zbus::object_server::SignalEmitter;
use zbus::interface;

use sharemount_types::{MountId, ShareIdentity, ShareUrl, UnmountReason};

use crate::error::ServiceError;
use crate::orchestrator::{MountOrchestrator, MountRequest};

/// D-Bus interface for network share mount operations
pub struct MountsHandler {
    orchestrator: Arc<MountOrchestrator>,
}

impl MountsHandler {
    pub fn new(orchestrator: Arc<MountOrchestrator>) -> Self {
        Self { orchestrator }
    }

    fn parse_reason(reason: &str) -> Result<UnmountReason, ServiceError> {
        match reason {
            "user" => Ok(UnmountReason::User),
            "shutdown" => Ok(UnmountReason::Shutdown),
            other => Err(ServiceError::InvalidArgument(format!(
                "unknown unmount reason: {other}"
            ))),
        }
    }
}

#[interface(name = "org.sharemount.Mounts1")]
impl MountsHandler {
    /// Signal emitted with each batch of discovered shares. The final batch
    /// carries `done = true`.
    #[zbus(signal)]
    async fn shares_found(
        signal_ctxt: &SignalEmitter<'_>,
        shares: Vec<String>,
        done: bool,
    ) -> zbus::Result<()>;

    /// Signal emitted when a requested credential update has settled.
    #[zbus(signal)]
    async fn credentials_updated(
        signal_ctxt: &SignalEmitter<'_>,
        mount_id: &str,
        success: bool,
    ) -> zbus::Result<()>;

    /// Mount a share. Returns the persisted share identity on success.
    async fn mount(
        &self,
        share_path: &str,
        display_name: &str,
        username: &str,
        password: &str,
        use_kerberos: bool,
        save_credentials: bool,
    ) -> zbus::fdo::Result<String> {
        tracing::info!("Mounting share {share_path}");

        let request = MountRequest {
            share_path: share_path.to_string(),
            display_name: display_name.to_string(),
            username: username.to_string(),
            password: password.to_string(),
            use_kerberos,
            save_credentials,
        };
        let share = self
            .orchestrator
            .mount(request)
            .await
            .map_err(ServiceError::Mount)?;
        Ok(share.identity.to_string())
    }

    /// Unmount by persisted identity. `reason` is `user` or `shutdown`.
    async fn unmount(&self, identity: &str, reason: &str) -> zbus::fdo::Result<()> {
        tracing::info!("Unmounting share {identity}");

        let reason = Self::parse_reason(reason)?;
        self.orchestrator
            .unmount(&ShareIdentity::new(identity), reason)
            .await
            .map_err(ServiceError::Mount)?;
        Ok(())
    }

    /// Unmount by backend mount id. `reason` is `user` or `shutdown`.
    async fn unmount_by_mount_id(&self, mount_id: &str, reason: &str) -> zbus::fdo::Result<()> {
        let reason = Self::parse_reason(reason)?;
        self.orchestrator
            .unmount_by_mount_id(&MountId::new(mount_id), reason)
            .await
            .map_err(ServiceError::Mount)?;
        Ok(())
    }

    /// Currently mounted shares as a JSON document.
    async fn list_mounts(&self) -> zbus::fdo::Result<String> {
        serde_json::to_string(&self.orchestrator.mounted_shares())
            .map_err(|e| ServiceError::OperationFailed(format!("serialization: {e}")).into())
    }

    /// Start gathering shares on the network; results arrive as
    /// `SharesFound` signals.
    async fn gather_shares(
        &self,
        #[zbus(signal_context)] signal_ctxt: SignalEmitter<'_>,
    ) -> zbus::fdo::Result<()> {
        let mut batches = self.orchestrator.gather_shares().await;
        let emitter = signal_ctxt.to_owned();
        tokio::spawn(async move {
            while let Some(batch) = batches.recv().await {
                let shares: Vec<String> =
                    batch.shares.iter().map(|url| url.to_string()).collect();
                if Self::shares_found(&emitter, shares, batch.done)
                    .await
                    .is_err()
                {
                    return;
                }
                if batch.done {
                    return;
                }
            }
        });
        Ok(())
    }

    /// Open the credential dialog for a mounted share. The outcome arrives
    /// later as a `CredentialsUpdated` signal.
    async fn request_credentials(
        &self,
        #[zbus(signal_context)] signal_ctxt: SignalEmitter<'_>,
        mount_id: &str,
    ) -> zbus::fdo::Result<()> {
        let id = MountId::new(mount_id);
        let share = self
            .orchestrator
            .find_by_mount_id(&id)
            .ok_or_else(|| ServiceError::MountNotFound(mount_id.to_string()))?;

        let settled = self
            .orchestrator
            .request_credentials(&share.share_url, &id)
            .await
            .map_err(|e| ServiceError::OperationFailed(e.to_string()))?;

        let emitter = signal_ctxt.to_owned();
        let mount_id = mount_id.to_string();
        tokio::spawn(async move {
            let success = settled.await.is_ok();
            let _ = Self::credentials_updated(&emitter, &mount_id, success).await;
        });
        Ok(())
    }

    /// Push credentials entered in the dialog down to the backend.
    async fn update_credentials(
        &self,
        mount_id: &str,
        username: &str,
        password: &str,
    ) -> zbus::fdo::Result<()> {
        self.orchestrator
            .update_credentials(&MountId::new(mount_id), username, password)
            .await;
        Ok(())
    }

    /// Re-resolve a share's host and push the updated path to the backend.
    /// Returns whether the caller should retry its pending read.
    async fn request_updated_share_path(
        &self,
        mount_id: &str,
        share_path: &str,
    ) -> zbus::fdo::Result<bool> {
        let url = ShareUrl::parse(share_path)
            .map_err(|e| ServiceError::InvalidArgument(e.to_string()))?;
        let (tx, rx) = oneshot::channel();
        self.orchestrator
            .request_updated_share_path(&url, &MountId::new(mount_id), tx)
            .await;
        Ok(rx.await.unwrap_or(false))
    }

    /// Re-prime backend Kerberos state after ticket renewal.
    async fn update_kerberos_credentials(
        &self,
        account_identifier: &str,
    ) -> zbus::fdo::Result<()> {
        self.orchestrator
            .update_kerberos_credentials(account_identifier)
            .await;
        Ok(())
    }
}
