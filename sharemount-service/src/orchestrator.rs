// SPDX-License-Identifier: GPL-3.0-only

//! Mount orchestration
//!
//! The orchestrator owns the active-mount table and sequences every mount
//! flow: validate, resolve the host, call the mount backend, register the
//! mount point with the VFS layer, and roll the backend state back when the
//! second phase fails. Backend-native error codes never escape this module.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, Weak};

use tokio::sync::{mpsc, oneshot};

use sharemount_contracts::{
    BackendMountOptions, CredentialsPrompt, HostLocatorKind, MountBackend, MountPointRegistry,
    RegistrationOptions, RegistryError, ShareDiscovery, SharePolicy,
};
use sharemount_types::{
    AuthDescriptor, KerberosConfig, MountError, MountId, MountedShare, ShareIdentity, ShareUrl,
    UnmountReason, parse_user_name, parse_user_principal_name,
};

use crate::credentials::{CredentialReplies, ReplyAlreadyPending};
use crate::discovery::DiscoveryScheduler;
use crate::identity;
use crate::policy::partition_preconfigured;

/// A user-initiated mount request, exactly as it arrived at the service
/// boundary.
#[derive(Debug, Clone, Default)]
pub struct MountRequest {
    pub share_path: String,
    pub display_name: String,
    pub username: String,
    pub password: String,
    pub use_kerberos: bool,
    pub save_credentials: bool,
}

/// One batch of shares found during gathering. `done` is true on the final
/// batch and never before.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatheredShares {
    pub shares: Vec<ShareUrl>,
    pub done: bool,
}

struct Inner {
    backend: Arc<dyn MountBackend>,
    discovery: DiscoveryScheduler,
    registry: Arc<dyn MountPointRegistry>,
    prompt: Arc<dyn CredentialsPrompt>,
    policy: Arc<dyn SharePolicy>,
    replies: CredentialReplies,
    state: Mutex<MountTable>,
}

#[derive(Default)]
struct MountTable {
    active: HashMap<ShareIdentity, MountedShare>,
    /// Normalized share URLs with an operation outstanding. A second
    /// operation for the same URL is rejected, never run concurrently.
    in_flight: HashSet<String>,
}

/// Releases the in-flight slot for one share URL when the operation ends,
/// including on early returns. Holding a `Weak` keeps teardown safe: if the
/// orchestrator is gone, release is a no-op.
struct InFlightGuard {
    inner: Weak<Inner>,
    key: String,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        if let Some(inner) = self.inner.upgrade() {
            inner.state.lock().unwrap().in_flight.remove(&self.key);
        }
    }
}

impl Inner {
    /// Claim the in-flight slot for `url`, rejecting when the share is
    /// already mounted or an operation for it is outstanding.
    fn begin_operation(self: &Arc<Self>, url: &ShareUrl) -> Result<InFlightGuard, MountError> {
        let mut table = self.state.lock().unwrap();
        if table.active.values().any(|mount| mount.share_url == *url) {
            return Err(MountError::MountExists);
        }
        Self::claim_in_flight_locked(self, &mut table, url).ok_or(MountError::MountExists)
    }

    /// Claim the in-flight slot without the already-mounted check; unmount
    /// needs the slot for a share that *is* active.
    fn claim_in_flight(self: &Arc<Self>, url: &ShareUrl) -> Option<InFlightGuard> {
        let mut table = self.state.lock().unwrap();
        Self::claim_in_flight_locked(self, &mut table, url)
    }

    fn claim_in_flight_locked(
        self: &Arc<Self>,
        table: &mut MountTable,
        url: &ShareUrl,
    ) -> Option<InFlightGuard> {
        if !table.in_flight.insert(url.as_str().to_string()) {
            return None;
        }
        Some(InFlightGuard {
            inner: Arc::downgrade(self),
            key: url.as_str().to_string(),
        })
    }

    /// Record a confirmed mount. Only the backend success path calls this;
    /// the table never holds speculative entries.
    fn record_active(&self, share: MountedShare) {
        self.state
            .lock()
            .unwrap()
            .active
            .insert(share.identity.clone(), share);
    }
}

fn registry_error_to_mount_error(err: &RegistryError) -> MountError {
    match err {
        RegistryError::AlreadyRegistered => MountError::MountExists,
        RegistryError::Rejected(_) | RegistryError::Transport(_) => MountError::UnknownFailure,
    }
}

pub struct MountOrchestrator {
    inner: Arc<Inner>,
}

impl MountOrchestrator {
    pub fn new(
        backend: Arc<dyn MountBackend>,
        discovery: Arc<dyn ShareDiscovery>,
        registry: Arc<dyn MountPointRegistry>,
        prompt: Arc<dyn CredentialsPrompt>,
        policy: Arc<dyn SharePolicy>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                backend,
                discovery: DiscoveryScheduler::new(discovery),
                registry,
                prompt,
                policy,
                replies: CredentialReplies::default(),
                state: Mutex::new(MountTable::default()),
            }),
        }
    }

    /// Complete service setup: prime Kerberos where policy asks for it,
    /// register discovery transports, then restore persisted mounts.
    pub async fn start(&self) {
        let kerberos = self.inner.policy.kerberos_config().await;
        if let Some(account) = kerberos.account_identifier() {
            if !self.inner.backend.setup_kerberos(account).await {
                tracing::error!("Kerberos setup failed");
            }
        }
        self.register_host_locators().await;
        self.restore_mounts().await;
    }

    /// Re-prime the backend after the signed-in account's tickets changed.
    pub async fn update_kerberos_credentials(&self, account_identifier: &str) {
        if !self.inner.backend.setup_kerberos(account_identifier).await {
            tracing::error!("Updating Kerberos credentials failed");
        }
    }

    async fn register_host_locators(&self) {
        let discovery = self.inner.discovery.service();
        if let Err(e) = discovery.register_host_locator(HostLocatorKind::Mdns).await {
            tracing::warn!("Failed to register mDNS host locator: {e}");
        }
        if self.inner.policy.netbios_discovery_enabled().await {
            if let Err(e) = discovery
                .register_host_locator(HostLocatorKind::NetBios)
                .await
            {
                tracing::warn!("Failed to register NetBIOS host locator: {e}");
            }
        } else {
            tracing::warn!("NetBIOS discovery disabled");
        }
    }

    /// Mount a share on behalf of the user.
    ///
    /// Validation failures are reported before any backend round-trip. On
    /// success the share is registered with the VFS layer and recorded in the
    /// active table; a registration failure unwinds the backend mount.
    pub async fn mount(&self, request: MountRequest) -> Result<MountedShare, MountError> {
        let url = match ShareUrl::parse(&request.share_path) {
            Ok(url) if url.has_share() => url,
            _ => return Err(MountError::InvalidUrl),
        };

        // Kerberos tickets are bound to hostnames. Failing here gives the
        // user a clear error instead of the backend's permission error.
        if request.use_kerberos && url.host_is_ip_address() {
            return Err(MountError::InvalidSsoUrl);
        }

        let _guard = self.inner.begin_operation(&url)?;

        let kerberos = self.inner.policy.kerberos_config().await;
        let (auth, username, workgroup) = if request.use_kerberos {
            match derive_kerberos_user(&kerberos) {
                Some((auth, parsed)) => (auth, parsed.username, parsed.workgroup),
                None => {
                    tracing::warn!("No Kerberos credential source available");
                    return Err(MountError::AuthenticationFailed);
                }
            }
        } else {
            let parsed = parse_user_name(&request.username);
            let auth = if request.save_credentials && !parsed.username.is_empty() {
                AuthDescriptor::UsernameWorkgroup {
                    username: parsed.username.clone(),
                    workgroup: parsed.workgroup.clone(),
                }
            } else {
                AuthDescriptor::NoAuth
            };
            (auth, parsed.username, parsed.workgroup)
        };

        let identity = identity::encode(&url, &auth);

        let mount_path = if auth.is_kerberos() {
            url.clone()
        } else {
            self.inner.discovery.resolve_or_original(&url).await
        };

        let options = BackendMountOptions {
            original_path: url.as_str().to_string(),
            username,
            workgroup,
            ntlm_enabled: self.inner.policy.ntlm_enabled().await,
            save_password: request.save_credentials && !request.use_kerberos,
            account_hash: self.inner.policy.account_hash().await,
            skip_connect: false,
            restore_password: false,
        };

        let mount_id = self
            .inner
            .backend
            .mount(mount_path.as_str(), &options, &request.password)
            .await
            .map_err(|e| {
                tracing::warn!("Backend mount of {url} failed: {e}");
                e.to_mount_error()
            })?;

        let display_name = if request.display_name.is_empty() {
            url.display_name().to_string()
        } else {
            request.display_name.clone()
        };
        let share = self
            .register_mounted_share(
                identity,
                url.clone(),
                mount_id,
                display_name,
                true,
                request.save_credentials,
            )
            .await?;

        self.inner.policy.set_most_recently_used(&url).await;
        Ok(share)
    }

    /// Second phase of the mount commit: expose the mount point through the
    /// VFS registry, unwinding the backend mount if registration fails. A
    /// backend mount must never be left dangling without a visible mount
    /// point.
    async fn register_mounted_share(
        &self,
        identity: ShareIdentity,
        url: ShareUrl,
        mount_id: MountId,
        display_name: String,
        persistent: bool,
        remove_password_on_rollback: bool,
    ) -> Result<MountedShare, MountError> {
        let registration = RegistrationOptions {
            identity: identity.clone(),
            display_name,
            writable: true,
            persistent,
        };
        if let Err(reg_err) = self.inner.registry.register(&registration).await {
            tracing::error!("Mount point registration for {url} failed: {reg_err}");
            if let Err(unmount_err) = self
                .inner
                .backend
                .unmount(&mount_id, remove_password_on_rollback)
                .await
            {
                tracing::warn!("Rollback unmount of {url} failed: {unmount_err}");
            }
            return Err(registry_error_to_mount_error(&reg_err));
        }

        let share = MountedShare {
            identity,
            share_url: url,
            mount_id,
            backend: self.inner.backend.kind(),
        };
        self.inner.record_active(share.clone());
        Ok(share)
    }

    /// Restore persisted mounts and premount policy shares. Skipped entirely
    /// when there is nothing to restore, so an idle profile never pays for a
    /// discovery pass.
    pub async fn restore_mounts(&self) {
        let persisted = match self.inner.registry.registered_identities().await {
            Ok(identities) => identities,
            Err(e) => {
                tracing::error!("Failed to read persisted mounts: {e}");
                Vec::new()
            }
        };
        let premounts =
            partition_preconfigured(&self.inner.policy.preconfigured_shares().await).premount;

        if persisted.is_empty() && premounts.is_empty() {
            return;
        }

        if let Err(e) = self.inner.discovery.run_discovery().await {
            tracing::warn!("Host discovery before restore failed: {e}");
        }

        for identity in persisted {
            self.remount(identity).await;
        }
        for url in premounts {
            self.mount_preconfigured_share(url).await;
        }
    }

    /// Reconstruct one persisted mount.
    ///
    /// Failures are logged and leave the persisted identity in place: a
    /// restore failure is more likely transient (backend restarting) than a
    /// deliberate user action, and only an explicit unmount forgets a mount.
    async fn remount(&self, identity: ShareIdentity) {
        let (url, auth) = match identity::decode(&identity) {
            Ok(decoded) => decoded,
            Err(e) => {
                tracing::error!("Skipping persisted mount: {e}");
                return;
            }
        };

        let guard = match self.inner.begin_operation(&url) {
            Ok(guard) => guard,
            Err(_) => {
                tracing::warn!("Share {url} already mounted, skipping restore");
                return;
            }
        };
        let _guard = guard;

        let (username, workgroup) = match &auth {
            AuthDescriptor::NoAuth => (String::new(), String::new()),
            AuthDescriptor::UsernameWorkgroup {
                username,
                workgroup,
            } => (username.clone(), workgroup.clone()),
            AuthDescriptor::KerberosSso { username, domain } => {
                (username.clone(), domain.clone())
            }
            AuthDescriptor::KerberosDomain => {
                let kerberos = self.inner.policy.kerberos_config().await;
                match kerberos.principal().and_then(parse_user_principal_name) {
                    Some(parsed) => (parsed.username, parsed.workgroup),
                    None => {
                        tracing::error!("No Kerberos principal for restoring {url}");
                        (String::new(), String::new())
                    }
                }
            }
        };

        // Kerberos tickets are keyed on the hostname, so those mounts never
        // resolve it.
        let mount_path = if auth.is_kerberos() {
            url.clone()
        } else {
            self.inner.discovery.resolve_or_original(&url).await
        };

        let restore_password = matches!(
            &auth,
            AuthDescriptor::UsernameWorkgroup { username, .. } if !username.is_empty()
        );
        let options = BackendMountOptions {
            original_path: url.as_str().to_string(),
            username,
            workgroup,
            ntlm_enabled: self.inner.policy.ntlm_enabled().await,
            save_password: false,
            account_hash: self.inner.policy.account_hash().await,
            skip_connect: true,
            restore_password,
        };

        match self.inner.backend.mount(mount_path.as_str(), &options, "").await {
            Ok(mount_id) => {
                self.inner.record_active(MountedShare {
                    identity,
                    share_url: url,
                    mount_id,
                    backend: self.inner.backend.kind(),
                });
            }
            Err(e) => {
                // The persisted identity is deliberately kept.
                tracing::error!("Failed to restore mount {url}: {e}");
            }
        }
    }

    /// Mount one policy-preconfigured share: empty credentials, connection
    /// deferred, registered non-persistent so it is re-derived from policy on
    /// the next startup instead of being restored.
    async fn mount_preconfigured_share(&self, url: ShareUrl) {
        let guard = match self.inner.begin_operation(&url) {
            Ok(guard) => guard,
            Err(_) => return,
        };
        let _guard = guard;

        let identity = identity::encode(&url, &AuthDescriptor::NoAuth);
        let options = BackendMountOptions {
            original_path: url.as_str().to_string(),
            username: String::new(),
            workgroup: String::new(),
            ntlm_enabled: self.inner.policy.ntlm_enabled().await,
            save_password: false,
            account_hash: self.inner.policy.account_hash().await,
            skip_connect: true,
            restore_password: false,
        };
        let mount_path = self.inner.discovery.resolve_or_original(&url).await;

        match self.inner.backend.mount(mount_path.as_str(), &options, "").await {
            Ok(mount_id) => {
                let display_name = url.display_name().to_string();
                if let Err(e) = self
                    .register_mounted_share(identity, url, mount_id, display_name, false, false)
                    .await
                {
                    tracing::error!("Error mounting preconfigured share: {e}");
                }
            }
            Err(e) => {
                tracing::error!("Error mounting preconfigured share {url}: {e}");
            }
        }
    }

    /// Unmount a share.
    ///
    /// The active entry is removed even when the backend reports an error:
    /// once unmount has been requested, local bookkeeping must read "not
    /// mounted" rather than diverge from the backend.
    pub async fn unmount(
        &self,
        identity: &ShareIdentity,
        reason: UnmountReason,
    ) -> Result<(), MountError> {
        let share = self
            .inner
            .state
            .lock()
            .unwrap()
            .active
            .get(identity)
            .cloned();
        let Some(share) = share else {
            tracing::warn!("Unmount requested for unknown identity {identity}");
            return Err(MountError::UnknownFailure);
        };

        let Some(_guard) = self.inner.claim_in_flight(&share.share_url) else {
            // Another operation (typically a concurrent unmount) owns the
            // slot; running both would double-drive the backend.
            return Err(MountError::MountExists);
        };

        let remove_password = matches!(reason, UnmountReason::User);
        if let Err(e) = self
            .inner
            .backend
            .unmount(&share.mount_id, remove_password)
            .await
        {
            tracing::warn!("Backend unmount of {} failed: {e}", share.share_url);
        }

        let result = self.inner.registry.unregister(identity, reason).await;
        self.inner.state.lock().unwrap().active.remove(identity);

        result.map_err(|e| {
            tracing::error!("Unregistering mount point {identity} failed: {e}");
            registry_error_to_mount_error(&e)
        })
    }

    /// Unmount by backend mount id, for callers that hold the backend handle
    /// rather than the persisted identity.
    pub async fn unmount_by_mount_id(
        &self,
        mount_id: &MountId,
        reason: UnmountReason,
    ) -> Result<(), MountError> {
        let Some(share) = self.find_by_mount_id(mount_id) else {
            tracing::warn!("Unmount requested for unknown mount id {mount_id}");
            return Err(MountError::UnknownFailure);
        };
        self.unmount(&share.identity, reason).await
    }

    /// Gather shares on the network. Preconfigured dropdown shares are
    /// delivered first; the final batch carries `done = true`.
    pub async fn gather_shares(&self) -> mpsc::Receiver<GatheredShares> {
        let (tx, rx) = mpsc::channel(8);

        let dropdown =
            partition_preconfigured(&self.inner.policy.preconfigured_shares().await).dropdown;
        if !dropdown.is_empty() {
            let _ = tx
                .send(GatheredShares {
                    shares: dropdown,
                    done: false,
                })
                .await;
        }

        let (raw_tx, mut raw_rx) = mpsc::channel(8);
        let discovery = self.inner.discovery.service();
        tokio::spawn(async move {
            if let Err(e) = discovery.gather_shares(raw_tx).await {
                tracing::warn!("Share gathering failed: {e}");
            }
        });
        tokio::spawn(async move {
            // Hold one batch back so the last one can be flagged done.
            let mut pending: Option<Vec<ShareUrl>> = None;
            while let Some(batch) = raw_rx.recv().await {
                if let Some(shares) = pending.take() {
                    if tx.send(GatheredShares { shares, done: false }).await.is_err() {
                        return;
                    }
                }
                pending = Some(batch);
            }
            let _ = tx
                .send(GatheredShares {
                    shares: pending.unwrap_or_default(),
                    done: true,
                })
                .await;
        });

        rx
    }

    /// Park a reply and open the credential dialog for `mount_id`. The
    /// returned receiver fires once the backend confirms updated credentials.
    pub async fn request_credentials(
        &self,
        share_url: &ShareUrl,
        mount_id: &MountId,
    ) -> Result<oneshot::Receiver<()>, ReplyAlreadyPending> {
        let receiver = self.inner.replies.insert(mount_id.clone())?;
        self.inner.prompt.show(mount_id, share_url).await;
        Ok(receiver)
    }

    /// Push updated credentials to the backend and settle any reply parked by
    /// [`MountOrchestrator::request_credentials`].
    pub async fn update_credentials(&self, mount_id: &MountId, username: &str, password: &str) {
        let parsed = parse_user_name(username);
        let result = self
            .inner
            .backend
            .update_credentials(mount_id, &parsed.workgroup, &parsed.username, password)
            .await;
        if let Err(e) = &result {
            tracing::error!("Failed to update credentials for mount {mount_id}: {e}");
        }
        self.inner.replies.complete(mount_id, result.is_ok());
    }

    /// Re-resolve a share's host (running discovery when the cooldown allows
    /// it) and push the resolved path to the backend. `reply` carries whether
    /// the caller should retry its read; it is always sent exactly once.
    pub async fn request_updated_share_path(
        &self,
        share_url: &ShareUrl,
        mount_id: &MountId,
        reply: oneshot::Sender<bool>,
    ) {
        if self.inner.discovery.should_run_discovery() {
            if let Err(e) = self.inner.discovery.run_discovery().await {
                tracing::warn!("Host discovery failed: {e}");
            }
        }

        let Some(resolved) = self.inner.discovery.try_resolve_cached(share_url).await else {
            let _ = reply.send(false);
            return;
        };

        match self
            .inner
            .backend
            .update_share_path(mount_id, resolved.as_str())
            .await
        {
            Ok(()) => {
                let _ = reply.send(true);
            }
            Err(e) => {
                tracing::error!("Failed to update share path for mount {mount_id}: {e}");
                let _ = reply.send(false);
            }
        }
    }

    /// Refresh the resolution cache whenever the network changes. The task
    /// holds a weak reference: after the orchestrator is dropped, remaining
    /// events are ignored instead of touching freed state.
    pub fn watch_network_changes(&self, mut events: mpsc::Receiver<()>) {
        let inner = Arc::downgrade(&self.inner);
        tokio::spawn(async move {
            while events.recv().await.is_some() {
                let Some(inner) = inner.upgrade() else {
                    return;
                };
                tracing::debug!("Network changed, refreshing host discovery");
                if let Err(e) = inner.discovery.run_discovery().await {
                    tracing::warn!("Host discovery after network change failed: {e}");
                }
            }
        });
    }

    /// Snapshot of the active mounts.
    pub fn mounted_shares(&self) -> Vec<MountedShare> {
        self.inner
            .state
            .lock()
            .unwrap()
            .active
            .values()
            .cloned()
            .collect()
    }

    pub fn find_by_mount_id(&self, mount_id: &MountId) -> Option<MountedShare> {
        self.inner
            .state
            .lock()
            .unwrap()
            .active
            .values()
            .find(|share| share.mount_id == *mount_id)
            .cloned()
    }

    /// Drop parked credential replies so no waiter outlives the service.
    pub fn shutdown(&self) {
        self.inner.replies.clear();
    }
}

fn derive_kerberos_user(
    kerberos: &KerberosConfig,
) -> Option<(AuthDescriptor, sharemount_types::ParsedUserName)> {
    let parsed = kerberos.principal().and_then(parse_user_principal_name)?;
    let auth = match kerberos {
        KerberosConfig::Disabled => return None,
        KerberosConfig::ActiveDirectory { .. } => AuthDescriptor::KerberosDomain,
        KerberosConfig::Sso { .. } => AuthDescriptor::KerberosSso {
            username: parsed.username.clone(),
            domain: parsed.workgroup.clone(),
        },
    };
    Some((auth, parsed))
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicBool, AtomicI32, AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;

    use sharemount_contracts::{BackendError, BackendErrorCode, DiscoveryError};
    use sharemount_types::{BackendKind, PreconfiguredShare, ShareMode};

    use crate::discovery::HOST_DISCOVERY_COOLDOWN;

    #[derive(Default)]
    struct MockBackend {
        next_id: AtomicI32,
        fail_mount: AtomicBool,
        fail_unmount: AtomicBool,
        mount_calls: Mutex<Vec<(String, BackendMountOptions)>>,
        unmount_calls: Mutex<Vec<(MountId, bool)>>,
        update_path_calls: Mutex<Vec<(MountId, String)>>,
        credential_calls: Mutex<Vec<(MountId, String, String)>>,
        fail_credentials: AtomicBool,
    }

    #[async_trait]
    impl MountBackend for MockBackend {
        fn kind(&self) -> BackendKind {
            BackendKind::Provider
        }

        async fn mount(
            &self,
            path: &str,
            options: &BackendMountOptions,
            _password: &str,
        ) -> Result<MountId, BackendError> {
            self.mount_calls
                .lock()
                .unwrap()
                .push((path.to_string(), options.clone()));
            if self.fail_mount.load(Ordering::SeqCst) {
                return Err(BackendError::Call(BackendErrorCode::AccessDenied));
            }
            let id = self.next_id.fetch_add(1, Ordering::SeqCst);
            Ok(MountId::new(id.to_string()))
        }

        async fn unmount(
            &self,
            mount_id: &MountId,
            remove_password: bool,
        ) -> Result<(), BackendError> {
            self.unmount_calls
                .lock()
                .unwrap()
                .push((mount_id.clone(), remove_password));
            if self.fail_unmount.load(Ordering::SeqCst) {
                return Err(BackendError::Call(BackendErrorCode::Failed));
            }
            Ok(())
        }

        async fn update_credentials(
            &self,
            mount_id: &MountId,
            workgroup: &str,
            username: &str,
            _password: &str,
        ) -> Result<(), BackendError> {
            self.credential_calls.lock().unwrap().push((
                mount_id.clone(),
                workgroup.to_string(),
                username.to_string(),
            ));
            if self.fail_credentials.load(Ordering::SeqCst) {
                return Err(BackendError::Call(BackendErrorCode::AccessDenied));
            }
            Ok(())
        }

        async fn update_share_path(
            &self,
            mount_id: &MountId,
            new_path: &str,
        ) -> Result<(), BackendError> {
            self.update_path_calls
                .lock()
                .unwrap()
                .push((mount_id.clone(), new_path.to_string()));
            Ok(())
        }

        async fn setup_kerberos(&self, _account_identifier: &str) -> bool {
            true
        }
    }

    #[derive(Default)]
    struct MockDiscovery {
        discover_calls: AtomicUsize,
        resolutions: Mutex<HashMap<String, ShareUrl>>,
    }

    #[async_trait]
    impl ShareDiscovery for MockDiscovery {
        async fn discover_hosts(&self) -> Result<(), DiscoveryError> {
            self.discover_calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn gather_shares(
            &self,
            shares: mpsc::Sender<Vec<ShareUrl>>,
        ) -> Result<(), DiscoveryError> {
            let _ = shares
                .send(vec![ShareUrl::parse("smb://found/share").unwrap()])
                .await;
            Ok(())
        }

        async fn try_resolve(&self, url: &ShareUrl) -> Option<ShareUrl> {
            self.resolutions.lock().unwrap().get(url.as_str()).cloned()
        }

        async fn register_host_locator(
            &self,
            _locator: HostLocatorKind,
        ) -> Result<(), DiscoveryError> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct MockRegistry {
        fail_register: AtomicBool,
        registered: Mutex<Vec<RegistrationOptions>>,
        unregistered: Mutex<Vec<ShareIdentity>>,
        persisted: Mutex<Vec<ShareIdentity>>,
    }

    #[async_trait]
    impl MountPointRegistry for MockRegistry {
        async fn register(&self, options: &RegistrationOptions) -> Result<(), RegistryError> {
            if self.fail_register.load(Ordering::SeqCst) {
                return Err(RegistryError::Rejected("no slots".to_string()));
            }
            self.registered.lock().unwrap().push(options.clone());
            Ok(())
        }

        async fn unregister(
            &self,
            identity: &ShareIdentity,
            _reason: UnmountReason,
        ) -> Result<(), RegistryError> {
            self.unregistered.lock().unwrap().push(identity.clone());
            Ok(())
        }

        async fn registered_identities(&self) -> Result<Vec<ShareIdentity>, RegistryError> {
            Ok(self.persisted.lock().unwrap().clone())
        }
    }

    #[derive(Default)]
    struct MockPrompt {
        shown: Mutex<Vec<(MountId, ShareUrl)>>,
    }

    #[async_trait]
    impl CredentialsPrompt for MockPrompt {
        async fn show(&self, mount_id: &MountId, share_url: &ShareUrl) {
            self.shown
                .lock()
                .unwrap()
                .push((mount_id.clone(), share_url.clone()));
        }
    }

    #[derive(Default)]
    struct MockPolicy {
        preconfigured: Mutex<Vec<PreconfiguredShare>>,
        kerberos: Mutex<Option<KerberosConfig>>,
        most_recent: Mutex<Option<ShareUrl>>,
    }

    #[async_trait]
    impl SharePolicy for MockPolicy {
        async fn preconfigured_shares(&self) -> Vec<PreconfiguredShare> {
            self.preconfigured.lock().unwrap().clone()
        }

        async fn ntlm_enabled(&self) -> bool {
            true
        }

        async fn netbios_discovery_enabled(&self) -> bool {
            true
        }

        async fn kerberos_config(&self) -> KerberosConfig {
            self.kerberos
                .lock()
                .unwrap()
                .clone()
                .unwrap_or(KerberosConfig::Disabled)
        }

        async fn account_hash(&self) -> String {
            "hash".to_string()
        }

        async fn set_most_recently_used(&self, url: &ShareUrl) {
            *self.most_recent.lock().unwrap() = Some(url.clone());
        }
    }

    struct Fixture {
        backend: Arc<MockBackend>,
        discovery: Arc<MockDiscovery>,
        registry: Arc<MockRegistry>,
        prompt: Arc<MockPrompt>,
        policy: Arc<MockPolicy>,
        orchestrator: MountOrchestrator,
    }

    fn fixture() -> Fixture {
        let backend = Arc::new(MockBackend::default());
        let discovery = Arc::new(MockDiscovery::default());
        let registry = Arc::new(MockRegistry::default());
        let prompt = Arc::new(MockPrompt::default());
        let policy = Arc::new(MockPolicy::default());
        let orchestrator = MountOrchestrator::new(
            backend.clone(),
            discovery.clone(),
            registry.clone(),
            prompt.clone(),
            policy.clone(),
        );
        Fixture {
            backend,
            discovery,
            registry,
            prompt,
            policy,
            orchestrator,
        }
    }

    fn request(path: &str) -> MountRequest {
        MountRequest {
            share_path: path.to_string(),
            ..MountRequest::default()
        }
    }

    #[tokio::test]
    async fn mounting_twice_yields_mount_exists_and_one_backend_call() {
        let fx = fixture();

        let first = fx.orchestrator.mount(request("smb://server/share")).await;
        assert!(first.is_ok());

        let second = fx.orchestrator.mount(request("smb://server/share")).await;
        assert_eq!(second.unwrap_err(), MountError::MountExists);

        assert_eq!(fx.backend.mount_calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn malformed_or_shareless_urls_fail_before_the_backend() {
        let fx = fixture();

        for path in ["not a url", "smb://server", "http://server/share"] {
            let result = fx.orchestrator.mount(request(path)).await;
            assert_eq!(result.unwrap_err(), MountError::InvalidUrl, "path {path:?}");
        }
        assert!(fx.backend.mount_calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn kerberos_against_ip_literal_never_reaches_the_backend() {
        let fx = fixture();
        *fx.policy.kerberos.lock().unwrap() = Some(KerberosConfig::Sso {
            principal: "alice@EXAMPLE.COM".to_string(),
        });

        let mut req = request("smb://192.168.0.10/share");
        req.use_kerberos = true;
        let result = fx.orchestrator.mount(req).await;

        assert_eq!(result.unwrap_err(), MountError::InvalidSsoUrl);
        assert!(fx.backend.mount_calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn registration_failure_rolls_back_with_the_original_save_flag() {
        let fx = fixture();
        fx.registry.fail_register.store(true, Ordering::SeqCst);

        let mut req = request("smb://server/share");
        req.username = "alice".to_string();
        req.password = "secret".to_string();
        req.save_credentials = true;
        let result = fx.orchestrator.mount(req).await;

        // The reported error is the registration failure, not a success.
        assert_eq!(result.unwrap_err(), MountError::UnknownFailure);

        // Rollback removed the password the user asked to save.
        let unmounts = fx.backend.unmount_calls.lock().unwrap();
        assert_eq!(unmounts.len(), 1);
        assert!(unmounts[0].1);

        assert!(fx.orchestrator.mounted_shares().is_empty());
    }

    #[tokio::test]
    async fn backend_failure_translates_and_leaves_no_state() {
        let fx = fixture();
        fx.backend.fail_mount.store(true, Ordering::SeqCst);

        let result = fx.orchestrator.mount(request("smb://server/share")).await;
        assert_eq!(result.unwrap_err(), MountError::AuthenticationFailed);
        assert!(fx.orchestrator.mounted_shares().is_empty());
        assert!(fx.registry.registered.lock().unwrap().is_empty());

        // The slot is free again: a retry reaches the backend.
        fx.backend.fail_mount.store(false, Ordering::SeqCst);
        assert!(fx.orchestrator.mount(request("smb://server/share")).await.is_ok());
    }

    #[tokio::test]
    async fn mount_resolves_host_and_records_most_recently_used() {
        let fx = fixture();
        let url = ShareUrl::parse("smb://fileserver/share").unwrap();
        fx.discovery.resolutions.lock().unwrap().insert(
            url.as_str().to_string(),
            ShareUrl::parse("smb://192.168.0.10/share").unwrap(),
        );

        fx.orchestrator
            .mount(request("smb://fileserver/share"))
            .await
            .unwrap();

        let calls = fx.backend.mount_calls.lock().unwrap();
        assert_eq!(calls[0].0, "smb://192.168.0.10/share");
        assert_eq!(calls[0].1.original_path, "smb://fileserver/share");
        drop(calls);

        assert_eq!(
            fx.policy.most_recent.lock().unwrap().clone(),
            Some(url)
        );
    }

    #[tokio::test]
    async fn kerberos_mount_skips_host_resolution() {
        let fx = fixture();
        *fx.policy.kerberos.lock().unwrap() = Some(KerberosConfig::ActiveDirectory {
            account_guid: "guid".to_string(),
            principal: "alice@EXAMPLE.COM".to_string(),
        });
        let url = ShareUrl::parse("smb://fileserver/share").unwrap();
        fx.discovery.resolutions.lock().unwrap().insert(
            url.as_str().to_string(),
            ShareUrl::parse("smb://192.168.0.10/share").unwrap(),
        );

        let mut req = request("smb://fileserver/share");
        req.use_kerberos = true;
        fx.orchestrator.mount(req).await.unwrap();

        let calls = fx.backend.mount_calls.lock().unwrap();
        assert_eq!(calls[0].0, "smb://fileserver/share");
        assert_eq!(calls[0].1.username, "alice");
        assert_eq!(calls[0].1.workgroup, "EXAMPLE.COM");
        assert!(!calls[0].1.save_password);
    }

    #[tokio::test]
    async fn restore_skips_corrupted_identities_and_mounts_the_rest() {
        let fx = fixture();
        let valid = identity::encode(
            &ShareUrl::parse("smb://server/share").unwrap(),
            &AuthDescriptor::UsernameWorkgroup {
                username: "alice".to_string(),
                workgroup: "CORP".to_string(),
            },
        );
        *fx.registry.persisted.lock().unwrap() = vec![
            ShareIdentity::new("garbage-without-a-tag"),
            valid.clone(),
        ];

        fx.orchestrator.restore_mounts().await;

        let mounted = fx.orchestrator.mounted_shares();
        assert_eq!(mounted.len(), 1);
        assert_eq!(mounted[0].identity, valid);

        let calls = fx.backend.mount_calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].1.skip_connect);
        assert!(calls[0].1.restore_password);
        assert_eq!(calls[0].1.username, "alice");
    }

    #[tokio::test]
    async fn restore_failure_keeps_the_persisted_identity() {
        let fx = fixture();
        fx.backend.fail_mount.store(true, Ordering::SeqCst);
        let valid = identity::encode(
            &ShareUrl::parse("smb://server/share").unwrap(),
            &AuthDescriptor::NoAuth,
        );
        *fx.registry.persisted.lock().unwrap() = vec![valid.clone()];

        fx.orchestrator.restore_mounts().await;

        assert!(fx.orchestrator.mounted_shares().is_empty());
        // No unregister call: only explicit unmount forgets a mount.
        assert!(fx.registry.unregistered.lock().unwrap().is_empty());
        assert_eq!(*fx.registry.persisted.lock().unwrap(), vec![valid]);
    }

    #[tokio::test]
    async fn restore_with_nothing_to_do_skips_discovery() {
        let fx = fixture();
        fx.orchestrator.restore_mounts().await;
        assert_eq!(fx.discovery.discover_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn premounts_register_non_persistent_with_empty_credentials() {
        let fx = fixture();
        *fx.policy.preconfigured.lock().unwrap() = vec![PreconfiguredShare {
            share_url: "smb://server/auto".to_string(),
            mode: ShareMode::PreMount,
        }];

        fx.orchestrator.restore_mounts().await;

        let calls = fx.backend.mount_calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].1.username.is_empty());
        assert!(calls[0].1.skip_connect);
        drop(calls);

        let registered = fx.registry.registered.lock().unwrap();
        assert_eq!(registered.len(), 1);
        assert!(!registered[0].persistent);
    }

    #[tokio::test(start_paused = true)]
    async fn share_path_updates_throttle_discovery_to_the_cooldown() {
        let fx = fixture();
        let url = ShareUrl::parse("smb://fileserver/share").unwrap();
        fx.discovery
            .resolutions
            .lock()
            .unwrap()
            .insert(url.as_str().to_string(), url.clone());
        let mount_id = MountId::new("1");

        for _ in 0..2 {
            let (tx, rx) = oneshot::channel();
            fx.orchestrator
                .request_updated_share_path(&url, &mount_id, tx)
                .await;
            assert_eq!(rx.await, Ok(true));
        }
        // Two calls inside one window: a single discovery pass.
        assert_eq!(fx.discovery.discover_calls.load(Ordering::SeqCst), 1);

        tokio::time::advance(HOST_DISCOVERY_COOLDOWN + Duration::from_secs(1)).await;
        let (tx, rx) = oneshot::channel();
        fx.orchestrator
            .request_updated_share_path(&url, &mount_id, tx)
            .await;
        assert_eq!(rx.await, Ok(true));
        assert_eq!(fx.discovery.discover_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn unresolvable_share_path_reports_no_retry() {
        let fx = fixture();
        let url = ShareUrl::parse("smb://unknown/share").unwrap();
        let (tx, rx) = oneshot::channel();
        fx.orchestrator
            .request_updated_share_path(&url, &MountId::new("1"), tx)
            .await;
        assert_eq!(rx.await, Ok(false));
        assert!(fx.backend.update_path_calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn unmount_removes_the_entry_even_when_the_backend_fails() {
        let fx = fixture();
        let share = fx
            .orchestrator
            .mount(request("smb://server/share"))
            .await
            .unwrap();

        fx.backend.fail_unmount.store(true, Ordering::SeqCst);
        let result = fx
            .orchestrator
            .unmount(&share.identity, UnmountReason::User)
            .await;

        assert!(result.is_ok());
        assert!(fx.orchestrator.mounted_shares().is_empty());
        assert_eq!(
            *fx.registry.unregistered.lock().unwrap(),
            vec![share.identity.clone()]
        );

        // The share can be mounted again afterwards.
        assert!(fx.orchestrator.mount(request("smb://server/share")).await.is_ok());
    }

    #[tokio::test]
    async fn unmount_by_mount_id_resolves_the_identity() {
        let fx = fixture();
        let share = fx
            .orchestrator
            .mount(request("smb://server/share"))
            .await
            .unwrap();

        fx.orchestrator
            .unmount_by_mount_id(&share.mount_id, UnmountReason::Shutdown)
            .await
            .unwrap();
        assert!(fx.orchestrator.mounted_shares().is_empty());

        // Shutdown unmounts keep the saved password for the next restore.
        let unmounts = fx.backend.unmount_calls.lock().unwrap();
        assert_eq!(unmounts.last(), Some(&(share.mount_id.clone(), false)));

        assert!(
            fx.orchestrator
                .unmount_by_mount_id(&MountId::new("missing"), UnmountReason::User)
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn user_unmount_removes_the_saved_password() {
        let fx = fixture();
        let share = fx
            .orchestrator
            .mount(request("smb://server/share"))
            .await
            .unwrap();

        fx.orchestrator
            .unmount(&share.identity, UnmountReason::User)
            .await
            .unwrap();
        let unmounts = fx.backend.unmount_calls.lock().unwrap();
        assert_eq!(unmounts.last(), Some(&(share.mount_id.clone(), true)));
    }

    #[tokio::test]
    async fn credential_flow_settles_the_parked_reply() {
        let fx = fixture();
        let url = ShareUrl::parse("smb://server/share").unwrap();
        let mount_id = MountId::new("5");

        let rx = fx
            .orchestrator
            .request_credentials(&url, &mount_id)
            .await
            .unwrap();
        assert_eq!(fx.prompt.shown.lock().unwrap().len(), 1);

        fx.orchestrator
            .update_credentials(&mount_id, "corp\\alice", "secret")
            .await;
        assert!(rx.await.is_ok());

        let calls = fx.backend.credential_calls.lock().unwrap();
        assert_eq!(calls[0].1, "CORP");
        assert_eq!(calls[0].2, "alice");
    }

    #[tokio::test]
    async fn failed_credential_update_drops_the_reply() {
        let fx = fixture();
        fx.backend.fail_credentials.store(true, Ordering::SeqCst);
        let url = ShareUrl::parse("smb://server/share").unwrap();
        let mount_id = MountId::new("5");

        let rx = fx
            .orchestrator
            .request_credentials(&url, &mount_id)
            .await
            .unwrap();
        fx.orchestrator
            .update_credentials(&mount_id, "alice", "bad")
            .await;
        assert!(rx.await.is_err());
    }

    #[tokio::test]
    async fn gather_shares_lists_dropdown_and_unknown_modes_before_discovery() {
        let fx = fixture();
        *fx.policy.preconfigured.lock().unwrap() = vec![
            PreconfiguredShare {
                share_url: "smb://server/visible".to_string(),
                mode: ShareMode::DropDown,
            },
            PreconfiguredShare {
                share_url: "smb://server/next".to_string(),
                mode: ShareMode::Unknown,
            },
            PreconfiguredShare {
                share_url: "smb://server/auto".to_string(),
                mode: ShareMode::PreMount,
            },
        ];

        let mut rx = fx.orchestrator.gather_shares().await;

        let first = rx.recv().await.unwrap();
        assert!(!first.done);
        assert_eq!(
            first.shares,
            vec![
                ShareUrl::parse("smb://server/visible").unwrap(),
                ShareUrl::parse("smb://server/next").unwrap(),
            ]
        );

        let last = rx.recv().await.unwrap();
        assert!(last.done);
        assert_eq!(
            last.shares,
            vec![ShareUrl::parse("smb://found/share").unwrap()]
        );
        assert!(rx.recv().await.is_none());
    }
}
