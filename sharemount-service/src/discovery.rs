// SPDX-License-Identifier: GPL-3.0-only

//! Host discovery throttling
//!
//! A full network discovery pass is expensive (it walks every configured
//! transport), so the scheduler allows at most one per cooldown window and
//! serves the resolution cache in between.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::time::Instant;

use sharemount_contracts::{DiscoveryError, ShareDiscovery};
use sharemount_types::ShareUrl;

/// Minimum gap between two full discovery passes.
pub const HOST_DISCOVERY_COOLDOWN: Duration = Duration::from_secs(60);

pub struct DiscoveryScheduler {
    service: Arc<dyn ShareDiscovery>,
    last_run: Mutex<Option<Instant>>,
}

impl DiscoveryScheduler {
    pub fn new(service: Arc<dyn ShareDiscovery>) -> Self {
        Self {
            service,
            last_run: Mutex::new(None),
        }
    }

    pub fn service(&self) -> Arc<dyn ShareDiscovery> {
        self.service.clone()
    }

    /// Whether a new discovery pass is warranted. Reads the throttle state
    /// without mutating it.
    pub fn should_run_discovery(&self) -> bool {
        self.last_run
            .lock()
            .unwrap()
            .is_none_or(|last| last.elapsed() > HOST_DISCOVERY_COOLDOWN)
    }

    /// Run one discovery pass.
    ///
    /// The timestamp is recorded *before* the call is issued, so overlapping
    /// callers inside one cooldown window never trigger a second pass while
    /// the first is still outstanding.
    pub async fn run_discovery(&self) -> Result<(), DiscoveryError> {
        *self.last_run.lock().unwrap() = Some(Instant::now());
        self.service.discover_hosts().await
    }

    /// Cache-only resolution; never blocks, never touches the network.
    pub async fn try_resolve_cached(&self, url: &ShareUrl) -> Option<ShareUrl> {
        self.service.try_resolve(url).await
    }

    /// The resolved URL when the cache knows the host, otherwise the
    /// original. Kerberos callers skip this entirely.
    pub async fn resolve_or_original(&self, url: &ShareUrl) -> ShareUrl {
        self.service
            .try_resolve(url)
            .await
            .unwrap_or_else(|| url.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use tokio::sync::{Notify, mpsc};

    use sharemount_contracts::HostLocatorKind;

    #[derive(Default)]
    struct RecordingDiscovery {
        calls: AtomicUsize,
        gate: Option<Arc<Notify>>,
    }

    #[async_trait]
    impl ShareDiscovery for RecordingDiscovery {
        async fn discover_hosts(&self) -> Result<(), DiscoveryError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            Ok(())
        }

        async fn gather_shares(
            &self,
            _shares: mpsc::Sender<Vec<ShareUrl>>,
        ) -> Result<(), DiscoveryError> {
            Ok(())
        }

        async fn try_resolve(&self, _url: &ShareUrl) -> Option<ShareUrl> {
            None
        }

        async fn register_host_locator(
            &self,
            _locator: HostLocatorKind,
        ) -> Result<(), DiscoveryError> {
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn cooldown_gates_repeat_discovery() {
        let scheduler = DiscoveryScheduler::new(Arc::new(RecordingDiscovery::default()));

        assert!(scheduler.should_run_discovery());
        scheduler.run_discovery().await.unwrap();
        assert!(!scheduler.should_run_discovery());

        tokio::time::advance(HOST_DISCOVERY_COOLDOWN).await;
        assert!(!scheduler.should_run_discovery());

        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(scheduler.should_run_discovery());
    }

    #[tokio::test(start_paused = true)]
    async fn timestamp_is_recorded_before_the_call_completes() {
        let gate = Arc::new(Notify::new());
        let discovery = Arc::new(RecordingDiscovery {
            calls: AtomicUsize::new(0),
            gate: Some(gate.clone()),
        });
        let scheduler = Arc::new(DiscoveryScheduler::new(
            discovery.clone() as Arc<dyn ShareDiscovery>
        ));

        let running = tokio::spawn({
            let scheduler = scheduler.clone();
            async move { scheduler.run_discovery().await }
        });
        tokio::task::yield_now().await;

        // The first pass is still outstanding; an overlapping caller must not
        // see a stale window.
        assert_eq!(discovery.calls.load(Ordering::SeqCst), 1);
        assert!(!scheduler.should_run_discovery());

        gate.notify_one();
        running.await.unwrap().unwrap();
        assert_eq!(discovery.calls.load(Ordering::SeqCst), 1);
    }
}
