// SPDX-License-Identifier: GPL-3.0-only

use async_trait::async_trait;

use sharemount_types::{KerberosConfig, PreconfiguredShare, ShareUrl};

/// Preference and policy storage.
///
/// Reads are snapshots: the preconfigured list is immutable per refresh and
/// re-read rather than mutated.
#[async_trait]
pub trait SharePolicy: Send + Sync {
    async fn preconfigured_shares(&self) -> Vec<PreconfiguredShare>;

    async fn ntlm_enabled(&self) -> bool;

    async fn netbios_discovery_enabled(&self) -> bool;

    async fn kerberos_config(&self) -> KerberosConfig;

    /// Obfuscated per-profile identifier the backend scopes saved passwords
    /// to.
    async fn account_hash(&self) -> String;

    /// Record the last share URL a user mounted. Best effort, UI convenience
    /// only.
    async fn set_most_recently_used(&self, url: &ShareUrl);
}
