// SPDX-License-Identifier: GPL-3.0-only

//! File-backed policy and preference store
//!
//! Policy is a JSON document pushed by management tooling. Every read takes a
//! fresh snapshot so a policy refresh needs no coordination with the service;
//! an unreadable document degrades to the defaults rather than failing the
//! operation that asked.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Deserialize;

use sharemount_contracts::SharePolicy;
use sharemount_types::{KerberosConfig, PreconfiguredShare, ShareUrl};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct PolicyFile {
    preconfigured_shares: Vec<PreconfiguredShare>,
    ntlm_enabled: bool,
    netbios_discovery_enabled: bool,
    kerberos: KerberosConfig,
    account_hash: String,
}

impl Default for PolicyFile {
    fn default() -> Self {
        Self {
            preconfigured_shares: Vec::new(),
            ntlm_enabled: true,
            netbios_discovery_enabled: true,
            kerberos: KerberosConfig::Disabled,
            account_hash: String::new(),
        }
    }
}

pub struct FilePolicyStore {
    policy_path: PathBuf,
    most_recently_used_path: PathBuf,
}

impl FilePolicyStore {
    pub fn new(policy_path: &Path, most_recently_used_path: &Path) -> Self {
        Self {
            policy_path: policy_path.to_path_buf(),
            most_recently_used_path: most_recently_used_path.to_path_buf(),
        }
    }

    async fn snapshot(&self) -> PolicyFile {
        let raw = match tokio::fs::read_to_string(&self.policy_path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return PolicyFile::default(),
            Err(e) => {
                tracing::warn!("Failed to read policy {:?}: {e}", self.policy_path);
                return PolicyFile::default();
            }
        };
        match serde_json::from_str(&raw) {
            Ok(policy) => policy,
            Err(e) => {
                tracing::warn!("Failed to parse policy {:?}: {e}", self.policy_path);
                PolicyFile::default()
            }
        }
    }
}

#[async_trait]
impl SharePolicy for FilePolicyStore {
    async fn preconfigured_shares(&self) -> Vec<PreconfiguredShare> {
        self.snapshot().await.preconfigured_shares
    }

    async fn ntlm_enabled(&self) -> bool {
        self.snapshot().await.ntlm_enabled
    }

    async fn netbios_discovery_enabled(&self) -> bool {
        self.snapshot().await.netbios_discovery_enabled
    }

    async fn kerberos_config(&self) -> KerberosConfig {
        self.snapshot().await.kerberos
    }

    async fn account_hash(&self) -> String {
        self.snapshot().await.account_hash
    }

    async fn set_most_recently_used(&self, url: &ShareUrl) {
        if let Err(e) = tokio::fs::write(&self.most_recently_used_path, url.as_str()).await {
            tracing::warn!("Failed to record most recently used share: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicU32, Ordering};

    use sharemount_types::ShareMode;

    static NEXT_FILE: AtomicU32 = AtomicU32::new(0);

    fn temp_path(tag: &str) -> PathBuf {
        let n = NEXT_FILE.fetch_add(1, Ordering::SeqCst);
        std::env::temp_dir().join(format!(
            "sharemount-policy-test-{}-{tag}-{n}",
            std::process::id()
        ))
    }

    #[tokio::test]
    async fn missing_policy_file_yields_defaults() {
        let store = FilePolicyStore::new(&temp_path("missing"), &temp_path("mru"));
        assert!(store.preconfigured_shares().await.is_empty());
        assert!(store.ntlm_enabled().await);
        assert!(store.netbios_discovery_enabled().await);
        assert_eq!(store.kerberos_config().await, KerberosConfig::Disabled);
    }

    #[tokio::test]
    async fn policy_document_parses_into_a_snapshot() {
        let path = temp_path("doc");
        tokio::fs::write(
            &path,
            r#"{
                "preconfigured_shares": [
                    {"share_url": "smb://server/share", "mode": "pre_mount"}
                ],
                "ntlm_enabled": false,
                "kerberos": {"kind": "sso", "principal": "alice@EXAMPLE.COM"}
            }"#,
        )
        .await
        .unwrap();
        let store = FilePolicyStore::new(&path, &temp_path("mru"));

        let shares = store.preconfigured_shares().await;
        assert_eq!(shares.len(), 1);
        assert_eq!(shares[0].mode, ShareMode::PreMount);
        assert!(!store.ntlm_enabled().await);
        assert!(store.netbios_discovery_enabled().await);
        assert_eq!(
            store.kerberos_config().await,
            KerberosConfig::Sso {
                principal: "alice@EXAMPLE.COM".to_string()
            }
        );

        tokio::fs::remove_file(&path).await.unwrap();
    }

    #[tokio::test]
    async fn unparseable_policy_degrades_to_defaults() {
        let path = temp_path("bad");
        tokio::fs::write(&path, "{not json").await.unwrap();
        let store = FilePolicyStore::new(&path, &temp_path("mru"));
        assert!(store.preconfigured_shares().await.is_empty());
        assert!(store.ntlm_enabled().await);
        tokio::fs::remove_file(&path).await.unwrap();
    }

    #[tokio::test]
    async fn most_recently_used_share_is_persisted() {
        let mru = temp_path("write");
        let store = FilePolicyStore::new(&temp_path("missing"), &mru);
        let url = ShareUrl::parse("smb://server/share").unwrap();
        store.set_most_recently_used(&url).await;
        let written = tokio::fs::read_to_string(&mru).await.unwrap();
        assert_eq!(written, "smb://server/share");
        tokio::fs::remove_file(&mru).await.unwrap();
    }
}
