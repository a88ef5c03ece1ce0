// SPDX-License-Identifier: GPL-3.0-only

//! Service configuration
//!
//! A small TOML document selects the mount backend and points at the policy
//! and preference files. A missing config file means defaults; a malformed
//! one is a startup error.

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;

use sharemount_types::BackendKind;

pub const DEFAULT_CONFIG_PATH: &str = "/etc/sharemount/config.toml";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Which mount backend daemon carries new mounts.
    pub backend: BackendKind,
    /// JSON policy document with preconfigured shares and auth gates.
    pub policy_path: PathBuf,
    /// Where the most-recently-used share URL is recorded.
    pub most_recently_used_path: PathBuf,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::Provider,
            policy_path: PathBuf::from("/etc/sharemount/policy.json"),
            most_recently_used_path: PathBuf::from("/var/lib/sharemount/most_recent_share"),
        }
    }
}

impl ServiceConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("No config at {path:?}, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(e).with_context(|| format!("reading config {path:?}")),
        };
        toml::from_str(&raw).with_context(|| format!("parsing config {path:?}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_select_the_provider_backend() {
        let config = ServiceConfig::default();
        assert_eq!(config.backend, BackendKind::Provider);
    }

    #[test]
    fn config_document_parses() {
        let config: ServiceConfig = toml::from_str(
            r#"
            backend = "fuse"
            policy_path = "/tmp/policy.json"
            "#,
        )
        .unwrap();
        assert_eq!(config.backend, BackendKind::Fuse);
        assert_eq!(config.policy_path, PathBuf::from("/tmp/policy.json"));
        // Unset fields keep their defaults.
        assert_eq!(
            config.most_recently_used_path,
            ServiceConfig::default().most_recently_used_path
        );
    }

    #[test]
    fn unknown_backend_is_rejected() {
        assert!(toml::from_str::<ServiceConfig>("backend = \"nfs\"").is_err());
    }
}
