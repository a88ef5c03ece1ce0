// SPDX-License-Identifier: GPL-3.0-only

use std::sync::Arc;

use anyhow::{Context, Result};
use zbus::Connection;

use sharemount_contracts::{
    CredentialsPrompt, MountBackend, MountPointRegistry, ShareDiscovery, SharePolicy,
};
use sharemount_types::BackendKind;

use crate::adapters::{DialogClient, DiscoveryClient, FilePolicyStore, VfsRegistryClient};
use crate::backends::{FuseBackend, ProviderBackend};
use crate::config::ServiceConfig;

/// Fixed collaborator wiring, built once at startup. A missing required
/// collaborator fails service start rather than surfacing later as a broken
/// mount flow.
pub struct CollaboratorRegistry {
    backend_kind: BackendKind,
    backend: Arc<dyn MountBackend>,
    discovery: Arc<dyn ShareDiscovery>,
    registry: Arc<dyn MountPointRegistry>,
    prompt: Arc<dyn CredentialsPrompt>,
    policy: Arc<dyn SharePolicy>,
}

impl CollaboratorRegistry {
    pub async fn build(config: &ServiceConfig, connection: &Connection) -> Result<Self> {
        let backend: Arc<dyn MountBackend> = match config.backend {
            BackendKind::Provider => Arc::new(
                ProviderBackend::new(connection)
                    .await
                    .context("connecting to provider mount daemon")?,
            ),
            BackendKind::Fuse => Arc::new(
                FuseBackend::new(connection)
                    .await
                    .context("connecting to FUSE mount daemon")?,
            ),
        };

        let discovery = Arc::new(
            DiscoveryClient::new(connection)
                .await
                .context("connecting to discovery daemon")?,
        );
        let registry = Arc::new(
            VfsRegistryClient::new(connection)
                .await
                .context("connecting to VFS registry")?,
        );
        let prompt = Arc::new(
            DialogClient::new(connection)
                .await
                .context("connecting to credentials dialog")?,
        );
        let policy = Arc::new(FilePolicyStore::new(
            &config.policy_path,
            &config.most_recently_used_path,
        ));

        Ok(Self {
            backend_kind: config.backend,
            backend,
            discovery,
            registry,
            prompt,
            policy,
        })
    }

    pub fn backend_kind(&self) -> BackendKind {
        self.backend_kind
    }

    pub fn backend(&self) -> Arc<dyn MountBackend> {
        self.backend.clone()
    }

    pub fn discovery(&self) -> Arc<dyn ShareDiscovery> {
        self.discovery.clone()
    }

    pub fn registry(&self) -> Arc<dyn MountPointRegistry> {
        self.registry.clone()
    }

    pub fn prompt(&self) -> Arc<dyn CredentialsPrompt> {
        self.prompt.clone()
    }

    pub fn policy(&self) -> Arc<dyn SharePolicy> {
        self.policy.clone()
    }
}
