// SPDX-License-Identifier: GPL-3.0-only

use zbus::interface;

/// Main sharemount service interface
pub struct SharemountService {
    version: String,
}

impl SharemountService {
    pub fn new() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

#[interface(name = "org.sharemount.Service")]
impl SharemountService {
    /// Get service version
    #[zbus(property)]
    async fn version(&self) -> &str {
        &self.version
    }

    /// Get list of supported features
    #[zbus(property)]
    async fn supported_features(&self) -> Vec<String> {
        vec![
            "mounts".to_string(),
            "discovery".to_string(),
            "kerberos".to_string(),
        ]
    }
}
