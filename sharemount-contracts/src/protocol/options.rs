// SPDX-License-Identifier: GPL-3.0-only

use serde::{Deserialize, Serialize};

/// Options accompanying a backend mount call.
///
/// Serialized as JSON for D-Bus transport. The password never travels inside
/// this structure; it is a separate call argument so that options can be
/// logged safely.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendMountOptions {
    /// The share URL exactly as the user entered it, before host resolution.
    pub original_path: String,
    pub username: String,
    pub workgroup: String,
    /// Whether NTLM authentication may be attempted. Policy-controlled.
    pub ntlm_enabled: bool,
    /// Ask the daemon to persist the password for later restores.
    pub save_password: bool,
    /// Obfuscated per-profile identifier the daemon scopes saved state to.
    pub account_hash: String,
    /// Mount without contacting the server; the connection is established on
    /// first operation. Used for restores and premounts.
    pub skip_connect: bool,
    /// Ask the daemon to reuse a previously saved password for this share.
    pub restore_password: bool,
}
