//! Authentication descriptors and username parsing

use serde::{Deserialize, Serialize};

/// How a mounted share authenticates against the server.
///
/// The descriptor is part of the persisted share identity, so restore-time
/// behavior can differ by mode (Kerberos mounts never resolve hostnames, saved
/// usernames are replayed to the backend).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "mode")]
pub enum AuthDescriptor {
    /// Guest/anonymous access, nothing saved.
    NoAuth,
    /// User-entered credentials; the workgroup may be empty.
    UsernameWorkgroup { username: String, workgroup: String },
    /// Device-identity Kerberos (domain-joined machine account).
    KerberosDomain,
    /// Single-sign-on Kerberos using the signed-in account's ticket.
    KerberosSso { username: String, domain: String },
}

impl AuthDescriptor {
    /// Kerberos descriptors re-derive the principal at remount time and never
    /// resolve the host (tickets are keyed on the hostname).
    pub fn is_kerberos(&self) -> bool {
        matches!(
            self,
            AuthDescriptor::KerberosDomain | AuthDescriptor::KerberosSso { .. }
        )
    }
}

/// Kerberos deployment selected by policy at service construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum KerberosConfig {
    Disabled,
    /// Domain-joined device; the backend obtains tickets for the account
    /// identified by its directory GUID. `principal` is the signed-in user's
    /// `user@REALM`, used to derive the mount username.
    ActiveDirectory {
        account_guid: String,
        principal: String,
    },
    /// Ticket for the signed-in user's principal (`user@REALM`).
    Sso { principal: String },
}

impl KerberosConfig {
    pub fn is_enabled(&self) -> bool {
        !matches!(self, KerberosConfig::Disabled)
    }

    /// The account identifier handed to the backend's Kerberos setup call.
    pub fn account_identifier(&self) -> Option<&str> {
        match self {
            KerberosConfig::Disabled => None,
            KerberosConfig::ActiveDirectory { account_guid, .. } => Some(account_guid),
            KerberosConfig::Sso { principal } => Some(principal),
        }
    }

    /// The `user@REALM` principal the mount username derives from.
    pub fn principal(&self) -> Option<&str> {
        match self {
            KerberosConfig::Disabled => None,
            KerberosConfig::ActiveDirectory { principal, .. }
            | KerberosConfig::Sso { principal } => Some(principal),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsedUserName {
    pub username: String,
    pub workgroup: String,
}

/// Split a user-entered name into account and workgroup.
///
/// Accepts `user`, `user@domain` and `DOMAIN\user`. The domain part of the
/// `@` form is uppercased, matching how workgroups are spelled on the wire.
pub fn parse_user_name(input: &str) -> ParsedUserName {
    if let Some((workgroup, username)) = input.split_once('\\') {
        return ParsedUserName {
            username: username.to_string(),
            workgroup: workgroup.to_ascii_uppercase(),
        };
    }
    if let Some((username, domain)) = input.rsplit_once('@') {
        return ParsedUserName {
            username: username.to_string(),
            workgroup: domain.to_ascii_uppercase(),
        };
    }
    ParsedUserName {
        username: input.to_string(),
        workgroup: String::new(),
    }
}

/// Split a Kerberos principal (`user@REALM`) into account and realm.
/// Returns `None` when the input is not a well-formed principal.
pub fn parse_user_principal_name(input: &str) -> Option<ParsedUserName> {
    let (username, realm) = input.rsplit_once('@')?;
    if username.is_empty() || realm.is_empty() || username.contains('@') {
        return None;
    }
    Some(ParsedUserName {
        username: username.to_string(),
        workgroup: realm.to_ascii_uppercase(),
    })
}
