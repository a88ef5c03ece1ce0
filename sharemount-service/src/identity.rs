// SPDX-License-Identifier: GPL-3.0-only

//! Share identity codec
//!
//! A [`ShareIdentity`] is the persisted, restart-stable key of a mount. It
//! encodes the normalized share URL and the authentication mode (plus the
//! saved username where one exists) so that a mount can be reconstructed
//! without any other state. The string is the de facto on-disk format:
//! grammar changes must be additive only.
//!
//! Grammar: `<share-url>@@<auth-tag>` where the tag is one of
//!
//! - `anon`: no saved credentials
//! - `user=<name>` / `user=<name>@<workgroup>`: saved username
//! - `krb5`: device-identity (domain) Kerberos
//! - `sso=<name>@<domain>`: single-sign-on Kerberos
//!
//! The delimiter splits on the *last* `@@`, and usernames are parsed before
//! encoding, so neither the URL path nor the name can smuggle a second
//! delimiter past `decode`.

use thiserror::Error;

use sharemount_types::{AuthDescriptor, ShareIdentity, ShareUrl};

const DELIMITER: &str = "@@";
const TAG_ANON: &str = "anon";
const TAG_KERBEROS: &str = "krb5";
const TAG_USER_PREFIX: &str = "user=";
const TAG_SSO_PREFIX: &str = "sso=";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed share identity: {0}")]
pub struct MalformedIdentity(pub String);

/// Build the persisted identity for a share and its authentication mode.
///
/// Deterministic, and collision-free for distinct `(url, auth)` pairs: two
/// different auth modes over the same path always produce different tags.
pub fn encode(url: &ShareUrl, auth: &AuthDescriptor) -> ShareIdentity {
    let tag = match auth {
        AuthDescriptor::NoAuth => TAG_ANON.to_string(),
        AuthDescriptor::UsernameWorkgroup {
            username,
            workgroup,
        } => {
            if workgroup.is_empty() {
                format!("{TAG_USER_PREFIX}{username}")
            } else {
                format!("{TAG_USER_PREFIX}{username}@{workgroup}")
            }
        }
        AuthDescriptor::KerberosDomain => TAG_KERBEROS.to_string(),
        AuthDescriptor::KerberosSso { username, domain } => {
            format!("{TAG_SSO_PREFIX}{username}@{domain}")
        }
    };
    ShareIdentity::new(format!("{}{DELIMITER}{tag}", url.as_str()))
}

/// Parse a persisted identity back into its share URL and auth descriptor.
///
/// Fails with [`MalformedIdentity`] when the grammar does not match; restore
/// reports the failure and skips the entry, it never aborts the batch.
pub fn decode(identity: &ShareIdentity) -> Result<(ShareUrl, AuthDescriptor), MalformedIdentity> {
    let raw = identity.as_str();
    let (url_part, tag) = raw
        .rsplit_once(DELIMITER)
        .ok_or_else(|| MalformedIdentity(format!("missing auth tag: {raw}")))?;

    let url = ShareUrl::parse(url_part)
        .map_err(|e| MalformedIdentity(format!("bad share url in identity: {e}")))?;

    let auth = if tag == TAG_ANON {
        AuthDescriptor::NoAuth
    } else if tag == TAG_KERBEROS {
        AuthDescriptor::KerberosDomain
    } else if let Some(user) = tag.strip_prefix(TAG_USER_PREFIX) {
        match user.rsplit_once('@') {
            Some((username, workgroup)) => AuthDescriptor::UsernameWorkgroup {
                username: username.to_string(),
                workgroup: workgroup.to_string(),
            },
            None => AuthDescriptor::UsernameWorkgroup {
                username: user.to_string(),
                workgroup: String::new(),
            },
        }
    } else if let Some(principal) = tag.strip_prefix(TAG_SSO_PREFIX) {
        let (username, domain) = principal
            .rsplit_once('@')
            .ok_or_else(|| MalformedIdentity(format!("bad sso principal: {principal}")))?;
        if username.is_empty() || domain.is_empty() {
            return Err(MalformedIdentity(format!("bad sso principal: {principal}")));
        }
        AuthDescriptor::KerberosSso {
            username: username.to_string(),
            domain: domain.to_string(),
        }
    } else {
        return Err(MalformedIdentity(format!("unknown auth tag: {tag}")));
    };

    Ok((url, auth))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> ShareUrl {
        ShareUrl::parse(s).unwrap()
    }

    #[test]
    fn round_trips_every_auth_descriptor() {
        let cases = [
            AuthDescriptor::NoAuth,
            AuthDescriptor::UsernameWorkgroup {
                username: "alice".into(),
                workgroup: String::new(),
            },
            AuthDescriptor::UsernameWorkgroup {
                username: "alice".into(),
                workgroup: "CORP".into(),
            },
            AuthDescriptor::UsernameWorkgroup {
                username: String::new(),
                workgroup: String::new(),
            },
            AuthDescriptor::KerberosDomain,
            AuthDescriptor::KerberosSso {
                username: "alice".into(),
                domain: "EXAMPLE.COM".into(),
            },
        ];
        let share = url("smb://server/share/sub");
        for auth in cases {
            let identity = encode(&share, &auth);
            let (decoded_url, decoded_auth) = decode(&identity).expect("decode");
            assert_eq!(decoded_url, share);
            assert_eq!(decoded_auth, auth);
        }
    }

    #[test]
    fn distinct_auth_modes_never_collide() {
        let share = url("smb://server/share");
        let identities = [
            encode(&share, &AuthDescriptor::NoAuth),
            encode(&share, &AuthDescriptor::KerberosDomain),
            encode(
                &share,
                &AuthDescriptor::KerberosSso {
                    username: "alice".into(),
                    domain: "EXAMPLE.COM".into(),
                },
            ),
            encode(
                &share,
                &AuthDescriptor::UsernameWorkgroup {
                    username: "alice".into(),
                    workgroup: "CORP".into(),
                },
            ),
        ];
        for (i, a) in identities.iter().enumerate() {
            for b in identities.iter().skip(i + 1) {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn path_containing_delimiter_still_decodes() {
        let share = url("smb://server/odd@@name");
        let identity = encode(&share, &AuthDescriptor::KerberosDomain);
        let (decoded_url, decoded_auth) = decode(&identity).unwrap();
        assert_eq!(decoded_url, share);
        assert_eq!(decoded_auth, AuthDescriptor::KerberosDomain);
    }

    #[test]
    fn corrupted_strings_return_malformed_identity() {
        for raw in [
            "",
            "smb://server/share",
            "smb://server/share@@",
            "smb://server/share@@wat",
            "smb://server/share@@sso=noat",
            "smb://server/share@@sso=@",
            "http://server/share@@anon",
            "@@anon",
        ] {
            assert!(
                decode(&ShareIdentity::new(raw)).is_err(),
                "expected decode failure for {raw:?}"
            );
        }
    }
}
