//! Validated SMB share locations
//!
//! A [`ShareUrl`] is the canonical `(scheme, host, share)` triple used across
//! the stack. Both `smb://server/share` and UNC `\\server\share` spellings are
//! accepted; the normalized `smb://` form is the identity used for equality,
//! hashing, and persistence.

use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

const SMB_SCHEME: &str = "smb";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShareUrlError {
    #[error("share location is empty")]
    Empty,

    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),

    #[error("share location has no host")]
    MissingHost,

    #[error("credentials are not allowed inside a share location")]
    CredentialsInUrl,

    #[error("malformed share location: {0}")]
    Malformed(String),
}

/// A validated network share location.
///
/// Construction never panics: all validation happens in [`ShareUrl::parse`]
/// and the caller decides what to do with an invalid input. Whether the share
/// component is present is a separate query ([`ShareUrl::has_share`]) because
/// `smb://server` is a well-formed host reference that simply cannot be
/// mounted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ShareUrl {
    normalized: String,
    host: String,
    share: String,
}

impl ShareUrl {
    /// Parse and normalize a share location.
    ///
    /// UNC input (`\\server\share\sub`) is rewritten to the `smb://` form
    /// before parsing. The host is lowercased; trailing slashes are dropped.
    pub fn parse(input: &str) -> Result<Self, ShareUrlError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(ShareUrlError::Empty);
        }

        let candidate = if let Some(unc) = trimmed.strip_prefix(r"\\") {
            format!("{SMB_SCHEME}://{}", unc.replace('\\', "/"))
        } else {
            trimmed.to_string()
        };

        let url =
            Url::parse(&candidate).map_err(|e| ShareUrlError::Malformed(e.to_string()))?;

        if url.scheme() != SMB_SCHEME {
            return Err(ShareUrlError::UnsupportedScheme(url.scheme().to_string()));
        }
        if !url.username().is_empty() || url.password().is_some() {
            return Err(ShareUrlError::CredentialsInUrl);
        }

        let host = url
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or(ShareUrlError::MissingHost)?
            .to_ascii_lowercase();

        let segments: Vec<&str> = url
            .path()
            .split('/')
            .filter(|s| !s.is_empty())
            .collect();
        let share = segments.first().copied().unwrap_or("").to_string();

        let mut normalized = format!("{SMB_SCHEME}://{host}");
        if let Some(port) = url.port() {
            normalized.push_str(&format!(":{port}"));
        }
        for segment in &segments {
            normalized.push('/');
            normalized.push_str(segment);
        }

        Ok(Self {
            normalized,
            host,
            share,
        })
    }

    /// The normalized `smb://` form. Two equal `ShareUrl`s always render the
    /// same string, and vice versa.
    pub fn as_str(&self) -> &str {
        &self.normalized
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// The first path segment (the share name). Empty for bare host
    /// references.
    pub fn share(&self) -> &str {
        &self.share
    }

    pub fn has_share(&self) -> bool {
        !self.share.is_empty()
    }

    /// True when the host is a literal IPv4/IPv6 address rather than a name.
    /// Kerberos tickets are keyed on hostnames, so SSO mounts reject these.
    pub fn host_is_ip_address(&self) -> bool {
        let bare = self
            .host
            .strip_prefix('[')
            .and_then(|h| h.strip_suffix(']'))
            .unwrap_or(&self.host);
        bare.parse::<IpAddr>().is_ok()
    }

    /// Last path segment, used as a default display name for mounts.
    pub fn display_name(&self) -> &str {
        self.normalized
            .rsplit('/')
            .next()
            .unwrap_or(&self.host)
    }

    /// Replace the host while keeping the share path, e.g. substituting a
    /// resolved address for a discovered hostname.
    pub fn with_host(&self, host: &str) -> Result<Self, ShareUrlError> {
        let rest = self
            .normalized
            .strip_prefix(&format!("{SMB_SCHEME}://{}", self.host))
            .unwrap_or("");
        Self::parse(&format!("{SMB_SCHEME}://{host}{rest}"))
    }
}

impl fmt::Display for ShareUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.normalized)
    }
}

impl FromStr for ShareUrl {
    type Err = ShareUrlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ShareUrl {
    type Error = ShareUrlError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ShareUrl> for String {
    fn from(value: ShareUrl) -> Self {
        value.normalized
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_smb_form() {
        let url = ShareUrl::parse("smb://server/share").unwrap();
        assert_eq!(url.as_str(), "smb://server/share");
        assert_eq!(url.host(), "server");
        assert_eq!(url.share(), "share");
        assert!(url.has_share());
    }

    #[test]
    fn unc_form_normalizes_to_smb_form() {
        let unc = ShareUrl::parse(r"\\Server\Share\sub").unwrap();
        let smb = ShareUrl::parse("smb://server/Share/sub").unwrap();
        assert_eq!(unc, smb);
        assert_eq!(unc.as_str(), "smb://server/Share/sub");
    }

    #[test]
    fn host_is_lowercased_but_share_case_is_kept() {
        let url = ShareUrl::parse("smb://FILESERVER/Public").unwrap();
        assert_eq!(url.host(), "fileserver");
        assert_eq!(url.share(), "Public");
    }

    #[test]
    fn bare_host_has_no_share() {
        let url = ShareUrl::parse("smb://server").unwrap();
        assert!(!url.has_share());
        assert_eq!(url.share(), "");
    }

    #[test]
    fn trailing_slash_is_dropped() {
        let a = ShareUrl::parse("smb://server/share/").unwrap();
        let b = ShareUrl::parse("smb://server/share").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn rejects_other_schemes() {
        assert!(matches!(
            ShareUrl::parse("http://server/share"),
            Err(ShareUrlError::UnsupportedScheme(_))
        ));
    }

    #[test]
    fn rejects_embedded_credentials() {
        assert!(matches!(
            ShareUrl::parse("smb://user:pw@server/share"),
            Err(ShareUrlError::CredentialsInUrl)
        ));
    }

    #[test]
    fn rejects_empty_and_garbage() {
        assert!(matches!(ShareUrl::parse("   "), Err(ShareUrlError::Empty)));
        assert!(ShareUrl::parse("not a url").is_err());
    }

    #[test]
    fn detects_ip_literal_hosts() {
        assert!(ShareUrl::parse("smb://192.168.0.10/share")
            .unwrap()
            .host_is_ip_address());
        assert!(ShareUrl::parse("smb://[2001:db8::1]/share")
            .unwrap()
            .host_is_ip_address());
        assert!(!ShareUrl::parse("smb://fileserver/share")
            .unwrap()
            .host_is_ip_address());
    }

    #[test]
    fn with_host_substitutes_resolved_address() {
        let url = ShareUrl::parse("smb://fileserver/share/sub").unwrap();
        let resolved = url.with_host("192.168.0.10").unwrap();
        assert_eq!(resolved.as_str(), "smb://192.168.0.10/share/sub");
        assert_eq!(resolved.share(), "share");
    }

    #[test]
    fn serde_round_trip_uses_normalized_string() {
        let url = ShareUrl::parse(r"\\server\share").unwrap();
        let json = serde_json::to_string(&url).unwrap();
        assert_eq!(json, "\"smb://server/share\"");
        let parsed: ShareUrl = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, url);
    }

    #[test]
    fn serde_rejects_invalid_string() {
        assert!(serde_json::from_str::<ShareUrl>("\"ftp://server/share\"").is_err());
    }
}
