// SPDX-License-Identifier: GPL-3.0-only

//! Canonical domain models for the sharemount network-share service
//!
//! This crate defines the single source of truth for the mount domain types.
//! These models are used throughout the stack:
//!
//! - **sharemount-contracts**: Collaborator traits take and return these types
//! - **sharemount-service**: Serializes/deserializes these types for D-Bus transport

pub mod auth;
pub mod mount;
pub mod policy;
pub mod share_url;

pub use auth::{
    AuthDescriptor, KerberosConfig, ParsedUserName, parse_user_name, parse_user_principal_name,
};
pub use mount::{BackendKind, MountError, MountId, MountedShare, ShareIdentity, UnmountReason};
pub use policy::{PreconfiguredShare, ShareMode};
pub use share_url::{ShareUrl, ShareUrlError};
