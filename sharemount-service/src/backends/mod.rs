// SPDX-License-Identifier: GPL-3.0-only

//! Mount backend clients
//!
//! Two interchangeable daemon clients implement
//! [`sharemount_contracts::MountBackend`]; `routing` selects one at startup
//! from the service configuration and the choice never changes at runtime.

pub mod fuse;
pub mod provider;

pub use fuse::FuseBackend;
pub use provider::ProviderBackend;
