// SPDX-License-Identifier: GPL-3.0-only

pub mod client;
pub mod protocol;
pub mod traits;

pub use client::{ClientError, MountsClient};
pub use protocol::{BackendError, BackendErrorCode, BackendMountOptions};
pub use traits::{
    CredentialsPrompt, DiscoveryError, HostLocatorKind, MountBackend, MountPointRegistry,
    RegistrationOptions, RegistryError, ShareDiscovery, SharePolicy,
};
