// SPDX-License-Identifier: GPL-3.0-only

pub mod error;
pub mod options;

pub use error::{BackendError, BackendErrorCode};
pub use options::BackendMountOptions;
