// SPDX-License-Identifier: GPL-3.0-only

//! Preconfigured share partitioning
//!
//! Administrators push a list of `{share_url, mode}` records. The filter
//! splits it into the set offered in the discovery dropdown and the set
//! mounted unattended at startup. The fallback is asymmetric on purpose: a
//! mode this build does not recognize goes to the dropdown, never to an
//! unattended mount.

use sharemount_types::{PreconfiguredShare, ShareMode, ShareUrl};

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PartitionedShares {
    pub dropdown: Vec<ShareUrl>,
    pub premount: Vec<ShareUrl>,
}

pub fn partition_preconfigured(entries: &[PreconfiguredShare]) -> PartitionedShares {
    let mut partitioned = PartitionedShares::default();

    for entry in entries {
        let url = match ShareUrl::parse(&entry.share_url) {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!(
                    "Ignoring preconfigured share with invalid url {:?}: {e}",
                    entry.share_url
                );
                continue;
            }
        };

        match entry.mode {
            ShareMode::PreMount => partitioned.premount.push(url),
            ShareMode::DropDown | ShareMode::Unknown => partitioned.dropdown.push(url),
        }
    }

    partitioned
}
