//! Administrator-preconfigured share records

use serde::{Deserialize, Serialize};

/// What the administrator wants done with a preconfigured share.
///
/// Unrecognized mode strings deserialize to [`ShareMode::Unknown`] so that a
/// newer policy never breaks an older service; unknown modes are offered in
/// the discovery dropdown and are never mounted unattended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShareMode {
    DropDown,
    PreMount,
    #[serde(other)]
    Unknown,
}

/// One policy record: a share URL plus the mode it was configured with.
/// The URL stays a raw string at this boundary; validation happens when the
/// list is partitioned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreconfiguredShare {
    pub share_url: String,
    pub mode: ShareMode,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_modes_deserialize() {
        let share: PreconfiguredShare =
            serde_json::from_str(r#"{"share_url": "smb://server/share", "mode": "drop_down"}"#)
                .unwrap();
        assert_eq!(share.mode, ShareMode::DropDown);

        let share: PreconfiguredShare =
            serde_json::from_str(r#"{"share_url": "smb://server/share", "mode": "pre_mount"}"#)
                .unwrap();
        assert_eq!(share.mode, ShareMode::PreMount);
    }

    #[test]
    fn future_modes_fall_back_to_unknown() {
        let share: PreconfiguredShare = serde_json::from_str(
            r#"{"share_url": "smb://server/share", "mode": "unknown_future_mode"}"#,
        )
        .unwrap();
        assert_eq!(share.mode, ShareMode::Unknown);
    }
}
