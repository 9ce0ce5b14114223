use heapless::String;
use ota_link::{InfoKey, InfoValue, MAX_DIGEST_LEN, MAX_VERSION_LEN, truncated};

use crate::domain::error::TransferError;

/// Final verdict of an update attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UpdateOutcome {
    #[default]
    Pending,
    Success,
    Failure,
}

/// How the download phase ended
#[derive(Debug)]
pub enum FetchOutcome {
    /// The channel reported the transfer finished without errors
    DoneOk,
    DoneFail(TransferError),
}

impl FetchOutcome {
    pub fn is_ok(&self) -> bool {
        matches!(self, FetchOutcome::DoneOk)
    }
}

/// One fetch-to-report cycle.
///
/// Created when the update command is first observed. The download phase
/// fills in the transfer information, the integrity check sets
/// `firmware_valid` and the result report sets `outcome`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateSession {
    pub running_version: String<MAX_VERSION_LEN>,
    /// Version of the image being fetched, once the channel reports it
    pub target_version: Option<String<MAX_VERSION_LEN>>,
    /// Size of the whole image
    pub file_size: u32,
    /// Bytes received by the channel
    pub fetched_size: u32,
    /// Bytes appended to the destination
    pub stored_size: u64,
    pub md5: Option<String<MAX_DIGEST_LEN>>,
    /// `None` until the integrity check ran
    pub firmware_valid: Option<bool>,
    pub outcome: UpdateOutcome,
}

impl UpdateSession {
    pub fn new(running_version: &str) -> Self {
        Self {
            running_version: truncated(running_version),
            target_version: None,
            file_size: 0,
            fetched_size: 0,
            stored_size: 0,
            md5: None,
            firmware_valid: None,
            outcome: UpdateOutcome::Pending,
        }
    }

    /// Record the answer to a transfer information query
    pub fn apply(&mut self, key: InfoKey, value: InfoValue) {
        match (key, value) {
            (InfoKey::FetchedSize, InfoValue::Size(size)) => self.fetched_size = size,
            (InfoKey::FileSize, InfoValue::Size(size)) => self.file_size = size,
            (InfoKey::Md5Sum, InfoValue::Digest(digest)) => self.md5 = Some(digest),
            (InfoKey::Version, InfoValue::Version(version)) => self.target_version = Some(version),
            _ => {}
        }
    }

    /// Version the result report refers to
    pub fn report_version(&self) -> &str {
        self.target_version
            .as_ref()
            .unwrap_or(&self.running_version)
            .as_str()
    }

    /// Download progress in percent, 0 while the size is unknown
    #[allow(clippy::cast_possible_truncation)]
    pub fn progress_percent(&self) -> u8 {
        if self.file_size == 0 {
            return 0;
        }
        let percent = u64::from(self.fetched_size) * 100 / u64::from(self.file_size);
        percent.min(100) as u8
    }
}
