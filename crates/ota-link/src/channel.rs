//! Firmware update channel contract.

use embassy_time::Duration;
use heapless::String;

use crate::error::ChannelError;
use crate::event::PacketId;

/// Longest checksum digest a channel reports (hex encoded md5)
pub const MAX_DIGEST_LEN: usize = 32;
/// Longest firmware version string a channel reports
pub const MAX_VERSION_LEN: usize = 128;

/// Copy `value` into a bounded string, truncating at a char boundary
pub fn truncated<const N: usize>(value: &str) -> String<N> {
    let mut out = String::new();
    for c in value.chars() {
        if out.push(c).is_err() {
            break;
        }
    }
    out
}

/// Transfer information that can be queried while fetching
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InfoKey {
    /// Bytes received so far
    FetchedSize,
    /// Size of the whole image
    FileSize,
    /// Expected checksum digest
    Md5Sum,
    /// Version of the image being fetched
    Version,
}

/// Answer to an [`InfoKey`] query
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InfoValue {
    Size(u32),
    Digest(String<MAX_DIGEST_LEN>),
    Version(String<MAX_VERSION_LEN>),
}

/// Firmware transfer protocol running on top of a [`crate::Transport`].
///
/// Report operations return the packet id of the publish they issued; the
/// acknowledgement arrives later as a transport event.
pub trait UpdateChannel {
    /// Publish the firmware version currently running
    async fn report_version(&mut self, version: &str) -> Result<PacketId, ChannelError>;

    /// Whether the service has sent an update command
    fn is_fetching(&self) -> bool;

    /// Pull the next piece of the image into `buf`.
    ///
    /// `Ok(0)` means no data arrived within `timeout`.
    async fn fetch_chunk(&mut self, buf: &mut [u8], timeout: Duration)
    -> Result<usize, ChannelError>;

    /// Whether the whole image has been received
    fn is_fetch_finished(&self) -> bool;

    fn query(&self, key: InfoKey) -> Result<InfoValue, ChannelError>;

    /// Whether the received image matches its announced checksum
    fn is_firmware_valid(&mut self) -> bool;

    async fn report_upgrade_begin(&mut self) -> Result<PacketId, ChannelError>;

    async fn report_upgrade_success(&mut self, version: &str) -> Result<PacketId, ChannelError>;

    async fn report_upgrade_failure(&mut self, version: &str) -> Result<PacketId, ChannelError>;

    /// Release the channel. Calling it twice is a no-op.
    fn close(&mut self);
}
