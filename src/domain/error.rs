use std::io;
use std::path::PathBuf;

use ota_link::{ChannelError, LinkError, PacketId};
use thiserror::Error;

/// Device identity or process configuration could not be resolved
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("cannot read device info {path}: {source}")]
    DeviceInfoRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("malformed device info")]
    DeviceInfoParse,
    #[error("device info has neither certificate files nor a device secret")]
    MissingCredentials,
    #[error("`{0}` is too long")]
    TooLong(&'static str),
    #[error("invalid value for {0}")]
    InvalidSetting(&'static str),
    #[error("cannot resolve working directory: {0}")]
    WorkingDir(#[source] io::Error),
    #[error("cannot read firmware image {path}: {source}")]
    ImageRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Failures that end the agent process with a non-zero exit code
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("setup failed: {0}")]
    Setup(#[from] SetupError),
    #[error("cloud device construct failed: {0}")]
    TransportConstruct(#[source] LinkError),
    #[error("initialize OTA failed: {0}")]
    ChannelInit(#[source] LinkError),
    #[error("open destination {path} failed: {source}")]
    Sink {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("report OTA version failed: {0}")]
    VersionReport(#[source] ChannelError),
}

/// A publish was not confirmed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AckError {
    #[error("publish rejected, packet-id={0}")]
    Rejected(PacketId),
    #[error("publish wait ack timeout, packet-id={0}")]
    TimedOut(PacketId),
    #[error("no acknowledgement before deadline, packet-id={0}")]
    Deadline(PacketId),
    #[error("packet-id={0} is not awaited")]
    Untracked(PacketId),
    #[error("too many publishes awaiting acknowledgement")]
    TrackerFull,
}

/// The download was aborted
#[derive(Debug, Error)]
pub enum TransferError {
    #[error("download failed: {0}")]
    Channel(#[source] ChannelError),
    #[error("write data to destination failed: {0}")]
    Write(#[source] io::Error),
    #[error("transfer deadline elapsed")]
    Deadline,
    #[error("transfer cancelled")]
    Cancelled,
}

/// A result report could not be delivered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ReportError {
    #[error("publish failed: {0}")]
    Publish(#[source] ChannelError),
    #[error(transparent)]
    Ack(#[from] AckError),
}
