//! Error types for the link contracts

use core::fmt;

/// Failure to construct a transport or an update channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkError {
    /// A connection parameter is missing or malformed
    InvalidOptions(&'static str),
    /// The remote end cannot be reached
    Unreachable,
    /// The update channel needs a connected transport
    NotConnected,
    /// An update channel is already open on this transport
    AlreadyOpen,
}

impl fmt::Display for LinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkError::InvalidOptions(what) => write!(f, "Invalid link options: {}", what),
            LinkError::Unreachable => write!(f, "Remote end unreachable"),
            LinkError::NotConnected => write!(f, "Transport not connected"),
            LinkError::AlreadyOpen => write!(f, "Update channel already open"),
        }
    }
}

impl core::error::Error for LinkError {}

/// Failure of an update channel operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelError {
    /// The channel was closed or never opened
    Closed,
    /// No fetch is in progress
    NotFetching,
    /// The transfer failed with the given protocol code
    Transfer(i32),
    /// The publish could not be issued
    Publish,
    /// The requested information is not available yet
    Unavailable,
}

impl fmt::Display for ChannelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelError::Closed => write!(f, "Update channel closed"),
            ChannelError::NotFetching => write!(f, "No fetch in progress"),
            ChannelError::Transfer(code) => write!(f, "Transfer failed, rc={}", code),
            ChannelError::Publish => write!(f, "Publish failed"),
            ChannelError::Unavailable => write!(f, "Information unavailable"),
        }
    }
}

impl core::error::Error for ChannelError {}
