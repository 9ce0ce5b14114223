//! Transport events and the handler they are delivered to.

use core::fmt;

/// Request token correlating a publish with its later acknowledgement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PacketId(pub u16);

impl fmt::Display for PacketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Everything a transport can tell the agent about.
///
/// Subscribe and publish variants carry the packet id of the request they
/// answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportEvent {
    Undefined,
    Disconnected,
    Reconnected,
    SubscribeAcked(PacketId),
    SubscribeTimeout(PacketId),
    SubscribeRejected(PacketId),
    PublishAcked(PacketId),
    PublishTimeout(PacketId),
    PublishRejected(PacketId),
}

impl TransportEvent {
    /// Packet id carried by the event, if any
    pub fn packet_id(&self) -> Option<PacketId> {
        match self {
            Self::Undefined | Self::Disconnected | Self::Reconnected => None,
            Self::SubscribeAcked(id)
            | Self::SubscribeTimeout(id)
            | Self::SubscribeRejected(id)
            | Self::PublishAcked(id)
            | Self::PublishTimeout(id)
            | Self::PublishRejected(id) => Some(*id),
        }
    }
}

/// Receiver of transport events.
///
/// Called synchronously from inside [`crate::Transport::yield_events`], never
/// concurrently with the code that issued the yield.
pub trait EventHandler {
    fn on_event(&mut self, event: TransportEvent);
}
