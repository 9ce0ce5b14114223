use log::{info, warn};
use ota_link::{EventHandler, TransportEvent};

use crate::app::ack::{AckState, AckTracker};

/// Receives every transport event and turns publish answers into
/// acknowledgement state.
#[derive(Default)]
pub struct EventSink {
    pub acks: AckTracker,
}

impl EventSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EventHandler for EventSink {
    fn on_event(&mut self, event: TransportEvent) {
        let (token, state) = match event {
            TransportEvent::Undefined => {
                info!("agent: undefined event");
                return;
            }
            TransportEvent::Disconnected => {
                info!("agent: transport disconnected");
                return;
            }
            TransportEvent::Reconnected => {
                info!("agent: transport reconnected");
                return;
            }
            TransportEvent::SubscribeAcked(id) => {
                info!("agent: subscribe success, packet-id={}", id);
                return;
            }
            TransportEvent::SubscribeTimeout(id) => {
                warn!("agent: subscribe wait ack timeout, packet-id={}", id);
                return;
            }
            TransportEvent::SubscribeRejected(id) => {
                warn!("agent: subscribe nack, packet-id={}", id);
                return;
            }
            TransportEvent::PublishAcked(id) => {
                info!("agent: publish success, packet-id={}", id);
                (id, AckState::Acked)
            }
            TransportEvent::PublishTimeout(id) => {
                warn!("agent: publish timeout, packet-id={}", id);
                (id, AckState::TimedOut)
            }
            TransportEvent::PublishRejected(id) => {
                warn!("agent: publish nack, packet-id={}", id);
                (id, AckState::Rejected)
            }
        };

        if !self.acks.resolve(token, state) {
            info!("agent: ignoring answer for untracked packet-id={}", token);
        }
    }
}
