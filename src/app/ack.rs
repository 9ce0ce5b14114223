//! Publish acknowledgement tracking
//!
//! Every report publish returns a packet id. The id is tracked here until the
//! transport delivers the matching acknowledgement event, and [`await_ack`]
//! pumps the transport until that happens or the deadline passes.

use embassy_time::{Duration, Timer, with_timeout};
use heapless::FnvIndexMap;
use log::debug;
use ota_link::{PacketId, Transport};

use crate::app::events::EventSink;
use crate::domain::AckError;

/// Publishes that may await acknowledgement at the same time
pub const MAX_PENDING_ACKS: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckState {
    Pending,
    Acked,
    Rejected,
    TimedOut,
}

/// Timing of a single [`await_ack`] call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AckTiming {
    /// Pause between two transport yields
    pub poll_interval: Duration,
    /// Transport budget per yield
    pub yield_budget: Duration,
    pub deadline: Duration,
}

#[derive(Default)]
pub struct AckTracker {
    entries: FnvIndexMap<PacketId, AckState, MAX_PENDING_ACKS>,
}

impl AckTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start waiting for `token`
    pub fn track(&mut self, token: PacketId) -> Result<(), AckError> {
        self.entries
            .insert(token, AckState::Pending)
            .map(|_| ())
            .map_err(|_| AckError::TrackerFull)
    }

    /// Record the answer for `token`.
    ///
    /// Returns `false` when the token is not awaited or already answered.
    pub fn resolve(&mut self, token: PacketId, state: AckState) -> bool {
        match self.entries.get_mut(&token) {
            Some(entry) if *entry == AckState::Pending => {
                *entry = state;
                true
            }
            _ => false,
        }
    }

    pub fn state(&self, token: PacketId) -> Option<AckState> {
        self.entries.get(&token).copied()
    }

    pub fn forget(&mut self, token: PacketId) {
        self.entries.remove(&token);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Wait until the publish identified by `token` is acknowledged.
///
/// The token must be tracked by `events`. It is forgotten again on every
/// return path.
pub async fn await_ack<T: Transport>(
    transport: &mut T,
    events: &mut EventSink,
    token: PacketId,
    timing: AckTiming,
) -> Result<(), AckError> {
    let result = with_timeout(timing.deadline, poll_ack(transport, events, token, timing))
        .await
        .unwrap_or(Err(AckError::Deadline(token)));
    events.acks.forget(token);
    result
}

async fn poll_ack<T: Transport>(
    transport: &mut T,
    events: &mut EventSink,
    token: PacketId,
    timing: AckTiming,
) -> Result<(), AckError> {
    loop {
        transport.yield_events(timing.yield_budget, events).await;

        match events.acks.state(token) {
            Some(AckState::Acked) => return Ok(()),
            Some(AckState::Rejected) => return Err(AckError::Rejected(token)),
            Some(AckState::TimedOut) => return Err(AckError::TimedOut(token)),
            Some(AckState::Pending) => debug!("agent: wait for ack, packet-id={}", token),
            None => return Err(AckError::Untracked(token)),
        }

        Timer::after(timing.poll_interval).await;
    }
}
