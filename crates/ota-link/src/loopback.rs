//! Loopback management service
//!
//! An in-process stand-in for the remote update service, implementing both
//! [`Transport`] and [`UpdateChannel`] over shared state. Nothing goes over a
//! network: publishes are answered according to an [`AckPolicy`] on the next
//! yield, and an [`UpdateOffer`] turns into an update command a configurable
//! number of yields after the device reported its version.
//!
//! ```ignore
//! let cloud = LoopbackCloud::new(
//!     CloudScript::default().with_offer(UpdateOffer::new(image, "1.0.1")),
//! );
//! let transport = cloud.connect(&options)?;
//! let channel = cloud.open_channel(options.product_id, options.device_id)?;
//! ```

use alloc::collections::VecDeque;
use alloc::rc::Rc;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::cell::RefCell;

use embassy_futures::yield_now;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::NoopRawMutex;
use embassy_time::{Duration, Timer};
use log::{debug, info};

use crate::channel::{InfoKey, InfoValue, MAX_DIGEST_LEN, MAX_VERSION_LEN, UpdateChannel, truncated};
use crate::error::{ChannelError, LinkError};
use crate::event::{EventHandler, PacketId, TransportEvent};
use crate::transport::{LinkAuth, LinkOptions, Transport};

/// How the service answers a publish
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckPolicy {
    /// Acknowledge on the next yield
    Ack,
    /// Reject on the next yield
    Reject,
    /// Report an acknowledgement timeout on the next yield
    Timeout,
    /// Accept the publish and never answer
    Silent,
    /// Refuse to issue the publish
    Refuse,
}

/// One planned answer to a chunk pull
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkStep {
    /// Deliver up to this many bytes
    Data(usize),
    /// Deliver nothing within the pull timeout
    Empty,
    /// Fail the transfer with a protocol code
    Fail(i32),
}

/// An update the service will push to the device
#[derive(Debug, Clone)]
pub struct UpdateOffer {
    pub image: Vec<u8>,
    pub version: heapless::String<MAX_VERSION_LEN>,
    pub md5: heapless::String<MAX_DIGEST_LEN>,
    /// Whether the image passes the checksum check once received
    pub valid: bool,
    /// Planned pull answers; once exhausted, pulls fill the whole buffer
    pub steps: Vec<ChunkStep>,
    /// Yields between the version report and the update command
    pub after_yields: u32,
}

impl UpdateOffer {
    pub fn new(image: Vec<u8>, version: &str) -> Self {
        Self {
            image,
            version: truncated(version),
            md5: heapless::String::new(),
            valid: true,
            steps: Vec::new(),
            after_yields: 1,
        }
    }

    #[must_use]
    pub fn with_md5(mut self, md5: &str) -> Self {
        self.md5 = truncated(md5);
        self
    }

    #[must_use]
    pub fn with_steps(mut self, steps: impl IntoIterator<Item = ChunkStep>) -> Self {
        self.steps = steps.into_iter().collect();
        self
    }

    #[must_use]
    pub fn after_yields(mut self, yields: u32) -> Self {
        self.after_yields = yields;
        self
    }

    /// Make the checksum check fail once the image is received
    #[must_use]
    pub fn corrupted(mut self) -> Self {
        self.valid = false;
        self
    }
}

/// Behaviour of a [`LoopbackCloud`]
#[derive(Debug, Clone)]
pub struct CloudScript {
    pub offer: Option<UpdateOffer>,
    pub version_ack: AckPolicy,
    pub report_ack: AckPolicy,
    pub unreachable: bool,
}

impl Default for CloudScript {
    fn default() -> Self {
        Self {
            offer: None,
            version_ack: AckPolicy::Ack,
            report_ack: AckPolicy::Ack,
            unreachable: false,
        }
    }
}

impl CloudScript {
    #[must_use]
    pub fn with_offer(mut self, offer: UpdateOffer) -> Self {
        self.offer = Some(offer);
        self
    }

    #[must_use]
    pub fn with_version_ack(mut self, policy: AckPolicy) -> Self {
        self.version_ack = policy;
        self
    }

    #[must_use]
    pub fn with_report_ack(mut self, policy: AckPolicy) -> Self {
        self.report_ack = policy;
        self
    }

    #[must_use]
    pub fn unreachable(mut self) -> Self {
        self.unreachable = true;
        self
    }
}

/// A publish received by the service
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Report {
    Version(heapless::String<MAX_VERSION_LEN>),
    Begin,
    Success(heapless::String<MAX_VERSION_LEN>),
    Failure(heapless::String<MAX_VERSION_LEN>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Transfer {
    Idle,
    Active { step: usize },
    Failed(i32),
    Done,
}

enum Pull {
    Data(usize),
    Empty,
}

struct CloudState {
    script: CloudScript,
    identity: Option<(String, String)>,
    connected: bool,
    channel_open: bool,
    next_packet: u16,
    pending: VecDeque<TransportEvent>,
    reports: Vec<(PacketId, Report)>,
    yields_since_version: Option<u32>,
    transfer: Transfer,
    fetched: usize,
    command_polls: u32,
    chunk_pulls: u32,
    validity_checks: u32,
}

impl CloudState {
    fn new(script: CloudScript) -> Self {
        Self {
            script,
            identity: None,
            connected: false,
            channel_open: false,
            next_packet: 1,
            pending: VecDeque::new(),
            reports: Vec::new(),
            yields_since_version: None,
            transfer: Transfer::Idle,
            fetched: 0,
            command_polls: 0,
            chunk_pulls: 0,
            validity_checks: 0,
        }
    }

    fn packet_id(&mut self) -> PacketId {
        let id = PacketId(self.next_packet);
        // 0 is not a valid packet id
        self.next_packet = self.next_packet.checked_add(1).unwrap_or(1);
        id
    }

    fn on_yield(&mut self) -> Vec<TransportEvent> {
        if !self.connected {
            return Vec::new();
        }

        if let Some(yields) = self.yields_since_version.as_mut() {
            *yields = yields.saturating_add(1);
            if self.transfer == Transfer::Idle && self.channel_open {
                if let Some(offer) = self.script.offer.as_ref() {
                    if *yields >= offer.after_yields {
                        info!(
                            "link: update command received, version={} size={}",
                            offer.version.as_str(),
                            offer.image.len()
                        );
                        self.transfer = Transfer::Active { step: 0 };
                        self.fetched = 0;
                    }
                }
            }
        }

        self.pending.drain(..).collect()
    }

    fn publish(&mut self, report: Report, policy: AckPolicy) -> Result<PacketId, ChannelError> {
        if !self.channel_open {
            return Err(ChannelError::Closed);
        }
        if policy == AckPolicy::Refuse {
            return Err(ChannelError::Publish);
        }

        let id = self.packet_id();
        match policy {
            AckPolicy::Ack => self.pending.push_back(TransportEvent::PublishAcked(id)),
            AckPolicy::Reject => self.pending.push_back(TransportEvent::PublishRejected(id)),
            AckPolicy::Timeout => self.pending.push_back(TransportEvent::PublishTimeout(id)),
            AckPolicy::Silent | AckPolicy::Refuse => {}
        }

        if matches!(report, Report::Version(_)) {
            self.yields_since_version.get_or_insert(0);
        }
        debug!("link: publish {:?}, packet-id={}", report, id);
        self.reports.push((id, report));
        Ok(id)
    }

    fn pull(&mut self, buf: &mut [u8]) -> Result<Pull, ChannelError> {
        if !self.channel_open {
            return Err(ChannelError::Closed);
        }
        self.chunk_pulls = self.chunk_pulls.saturating_add(1);

        let Transfer::Active { step } = self.transfer else {
            return Err(ChannelError::NotFetching);
        };
        let Some(offer) = self.script.offer.as_ref() else {
            return Err(ChannelError::NotFetching);
        };

        let planned = offer
            .steps
            .get(step)
            .copied()
            .unwrap_or(ChunkStep::Data(buf.len()));

        match planned {
            ChunkStep::Data(len) => {
                let remaining = offer.image.len() - self.fetched;
                let n = len.min(remaining).min(buf.len());
                buf[..n].copy_from_slice(&offer.image[self.fetched..self.fetched + n]);
                self.fetched += n;
                self.transfer = if self.fetched == offer.image.len() {
                    Transfer::Done
                } else {
                    Transfer::Active { step: step + 1 }
                };
                Ok(Pull::Data(n))
            }
            ChunkStep::Empty => {
                self.transfer = Transfer::Active { step: step + 1 };
                Ok(Pull::Empty)
            }
            ChunkStep::Fail(code) => {
                self.transfer = Transfer::Failed(code);
                Err(ChannelError::Transfer(code))
            }
        }
    }

    fn query(&self, key: InfoKey) -> Result<InfoValue, ChannelError> {
        if self.transfer == Transfer::Idle {
            return Err(ChannelError::Unavailable);
        }
        let Some(offer) = self.script.offer.as_ref() else {
            return Err(ChannelError::Unavailable);
        };

        Ok(match key {
            InfoKey::FetchedSize => InfoValue::Size(to_u32(self.fetched)),
            InfoKey::FileSize => InfoValue::Size(to_u32(offer.image.len())),
            InfoKey::Md5Sum => InfoValue::Digest(offer.md5.clone()),
            InfoKey::Version => InfoValue::Version(offer.version.clone()),
        })
    }
}

/// Shared handle to the simulated service.
///
/// Cloning yields another handle to the same service, which is how tests
/// inspect what the agent published.
#[derive(Clone)]
pub struct LoopbackCloud {
    state: Rc<Mutex<NoopRawMutex, RefCell<CloudState>>>,
}

impl LoopbackCloud {
    pub fn new(script: CloudScript) -> Self {
        Self {
            state: Rc::new(Mutex::new(RefCell::new(CloudState::new(script)))),
        }
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut CloudState) -> R) -> R {
        self.state.lock(|cell| f(&mut cell.borrow_mut()))
    }

    /// Connect a transport with the given options
    pub fn connect(&self, options: &LinkOptions<'_>) -> Result<LoopbackTransport, LinkError> {
        if options.product_id.is_empty() {
            return Err(LinkError::InvalidOptions("product id"));
        }
        if options.device_id.is_empty() {
            return Err(LinkError::InvalidOptions("device id"));
        }
        match options.auth {
            LinkAuth::Certificate {
                cert_file,
                key_file,
            } if cert_file.is_empty() || key_file.is_empty() => {
                return Err(LinkError::InvalidOptions("certificate"));
            }
            LinkAuth::Secret(secret) if secret.is_empty() => {
                return Err(LinkError::InvalidOptions("device secret"));
            }
            _ => {}
        }

        self.with_state(|state| {
            if state.script.unreachable {
                return Err(LinkError::Unreachable);
            }
            state.identity = Some((
                options.product_id.to_string(),
                options.device_id.to_string(),
            ));
            state.connected = true;
            Ok(())
        })?;

        info!(
            "link: connected as {}/{}",
            options.product_id, options.device_id
        );
        Ok(LoopbackTransport {
            cloud: self.clone(),
            closed: false,
        })
    }

    /// Open the update channel for a connected device
    pub fn open_channel(
        &self,
        product_id: &str,
        device_id: &str,
    ) -> Result<LoopbackChannel, LinkError> {
        self.with_state(|state| {
            if !state.connected {
                return Err(LinkError::NotConnected);
            }
            if state.channel_open {
                return Err(LinkError::AlreadyOpen);
            }
            let same_device = state
                .identity
                .as_ref()
                .is_some_and(|(product, device)| product == product_id && device == device_id);
            if !same_device {
                return Err(LinkError::InvalidOptions("device identity"));
            }

            state.channel_open = true;
            // The channel subscribes to its command topic right away
            let id = state.packet_id();
            state.pending.push_back(TransportEvent::SubscribeAcked(id));
            Ok(())
        })?;

        Ok(LoopbackChannel {
            cloud: self.clone(),
            closed: false,
        })
    }

    /// Queue an arbitrary event for the next yield
    pub fn inject(&self, event: TransportEvent) {
        self.with_state(|state| state.pending.push_back(event));
    }

    /// Reports published so far, in order
    pub fn reports(&self) -> Vec<Report> {
        self.with_state(|state| state.reports.iter().map(|(_, r)| r.clone()).collect())
    }

    /// Number of "is a command pending" queries
    pub fn command_polls(&self) -> u32 {
        self.with_state(|state| state.command_polls)
    }

    pub fn chunk_pulls(&self) -> u32 {
        self.with_state(|state| state.chunk_pulls)
    }

    pub fn validity_checks(&self) -> u32 {
        self.with_state(|state| state.validity_checks)
    }

    pub fn is_connected(&self) -> bool {
        self.with_state(|state| state.connected)
    }

    pub fn is_channel_open(&self) -> bool {
        self.with_state(|state| state.channel_open)
    }
}

/// Transport side of a [`LoopbackCloud`]
pub struct LoopbackTransport {
    cloud: LoopbackCloud,
    closed: bool,
}

impl Transport for LoopbackTransport {
    async fn yield_events(&mut self, budget: Duration, handler: &mut dyn EventHandler) {
        if self.closed {
            return;
        }

        let events = self.cloud.with_state(CloudState::on_yield);
        if events.is_empty() {
            // Nothing arrived: a real client would block on the socket
            Timer::after(budget).await;
            return;
        }
        for event in events {
            handler.on_event(event);
        }
        yield_now().await;
    }

    fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.cloud.with_state(|state| {
            state.connected = false;
            state.pending.clear();
        });
        info!("link: transport closed");
    }
}

/// Update channel side of a [`LoopbackCloud`]
pub struct LoopbackChannel {
    cloud: LoopbackCloud,
    closed: bool,
}

impl LoopbackChannel {
    async fn publish(
        &mut self,
        report: Report,
        version_report: bool,
    ) -> Result<PacketId, ChannelError> {
        let result = self.cloud.with_state(|state| {
            let policy = if version_report {
                state.script.version_ack
            } else {
                state.script.report_ack
            };
            state.publish(report, policy)
        });
        yield_now().await;
        result
    }
}

impl UpdateChannel for LoopbackChannel {
    async fn report_version(&mut self, version: &str) -> Result<PacketId, ChannelError> {
        self.publish(Report::Version(truncated(version)), true).await
    }

    fn is_fetching(&self) -> bool {
        self.cloud.with_state(|state| {
            state.command_polls = state.command_polls.saturating_add(1);
            matches!(state.transfer, Transfer::Active { .. })
        })
    }

    async fn fetch_chunk(
        &mut self,
        buf: &mut [u8],
        timeout: Duration,
    ) -> Result<usize, ChannelError> {
        match self.cloud.with_state(|state| state.pull(buf))? {
            Pull::Data(n) => {
                yield_now().await;
                Ok(n)
            }
            Pull::Empty => {
                Timer::after(timeout).await;
                Ok(0)
            }
        }
    }

    fn is_fetch_finished(&self) -> bool {
        self.cloud.with_state(|state| state.transfer == Transfer::Done)
    }

    fn query(&self, key: InfoKey) -> Result<InfoValue, ChannelError> {
        self.cloud.with_state(|state| state.query(key))
    }

    fn is_firmware_valid(&mut self) -> bool {
        self.cloud.with_state(|state| {
            state.validity_checks = state.validity_checks.saturating_add(1);
            state.transfer == Transfer::Done && state.script.offer.as_ref().is_some_and(|o| o.valid)
        })
    }

    async fn report_upgrade_begin(&mut self) -> Result<PacketId, ChannelError> {
        self.publish(Report::Begin, false).await
    }

    async fn report_upgrade_success(&mut self, version: &str) -> Result<PacketId, ChannelError> {
        self.publish(Report::Success(truncated(version)), false).await
    }

    async fn report_upgrade_failure(&mut self, version: &str) -> Result<PacketId, ChannelError> {
        self.publish(Report::Failure(truncated(version)), false).await
    }

    fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.cloud.with_state(|state| state.channel_open = false);
        info!("link: update channel closed");
    }
}

fn to_u32(value: usize) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}
