#![allow(dead_code)]

use std::io;

use embassy_time::Duration;
use ota_agent::app::OtaAgent;
use ota_agent::config::{AgentConfig, TimingConfig};
use ota_agent::domain::FirmwareSink;
use ota_link::{
    CloudScript, LinkAuth, LinkOptions, LoopbackChannel, LoopbackCloud, LoopbackTransport,
    UpdateOffer,
};

pub(crate) const PRODUCT: &str = "PRODUCT";
pub(crate) const DEVICE: &str = "device-1";

/// Millisecond timings so scenarios finish quickly
pub(crate) const FAST: TimingConfig = TimingConfig {
    command_yield: Duration::from_millis(1),
    command_poll: Duration::from_millis(1),
    settle: Duration::from_millis(1),
    chunk_timeout: Duration::from_millis(1),
    fetch_yield: Duration::from_millis(1),
    ack_poll: Duration::from_millis(1),
    ack_yield: Duration::from_millis(1),
    ack_deadline: Duration::from_millis(200),
};

pub(crate) type LoopbackAgent = OtaAgent<LoopbackTransport, LoopbackChannel, Vec<u8>>;
pub(crate) type BrokenAgent = OtaAgent<LoopbackTransport, LoopbackChannel, BrokenSink>;

/// Sink whose storage is full
pub(crate) struct BrokenSink;

impl FirmwareSink for BrokenSink {
    fn append(&mut self, _chunk: &[u8]) -> io::Result<()> {
        Err(io::Error::other("disk full"))
    }

    fn written(&self) -> u64 {
        0
    }
}

pub(crate) fn options() -> LinkOptions<'static> {
    LinkOptions::new(PRODUCT, DEVICE, LinkAuth::Secret("s3cret"))
}

pub(crate) fn fast_config() -> AgentConfig {
    AgentConfig::default().with_timing(FAST)
}

/// Connect an agent writing into memory to a fresh loopback service
pub(crate) fn agent(script: CloudScript, config: AgentConfig) -> (LoopbackCloud, LoopbackAgent) {
    let cloud = LoopbackCloud::new(script);
    let transport = cloud.connect(&options()).unwrap();
    let channel = cloud.open_channel(PRODUCT, DEVICE).unwrap();
    let agent = OtaAgent::new(transport, channel, Vec::new(), config);
    (cloud, agent)
}

/// Same as [`agent`], but every write to the sink fails
pub(crate) fn broken_agent(
    script: CloudScript,
    config: AgentConfig,
) -> (LoopbackCloud, BrokenAgent) {
    let cloud = LoopbackCloud::new(script);
    let transport = cloud.connect(&options()).unwrap();
    let channel = cloud.open_channel(PRODUCT, DEVICE).unwrap();
    let agent = OtaAgent::new(transport, channel, BrokenSink, config);
    (cloud, agent)
}

pub(crate) fn image(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

pub(crate) fn offer(len: usize) -> UpdateOffer {
    UpdateOffer::new(image(len), "1.0.1").with_md5("00112233445566778899aabbccddeeff")
}

pub(crate) fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}
