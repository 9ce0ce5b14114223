//! Integration tests for the command wait and the chunked download.

mod common;

use embassy_futures::block_on;
use embassy_time::Duration;
use ota_agent::app::CommandWait;
use ota_agent::domain::{FetchOutcome, TransferError, UpdateSession};
use ota_link::{ChannelError, ChunkStep, CloudScript};

use common::{agent, broken_agent, fast_config, image, init_logger, offer};

/// Report the version and wait until the offer turns into a command
fn start(agent: &mut common::LoopbackAgent) -> UpdateSession {
    block_on(agent.report_version()).unwrap();
    assert_eq!(block_on(agent.wait_for_command()), CommandWait::Command);
    UpdateSession::new("1.0.0")
}

// -----------------------------------------------------------------------------
// Completed downloads
// -----------------------------------------------------------------------------

#[test]
fn chunks_are_stored_in_pull_order() {
    init_logger();
    let offer = offer(5000).with_steps([
        ChunkStep::Data(2000),
        ChunkStep::Data(2000),
        ChunkStep::Data(1000),
    ]);
    let (cloud, mut agent) = agent(CloudScript::default().with_offer(offer), fast_config());
    let mut session = start(&mut agent);

    let outcome = block_on(agent.fetch(&mut session));

    assert!(outcome.is_ok());
    assert_eq!(agent.sink(), &image(5000));
    assert_eq!(cloud.chunk_pulls(), 3);
    assert_eq!(session.fetched_size, 5000);
    assert_eq!(session.file_size, 5000);
    assert_eq!(session.stored_size, 5000);
    assert_eq!(session.target_version.as_deref(), Some("1.0.1"));
    assert_eq!(
        session.md5.as_deref(),
        Some("00112233445566778899aabbccddeeff")
    );
}

#[test]
fn zero_length_pulls_are_skipped() {
    let offer = offer(30).with_steps([
        ChunkStep::Empty,
        ChunkStep::Data(10),
        ChunkStep::Empty,
    ]);
    let (cloud, mut agent) = agent(CloudScript::default().with_offer(offer), fast_config());
    let mut session = start(&mut agent);

    let outcome = block_on(agent.fetch(&mut session));

    assert!(outcome.is_ok());
    assert_eq!(agent.sink(), &image(30));
    assert_eq!(cloud.chunk_pulls(), 4);
}

// -----------------------------------------------------------------------------
// Aborted downloads
// -----------------------------------------------------------------------------

#[test]
fn pull_error_stops_the_download() {
    let offer = offer(5000).with_steps([ChunkStep::Fail(-1), ChunkStep::Data(5000)]);
    let (cloud, mut agent) = agent(CloudScript::default().with_offer(offer), fast_config());
    let mut session = start(&mut agent);

    let outcome = block_on(agent.fetch(&mut session));

    assert!(matches!(
        outcome,
        FetchOutcome::DoneFail(TransferError::Channel(ChannelError::Transfer(-1)))
    ));
    assert!(agent.sink().is_empty());
    assert_eq!(cloud.chunk_pulls(), 1);
}

#[test]
fn error_after_data_keeps_earlier_chunks() {
    let offer = offer(100).with_steps([ChunkStep::Data(40), ChunkStep::Fail(-3)]);
    let (cloud, mut agent) = agent(CloudScript::default().with_offer(offer), fast_config());
    let mut session = start(&mut agent);

    let outcome = block_on(agent.fetch(&mut session));

    assert!(!outcome.is_ok());
    assert_eq!(agent.sink().as_slice(), &image(100)[..40]);
    assert_eq!(cloud.chunk_pulls(), 2);
}

#[test]
fn sink_write_failure_stops_the_download() {
    let script = CloudScript::default().with_offer(offer(5000));
    let (cloud, mut agent) = broken_agent(script, fast_config());
    block_on(agent.report_version()).unwrap();
    assert_eq!(block_on(agent.wait_for_command()), CommandWait::Command);
    let mut session = UpdateSession::new("1.0.0");

    let outcome = block_on(agent.fetch(&mut session));

    assert!(matches!(
        outcome,
        FetchOutcome::DoneFail(TransferError::Write(_))
    ));
    assert_eq!(cloud.chunk_pulls(), 1);
}

#[test]
fn transfer_deadline_aborts_stalled_download() {
    let offer = offer(10).with_steps(vec![ChunkStep::Empty; 10_000]);
    let config = fast_config().with_fetch_timeout(Duration::from_millis(20));
    let (_cloud, mut agent) = agent(CloudScript::default().with_offer(offer), config);
    let mut session = start(&mut agent);

    let outcome = block_on(agent.fetch(&mut session));

    assert!(matches!(
        outcome,
        FetchOutcome::DoneFail(TransferError::Deadline)
    ));
    assert!(agent.sink().is_empty());
}

#[test]
fn cancelled_download_pulls_nothing() {
    let (cloud, mut agent) = agent(
        CloudScript::default().with_offer(offer(100)),
        fast_config(),
    );
    let mut session = start(&mut agent);
    agent.cancel_token().cancel();

    let outcome = block_on(agent.fetch(&mut session));

    assert!(matches!(
        outcome,
        FetchOutcome::DoneFail(TransferError::Cancelled)
    ));
    assert_eq!(cloud.chunk_pulls(), 0);
}

// -----------------------------------------------------------------------------
// Command wait
// -----------------------------------------------------------------------------

#[test]
fn command_wait_honours_deadline() {
    let config = fast_config().with_command_timeout(Duration::from_millis(30));
    let (cloud, mut agent) = agent(CloudScript::default(), config);
    block_on(agent.report_version()).unwrap();

    assert_eq!(block_on(agent.wait_for_command()), CommandWait::Deadline);
    assert!(cloud.command_polls() >= 1);
}

#[test]
fn command_wait_stops_when_cancelled() {
    let (cloud, mut agent) = agent(CloudScript::default(), fast_config());
    agent.cancel_token().cancel();

    assert_eq!(block_on(agent.wait_for_command()), CommandWait::Cancelled);
    assert_eq!(cloud.command_polls(), 0);
}

#[test]
fn command_arrives_after_several_polls() {
    let offer = offer(10).after_yields(5);
    let (cloud, mut agent) = agent(CloudScript::default().with_offer(offer), fast_config());
    block_on(agent.report_version()).unwrap();

    assert_eq!(block_on(agent.wait_for_command()), CommandWait::Command);
    assert!(cloud.command_polls() >= 4);
}
