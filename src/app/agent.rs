//! Update orchestrator
//!
//! Owns the transport, the update channel and the firmware sink, and drives
//! one run top-down: version report, settle delay, command wait, download,
//! integrity check and result report. Every collaborator is released when the
//! run ends, whatever the outcome.

use embassy_time::Timer;
use log::{error, info, warn};
use ota_link::{PacketId, Transport, UpdateChannel};

use crate::app::ack::await_ack;
use crate::app::cancel::CancelToken;
use crate::app::events::EventSink;
use crate::app::usecases::{CommandWait, decide_outcome};
use crate::config::AgentConfig;
use crate::controllers::OtaController;
use crate::domain::{AckError, AgentError, FirmwareSink, UpdateSession};

pub struct OtaAgent<T, C, S> {
    pub(crate) transport: T,
    pub(crate) channel: C,
    pub(crate) events: EventSink,
    pub(crate) sink: S,
    pub(crate) config: AgentConfig,
    pub(crate) cancel: CancelToken,
    pub(crate) progress: OtaController,
    closed: bool,
}

impl<T, C, S> OtaAgent<T, C, S>
where
    T: Transport,
    C: UpdateChannel,
    S: FirmwareSink,
{
    pub fn new(transport: T, channel: C, sink: S, config: AgentConfig) -> Self {
        Self {
            transport,
            channel,
            events: EventSink::new(),
            sink,
            config,
            cancel: CancelToken::new(),
            progress: OtaController::new(),
            closed: false,
        }
    }

    /// Handle that stops the command wait or the download
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Run one update cycle and release every collaborator afterwards.
    ///
    /// Returns `None` when no update command arrived before the command
    /// deadline or cancellation.
    pub async fn run(&mut self) -> Result<Option<UpdateSession>, AgentError> {
        let result = self.drive().await;
        self.close();
        result
    }

    async fn drive(&mut self) -> Result<Option<UpdateSession>, AgentError> {
        self.report_version().await?;
        Timer::after(self.config.timing.settle).await;

        match self.wait_for_command().await {
            CommandWait::Command => {}
            CommandWait::Deadline => {
                info!("agent: no update command before deadline");
                return Ok(None);
            }
            CommandWait::Cancelled => {
                info!("agent: command wait cancelled");
                return Ok(None);
            }
        }

        let mut session = UpdateSession::new(&self.config.running_version);
        let fetched = self.fetch(&mut session).await;
        if fetched.is_ok() {
            self.validate(&mut session);
        }
        session.outcome = decide_outcome(&fetched, &session);

        if self.config.report_result
            && let Err(err) = self.report_result(&session).await
        {
            error!("agent: result report aborted: {}", err);
        }

        Ok(Some(session))
    }

    /// Track `token` and wait for its acknowledgement
    pub(crate) async fn confirm(&mut self, token: PacketId) -> Result<(), AckError> {
        self.events.acks.track(token)?;
        await_ack(
            &mut self.transport,
            &mut self.events,
            token,
            self.config.timing.ack(),
        )
        .await
    }

    /// Flush the sink, then release the channel and the transport.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;

        if let Err(err) = self.sink.flush() {
            warn!("agent: flush firmware sink failed: {}", err);
        }
        self.channel.close();
        self.transport.close();
    }
}
