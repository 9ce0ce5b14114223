//! Command wait and chunked download

use embassy_time::{Timer, with_timeout};
use log::{debug, error, info};
use ota_link::{InfoKey, Transport, UpdateChannel};

use crate::app::agent::OtaAgent;
use crate::config::OTA_BUF_LEN;
use crate::domain::{FetchOutcome, FirmwareSink, TransferError, UpdateSession};

/// How waiting for an update command ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandWait {
    Command,
    Deadline,
    Cancelled,
}

const INFO_KEYS: [InfoKey; 4] = [
    InfoKey::FetchedSize,
    InfoKey::FileSize,
    InfoKey::Md5Sum,
    InfoKey::Version,
];

/// Copy the channel's transfer information into `session`.
///
/// Keys the channel cannot answer yet keep their previous value.
pub fn refresh_session<C: UpdateChannel>(channel: &C, session: &mut UpdateSession) {
    for key in INFO_KEYS {
        match channel.query(key) {
            Ok(value) => session.apply(key, value),
            Err(err) => debug!("agent: query {:?} failed: {}", key, err),
        }
    }
    debug!(
        "agent: fetched={} size={} md5={:?} version={:?}",
        session.fetched_size, session.file_size, session.md5, session.target_version
    );
}

impl<T, C, S> OtaAgent<T, C, S>
where
    T: Transport,
    C: UpdateChannel,
    S: FirmwareSink,
{
    /// Lend time to the transport until the service sends an update command.
    pub async fn wait_for_command(&mut self) -> CommandWait {
        match self.config.command_timeout {
            Some(deadline) => with_timeout(deadline, self.poll_for_command())
                .await
                .unwrap_or(CommandWait::Deadline),
            None => self.poll_for_command().await,
        }
    }

    async fn poll_for_command(&mut self) -> CommandWait {
        loop {
            if self.cancel.is_cancelled() {
                return CommandWait::Cancelled;
            }

            info!("agent: waiting for update command");
            self.transport
                .yield_events(self.config.timing.command_yield, &mut self.events)
                .await;
            if self.channel.is_fetching() {
                return CommandWait::Command;
            }

            if self.cancel.is_cancelled() {
                return CommandWait::Cancelled;
            }
            Timer::after(self.config.timing.command_poll).await;
        }
    }

    /// Download the offered image into the sink.
    pub async fn fetch(&mut self, session: &mut UpdateSession) -> FetchOutcome {
        refresh_session(&self.channel, session);
        self.progress.on_ota_start(session);

        let result = match self.config.fetch_timeout {
            Some(deadline) => with_timeout(deadline, self.pull_image(session))
                .await
                .unwrap_or(Err(TransferError::Deadline)),
            None => self.pull_image(session).await,
        };

        match result {
            Ok(()) => {
                self.progress.on_ota_complete(session);
                FetchOutcome::DoneOk
            }
            Err(err) => {
                error!("agent: {}", err);
                self.progress.on_ota_abort(session);
                FetchOutcome::DoneFail(err)
            }
        }
    }

    async fn pull_image(&mut self, session: &mut UpdateSession) -> Result<(), TransferError> {
        let mut buf = [0u8; OTA_BUF_LEN];

        loop {
            if self.cancel.is_cancelled() {
                return Err(TransferError::Cancelled);
            }

            let len = self
                .channel
                .fetch_chunk(&mut buf, self.config.timing.chunk_timeout)
                .await
                .map_err(TransferError::Channel)?;
            if len > 0 {
                self.sink.append(&buf[..len]).map_err(TransferError::Write)?;
                session.stored_size = self.sink.written();
            }

            refresh_session(&self.channel, session);
            self.progress.on_ota_chunk(session);

            self.transport
                .yield_events(self.config.timing.fetch_yield, &mut self.events)
                .await;

            if self.channel.is_fetch_finished() {
                return Ok(());
            }
        }
    }
}
