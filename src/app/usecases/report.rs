use log::info;
use ota_link::{Transport, UpdateChannel};

use crate::app::agent::OtaAgent;
use crate::domain::{FetchOutcome, FirmwareSink, ReportError, UpdateOutcome, UpdateSession};

/// Success needs a completed download and a valid image
pub fn decide_outcome(fetched: &FetchOutcome, session: &UpdateSession) -> UpdateOutcome {
    if fetched.is_ok() && session.firmware_valid == Some(true) {
        UpdateOutcome::Success
    } else {
        UpdateOutcome::Failure
    }
}

impl<T, C, S> OtaAgent<T, C, S>
where
    T: Transport,
    C: UpdateChannel,
    S: FirmwareSink,
{
    /// Publish begin followed by the outcome of `session`.
    ///
    /// Stops at the first report that is not delivered.
    pub async fn report_result(&mut self, session: &UpdateSession) -> Result<(), ReportError> {
        self.report_begin().await?;
        match session.outcome {
            UpdateOutcome::Success => self.report_success(session.report_version()).await,
            UpdateOutcome::Failure | UpdateOutcome::Pending => {
                self.report_failure(session.report_version()).await
            }
        }
    }

    pub async fn report_begin(&mut self) -> Result<(), ReportError> {
        let token = self
            .channel
            .report_upgrade_begin()
            .await
            .map_err(ReportError::Publish)?;
        info!("agent: report upgrade begin, packet-id={}", token);
        self.confirm(token).await?;
        Ok(())
    }

    pub async fn report_success(&mut self, version: &str) -> Result<(), ReportError> {
        let token = self
            .channel
            .report_upgrade_success(version)
            .await
            .map_err(ReportError::Publish)?;
        info!(
            "agent: report upgrade success, version={} packet-id={}",
            version, token
        );
        self.confirm(token).await?;
        Ok(())
    }

    pub async fn report_failure(&mut self, version: &str) -> Result<(), ReportError> {
        let token = self
            .channel
            .report_upgrade_failure(version)
            .await
            .map_err(ReportError::Publish)?;
        info!(
            "agent: report upgrade failure, version={} packet-id={}",
            version, token
        );
        self.confirm(token).await?;
        Ok(())
    }
}
