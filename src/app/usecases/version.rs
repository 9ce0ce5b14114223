use log::{error, info, warn};
use ota_link::{Transport, UpdateChannel};

use crate::app::agent::OtaAgent;
use crate::domain::{AgentError, FirmwareSink};

impl<T, C, S> OtaAgent<T, C, S>
where
    T: Transport,
    C: UpdateChannel,
    S: FirmwareSink,
{
    /// Publish the running firmware version.
    ///
    /// Failing to issue the publish is fatal. A missing acknowledgement is
    /// only logged: the report was attempted and the run goes on.
    pub async fn report_version(&mut self) -> Result<(), AgentError> {
        let version = self.config.running_version.clone();
        let token = self
            .channel
            .report_version(version.as_str())
            .await
            .map_err(|err| {
                error!("agent: report OTA version failed: {}", err);
                AgentError::VersionReport(err)
            })?;
        info!(
            "agent: reported version {}, packet-id={}",
            version.as_str(),
            token
        );

        match self.confirm(token).await {
            Ok(()) => info!("agent: version report acknowledged"),
            Err(err) => warn!("agent: version report not acknowledged: {}", err),
        }
        Ok(())
    }
}
