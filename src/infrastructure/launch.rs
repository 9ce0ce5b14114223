//! Process startup
//!
//! Resolves the device identity, connects the transport, opens the update
//! channel and the firmware sink, then hands everything to an [`OtaAgent`].
//! Whatever was opened is closed again when a later step fails.

use log::info;
use ota_link::{LoopbackCloud, Transport as _, UpdateChannel as _};

use crate::app::OtaAgent;
use crate::config::{AgentConfig, DeviceIdentity, EnvSettings};
use crate::domain::{AgentError, UpdateSession};
use crate::infrastructure::loopback::build_cloud;
use crate::infrastructure::storage::FileSink;

pub async fn launch(settings: &EnvSettings) -> Result<Option<UpdateSession>, AgentError> {
    let cloud = build_cloud(settings)?;
    launch_on(&cloud, settings, settings.agent_config()).await
}

/// Run the agent against an already built service
pub async fn launch_on(
    cloud: &LoopbackCloud,
    settings: &EnvSettings,
    config: AgentConfig,
) -> Result<Option<UpdateSession>, AgentError> {
    let identity = DeviceIdentity::load(&settings.device_info)?;
    info!(
        "agent: starting as {}/{}",
        identity.product_id(),
        identity.device_id()
    );

    let mut transport = cloud
        .connect(&identity.link_options())
        .map_err(AgentError::TransportConstruct)?;

    let mut channel = match cloud.open_channel(identity.product_id(), identity.device_id()) {
        Ok(channel) => channel,
        Err(err) => {
            transport.close();
            return Err(AgentError::ChannelInit(err));
        }
    };

    let sink = match FileSink::create(&settings.destination) {
        Ok(sink) => sink,
        Err(source) => {
            channel.close();
            transport.close();
            return Err(AgentError::Sink {
                path: settings.destination.clone(),
                source,
            });
        }
    };

    let mut agent = OtaAgent::new(transport, channel, sink, config);
    agent.run().await
}
