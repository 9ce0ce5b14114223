use log::{error, info};
use ota_link::{Transport, UpdateChannel};

use crate::app::agent::OtaAgent;
use crate::domain::{FirmwareSink, UpdateSession};

/// Ask the channel whether the received image passed its checksum check and
/// record the answer on the session.
pub fn validate<C: UpdateChannel>(channel: &mut C, session: &mut UpdateSession) -> bool {
    let valid = channel.is_firmware_valid();
    session.firmware_valid = Some(valid);
    if valid {
        info!("agent: the firmware is valid");
    } else {
        error!("agent: the firmware is invalid");
    }
    valid
}

impl<T, C, S> OtaAgent<T, C, S>
where
    T: Transport,
    C: UpdateChannel,
    S: FirmwareSink,
{
    pub fn validate(&mut self, session: &mut UpdateSession) -> bool {
        validate(&mut self.channel, session)
    }
}
