use log::info;
use ota_link::{CloudScript, LoopbackCloud, UpdateOffer};

use crate::config::EnvSettings;
use crate::domain::SetupError;

/// Build the in-process management service described by `settings`.
///
/// Without an image the service never sends an update command.
pub fn build_cloud(settings: &EnvSettings) -> Result<LoopbackCloud, SetupError> {
    let mut script = CloudScript::default();

    if let Some(path) = settings.image.as_deref() {
        let image = std::fs::read(path).map_err(|source| SetupError::ImageRead {
            path: path.to_path_buf(),
            source,
        })?;
        info!(
            "agent: offering {} ({} bytes) as version {}",
            path.display(),
            image.len(),
            settings.image_version.as_str()
        );
        script = script.with_offer(UpdateOffer::new(image, settings.image_version.as_str()));
    }

    Ok(LoopbackCloud::new(script))
}
