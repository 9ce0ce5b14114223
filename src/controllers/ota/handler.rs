//! OTA Controller
//!
//! Follows an update session and reports its progress in the log: start,
//! every 10% of received bytes, completion and abort.

use log::info;

use crate::domain::UpdateSession;

const PROGRESS_STEP: u8 = 10;

/// OTA Controller
#[derive(Debug, Default)]
pub struct OtaController {
    /// Last progress step written to the log
    reported: u8,
}

impl OtaController {
    /// Create a new OTA controller
    pub fn new() -> Self {
        Self::default()
    }

    /// Download of an image starts
    pub fn on_ota_start(&mut self, session: &UpdateSession) {
        self.reported = 0;
        info!(
            "ota: starting update, version={} size={} bytes",
            session.report_version(),
            session.file_size
        );
    }

    /// Got a chunk of firmware data.
    ///
    /// Returns the progress that was logged, if a new 10% step was reached.
    pub fn on_ota_chunk(&mut self, session: &UpdateSession) -> Option<u8> {
        if session.file_size == 0 {
            return None;
        }
        let step = session.progress_percent() / PROGRESS_STEP * PROGRESS_STEP;
        if step <= self.reported {
            return None;
        }

        self.reported = step;
        info!(
            "ota: progress {}% ({}/{} bytes)",
            step, session.fetched_size, session.file_size
        );
        Some(step)
    }

    /// The whole image was received
    pub fn on_ota_complete(&mut self, session: &UpdateSession) {
        info!(
            "ota: download finished, {} bytes stored",
            session.stored_size
        );
    }

    /// Abort the current update
    pub fn on_ota_abort(&mut self, session: &UpdateSession) {
        info!(
            "ota: aborting update at {}/{} bytes",
            session.fetched_size, session.file_size
        );
    }
}
