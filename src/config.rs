use std::path::{Path, PathBuf};

use embassy_time::Duration;
use heapless::String;
use ota_link::{LinkAuth, LinkOptions, MAX_VERSION_LEN};
use serde::Deserialize;

use crate::app::ack::AckTiming;
use crate::domain::SetupError;

/// Size of the buffer a single chunk is pulled into
pub const OTA_BUF_LEN: usize = 5000;
/// Directory below the working directory holding device certificates
pub const CERTS_DIR: &str = "certs";

pub const MAX_ID_LEN: usize = 64;
pub const MAX_SECRET_LEN: usize = 64;
pub const MAX_PATH_LEN: usize = 256;

pub const DEFAULT_RUNNING_VERSION: &str = "1.0.0";
pub const DEFAULT_IMAGE_VERSION: &str = "1.0.1";
pub const DEFAULT_DEVICE_INFO: &str = "device_info.json";
pub const DEFAULT_DESTINATION: &str = "ota.bin";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimingConfig {
    /// Transport budget per command poll
    pub command_yield: Duration,
    /// Pause between two command polls
    pub command_poll: Duration,
    /// Pause between the version report and the first command poll
    pub settle: Duration,
    /// Timeout of a single chunk pull
    pub chunk_timeout: Duration,
    /// Transport budget after every chunk
    pub fetch_yield: Duration,
    pub ack_poll: Duration,
    pub ack_yield: Duration,
    /// Longest wait for a single publish acknowledgement
    pub ack_deadline: Duration,
}

impl TimingConfig {
    pub const fn ack(&self) -> AckTiming {
        AckTiming {
            poll_interval: self.ack_poll,
            yield_budget: self.ack_yield,
            deadline: self.ack_deadline,
        }
    }
}

pub const TIMING: TimingConfig = TimingConfig {
    command_yield: Duration::from_millis(200),
    command_poll: Duration::from_millis(2000),
    settle: Duration::from_millis(2000),
    chunk_timeout: Duration::from_secs(1),
    fetch_yield: Duration::from_millis(100),
    ack_poll: Duration::from_millis(1000),
    ack_yield: Duration::from_millis(200),
    ack_deadline: Duration::from_secs(30),
};

pub const LINK_COMMAND_TIMEOUT: Duration = Duration::from_secs(5);
pub const LINK_KEEP_ALIVE: Duration = Duration::from_secs(240);

/// Behaviour of a single agent run
#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub running_version: String<MAX_VERSION_LEN>,
    pub timing: TimingConfig,
    /// Give up waiting for an update command after this long
    pub command_timeout: Option<Duration>,
    /// Abort a download that takes longer than this
    pub fetch_timeout: Option<Duration>,
    /// Publish begin and success/failure after the download
    pub report_result: bool,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            running_version: String::try_from(DEFAULT_RUNNING_VERSION).unwrap_or_default(),
            timing: TIMING,
            command_timeout: None,
            fetch_timeout: None,
            report_result: true,
        }
    }
}

impl AgentConfig {
    pub fn with_running_version(mut self, version: &str) -> Result<Self, SetupError> {
        self.running_version = bounded(version, "running version")?;
        Ok(self)
    }

    #[must_use]
    pub fn with_timing(mut self, timing: TimingConfig) -> Self {
        self.timing = timing;
        self
    }

    #[must_use]
    pub fn with_command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn without_result_report(mut self) -> Self {
        self.report_result = false;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceAuth {
    Certificate {
        cert_file: String<MAX_PATH_LEN>,
        key_file: String<MAX_PATH_LEN>,
    },
    Secret(String<MAX_SECRET_LEN>),
}

/// Who the device is and how it authenticates, resolved once at startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceIdentity {
    product_id: String<MAX_ID_LEN>,
    device_id: String<MAX_ID_LEN>,
    auth: DeviceAuth,
}

/// On-disk device info document
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeviceInfoDoc<'a> {
    product_id: &'a str,
    device_name: &'a str,
    #[serde(default, borrow)]
    dev_cert_file: Option<&'a str>,
    #[serde(default, borrow)]
    dev_private_key_file: Option<&'a str>,
    #[serde(default, borrow)]
    device_secret: Option<&'a str>,
}

impl DeviceIdentity {
    /// Read the device info document at `path`.
    ///
    /// Certificate file names are resolved below `<cwd>/certs`.
    pub fn load(path: &Path) -> Result<Self, SetupError> {
        let json = std::fs::read(path).map_err(|source| SetupError::DeviceInfoRead {
            path: path.to_path_buf(),
            source,
        })?;
        let cwd = std::env::current_dir().map_err(SetupError::WorkingDir)?;
        Self::from_json(&json, &cwd.join(CERTS_DIR))
    }

    pub fn from_json(json: &[u8], certs_dir: &Path) -> Result<Self, SetupError> {
        fn non_empty(value: Option<&str>) -> Option<&str> {
            value.filter(|v| !v.is_empty())
        }

        let (doc, _) = serde_json_core::from_slice::<DeviceInfoDoc<'_>>(json)
            .map_err(|_| SetupError::DeviceInfoParse)?;

        let auth = match (
            non_empty(doc.dev_cert_file),
            non_empty(doc.dev_private_key_file),
            non_empty(doc.device_secret),
        ) {
            (Some(cert), Some(key), _) => DeviceAuth::Certificate {
                cert_file: cert_path(certs_dir, cert)?,
                key_file: cert_path(certs_dir, key)?,
            },
            (_, _, Some(secret)) => DeviceAuth::Secret(bounded(secret, "deviceSecret")?),
            _ => return Err(SetupError::MissingCredentials),
        };

        if doc.product_id.is_empty() || doc.device_name.is_empty() {
            return Err(SetupError::DeviceInfoParse);
        }

        Ok(Self {
            product_id: bounded(doc.product_id, "productId")?,
            device_id: bounded(doc.device_name, "deviceName")?,
            auth,
        })
    }

    pub fn product_id(&self) -> &str {
        self.product_id.as_str()
    }

    pub fn device_id(&self) -> &str {
        self.device_id.as_str()
    }

    pub fn auth(&self) -> &DeviceAuth {
        &self.auth
    }

    /// Transport parameters for this device
    pub fn link_options(&self) -> LinkOptions<'_> {
        let auth = match &self.auth {
            DeviceAuth::Certificate {
                cert_file,
                key_file,
            } => LinkAuth::Certificate {
                cert_file: cert_file.as_str(),
                key_file: key_file.as_str(),
            },
            DeviceAuth::Secret(secret) => LinkAuth::Secret(secret.as_str()),
        };
        LinkOptions::new(self.product_id(), self.device_id(), auth)
            .with_command_timeout(LINK_COMMAND_TIMEOUT)
            .with_keep_alive(LINK_KEEP_ALIVE)
    }
}

/// Process settings taken from the environment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvSettings {
    /// `OTA_DEVICE_INFO`
    pub device_info: PathBuf,
    /// `OTA_DESTINATION`
    pub destination: PathBuf,
    /// `OTA_RUNNING_VERSION`
    pub running_version: String<MAX_VERSION_LEN>,
    /// `OTA_IMAGE`: image the loopback service offers, none when unset
    pub image: Option<PathBuf>,
    /// `OTA_IMAGE_VERSION`
    pub image_version: String<MAX_VERSION_LEN>,
    /// `OTA_COMMAND_TIMEOUT_MS`
    pub command_timeout: Option<Duration>,
}

impl EnvSettings {
    pub fn from_env() -> Result<Self, SetupError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<std::string::String>,
    ) -> Result<Self, SetupError> {
        let path_or = |key: &str, default: &str| {
            PathBuf::from(lookup(key).unwrap_or_else(|| default.to_owned()))
        };
        let version_or = |key: &'static str, default: &str| {
            let value = lookup(key).unwrap_or_else(|| default.to_owned());
            bounded(&value, key)
        };

        let command_timeout = match lookup("OTA_COMMAND_TIMEOUT_MS") {
            Some(value) => Some(Duration::from_millis(
                value
                    .trim()
                    .parse()
                    .map_err(|_| SetupError::InvalidSetting("OTA_COMMAND_TIMEOUT_MS"))?,
            )),
            None => None,
        };

        Ok(Self {
            device_info: path_or("OTA_DEVICE_INFO", DEFAULT_DEVICE_INFO),
            destination: path_or("OTA_DESTINATION", DEFAULT_DESTINATION),
            running_version: version_or("OTA_RUNNING_VERSION", DEFAULT_RUNNING_VERSION)?,
            image: lookup("OTA_IMAGE").map(PathBuf::from),
            image_version: version_or("OTA_IMAGE_VERSION", DEFAULT_IMAGE_VERSION)?,
            command_timeout,
        })
    }

    pub fn agent_config(&self) -> AgentConfig {
        let mut config = AgentConfig {
            running_version: self.running_version.clone(),
            ..AgentConfig::default()
        };
        config.command_timeout = self.command_timeout;
        config
    }
}

fn cert_path(certs_dir: &Path, file_name: &str) -> Result<String<MAX_PATH_LEN>, SetupError> {
    let full = certs_dir.join(file_name);
    let full = full.to_str().ok_or(SetupError::InvalidSetting("certificate path"))?;
    bounded(full, "certificate path")
}

fn bounded<const N: usize>(value: &str, what: &'static str) -> Result<String<N>, SetupError> {
    String::try_from(value).map_err(|()| SetupError::TooLong(what))
}
