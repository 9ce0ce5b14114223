//! Integration tests for device identity and environment settings.

use std::path::{Path, PathBuf};

use embassy_time::Duration;
use ota_agent::config::{DeviceAuth, DeviceIdentity, EnvSettings, TIMING};
use ota_agent::domain::SetupError;
use ota_link::LinkAuth;

const CERTS: &str = "/work/certs";

// -----------------------------------------------------------------------------
// Device info
// -----------------------------------------------------------------------------

#[test]
fn secret_device_info_is_parsed() {
    let json = br#"{"productId":"PRODUCT","deviceName":"device-1","deviceSecret":"s3cret"}"#;

    let identity = DeviceIdentity::from_json(json, Path::new(CERTS)).unwrap();

    assert_eq!(identity.product_id(), "PRODUCT");
    assert_eq!(identity.device_id(), "device-1");
    assert!(matches!(identity.auth(), DeviceAuth::Secret(s) if s.as_str() == "s3cret"));
    assert_eq!(identity.link_options().auth, LinkAuth::Secret("s3cret"));
}

#[test]
fn certificate_files_resolve_below_certs_dir() {
    let json = br#"{
        "productId": "PRODUCT",
        "deviceName": "device-1",
        "devCertFile": "device_cert.crt",
        "devPrivateKeyFile": "device_private.key"
    }"#;

    let identity = DeviceIdentity::from_json(json, Path::new(CERTS)).unwrap();

    let options = identity.link_options();
    assert_eq!(
        options.auth,
        LinkAuth::Certificate {
            cert_file: "/work/certs/device_cert.crt",
            key_file: "/work/certs/device_private.key",
        }
    );
    assert_eq!(options.command_timeout, Duration::from_secs(5));
}

#[test]
fn certificate_pair_wins_over_secret() {
    let json = br#"{
        "productId": "PRODUCT",
        "deviceName": "device-1",
        "devCertFile": "c.crt",
        "devPrivateKeyFile": "k.key",
        "deviceSecret": "s3cret"
    }"#;

    let identity = DeviceIdentity::from_json(json, Path::new(CERTS)).unwrap();

    assert!(matches!(identity.auth(), DeviceAuth::Certificate { .. }));
}

#[test]
fn incomplete_certificate_pair_falls_back_to_secret() {
    let json = br#"{
        "productId": "PRODUCT",
        "deviceName": "device-1",
        "devCertFile": "c.crt",
        "devPrivateKeyFile": "",
        "deviceSecret": "s3cret"
    }"#;

    let identity = DeviceIdentity::from_json(json, Path::new(CERTS)).unwrap();

    assert!(matches!(identity.auth(), DeviceAuth::Secret(_)));
}

#[test]
fn missing_credentials_are_rejected() {
    let json = br#"{"productId":"PRODUCT","deviceName":"device-1","deviceSecret":""}"#;

    let err = DeviceIdentity::from_json(json, Path::new(CERTS)).unwrap_err();

    assert!(matches!(err, SetupError::MissingCredentials));
}

#[test]
fn malformed_device_info_is_rejected() {
    let err = DeviceIdentity::from_json(b"{\"productId\":", Path::new(CERTS)).unwrap_err();
    assert!(matches!(err, SetupError::DeviceInfoParse));

    let json = br#"{"productId":"","deviceName":"device-1","deviceSecret":"s"}"#;
    let err = DeviceIdentity::from_json(json, Path::new(CERTS)).unwrap_err();
    assert!(matches!(err, SetupError::DeviceInfoParse));
}

// -----------------------------------------------------------------------------
// Environment
// -----------------------------------------------------------------------------

#[test]
fn environment_defaults() {
    let settings = EnvSettings::from_lookup(|_| None).unwrap();

    assert_eq!(settings.device_info, PathBuf::from("device_info.json"));
    assert_eq!(settings.destination, PathBuf::from("ota.bin"));
    assert_eq!(settings.running_version.as_str(), "1.0.0");
    assert_eq!(settings.image_version.as_str(), "1.0.1");
    assert_eq!(settings.image, None);
    assert_eq!(settings.command_timeout, None);

    let config = settings.agent_config();
    assert_eq!(config.timing, TIMING);
    assert!(config.report_result);
    assert_eq!(config.fetch_timeout, None);
}

#[test]
fn environment_overrides() {
    let settings = EnvSettings::from_lookup(|key| match key {
        "OTA_RUNNING_VERSION" => Some("2.0.0".into()),
        "OTA_IMAGE" => Some("/tmp/fw.bin".into()),
        "OTA_COMMAND_TIMEOUT_MS" => Some(" 1500 ".into()),
        _ => None,
    })
    .unwrap();

    assert_eq!(settings.image, Some(PathBuf::from("/tmp/fw.bin")));
    assert_eq!(settings.command_timeout, Some(Duration::from_millis(1500)));

    let config = settings.agent_config();
    assert_eq!(config.running_version.as_str(), "2.0.0");
    assert_eq!(config.command_timeout, Some(Duration::from_millis(1500)));
}

#[test]
fn invalid_command_timeout_is_rejected() {
    let err = EnvSettings::from_lookup(|key| {
        (key == "OTA_COMMAND_TIMEOUT_MS").then(|| "soon".to_owned())
    })
    .unwrap_err();

    assert!(matches!(
        err,
        SetupError::InvalidSetting("OTA_COMMAND_TIMEOUT_MS")
    ));
}

#[test]
fn overlong_version_is_rejected() {
    let err = EnvSettings::from_lookup(|key| {
        (key == "OTA_RUNNING_VERSION").then(|| "9".repeat(200))
    })
    .unwrap_err();

    assert!(matches!(err, SetupError::TooLong("OTA_RUNNING_VERSION")));
}

#[test]
fn overlong_device_secret_is_rejected() {
    let json = format!(
        r#"{{"productId":"PRODUCT","deviceName":"device-1","deviceSecret":"{}"}}"#,
        "s".repeat(65)
    );

    let err = DeviceIdentity::from_json(json.as_bytes(), Path::new(CERTS)).unwrap_err();

    assert!(matches!(err, SetupError::TooLong("deviceSecret")));
}
