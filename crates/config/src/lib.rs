#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Configuration management for atgmlogger
//!
//! This crate handles loading and merging configuration from:
//! - Default values (the same asset the installer deploys)
//! - Configuration file search path (~/.atgmlogger.toml,
//!   /opt/atgmlogger/config.toml, /etc/atgmlogger/config.toml)
//! - Environment variables
//! - CLI flags

pub mod paths;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use atgmlogger_errors::{ConfigError, Error};
use tokio::fs;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub serial: SerialConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub usb: UsbConfig,

    #[serde(default)]
    pub gpio: GpioConfig,

    #[serde(default)]
    pub timesync: TimeSyncConfig,

    #[serde(default)]
    pub install: InstallConfig,

    /// Path the configuration was loaded from, if any
    #[serde(skip)]
    pub loaded_from: Option<PathBuf>,
}

/// Serial port configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerialConfig {
    #[serde(default = "default_serial_port")]
    pub port: String,
    #[serde(default = "default_baudrate")]
    pub baudrate: u32,
    /// Parity: "none", "odd" or "even"
    #[serde(default = "default_parity")]
    pub parity: String,
    #[serde(default = "default_stopbits")]
    pub stopbits: u8,
    /// Read timeout in milliseconds; the listener wakes at this cadence to
    /// check for shutdown
    #[serde(default = "default_read_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: default_serial_port(),
            baudrate: default_baudrate(),
            parity: default_parity(),
            stopbits: default_stopbits(),
            timeout_ms: default_read_timeout_ms(),
        }
    }
}

/// Data/application logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_logdir")]
    pub logdir: PathBuf,
    #[serde(default = "default_data_file")]
    pub data_file: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            logdir: default_logdir(),
            data_file: default_data_file(),
        }
    }
}

impl LoggingConfig {
    /// Full path of the gravity data file
    #[must_use]
    pub fn data_path(&self) -> PathBuf {
        self.logdir.join(&self.data_file)
    }
}

/// Removable-storage copy-out configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsbConfig {
    #[serde(default = "default_mount")]
    pub mount: PathBuf,
    #[serde(default = "default_copy_patterns")]
    pub patterns: Vec<String>,
    /// Prefix for generated destination directory names (trimmed to 8 chars)
    #[serde(default = "default_copy_prefix")]
    pub prefix: String,
    /// Destination directory naming scheme: "date" or "uuid"
    #[serde(default = "default_copy_scheme")]
    pub scheme: String,
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
}

impl Default for UsbConfig {
    fn default() -> Self {
        Self {
            mount: default_mount(),
            patterns: default_copy_patterns(),
            prefix: default_copy_prefix(),
            scheme: default_copy_scheme(),
            poll_interval_secs: default_poll_interval_secs(),
        }
    }
}

/// GPIO LED notification configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GpioConfig {
    #[serde(default = "default_gpio_enabled")]
    pub enabled: bool,
    #[serde(default = "default_data_pin")]
    pub data_pin: u8,
    #[serde(default = "default_usb_pin")]
    pub usb_pin: u8,
    /// Half-period of a blink in milliseconds
    #[serde(default = "default_blink_interval_ms")]
    pub blink_interval_ms: u64,
}

impl Default for GpioConfig {
    fn default() -> Self {
        Self {
            enabled: default_gpio_enabled(),
            data_pin: default_data_pin(),
            usb_pin: default_usb_pin(),
            blink_interval_ms: default_blink_interval_ms(),
        }
    }
}

/// GPS time synchronization configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeSyncConfig {
    #[serde(default = "default_timesync_enabled")]
    pub enabled: bool,
    /// Sync every N data lines
    #[serde(default = "default_timesync_interval")]
    pub interval: u64,
}

impl Default for TimeSyncConfig {
    fn default() -> Self {
        Self {
            enabled: default_timesync_enabled(),
            interval: default_timesync_interval(),
        }
    }
}

/// Install-path overrides
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstallConfig {
    #[serde(default = "default_prefix")]
    pub prefix: PathBuf,
    #[serde(default = "default_unit_dir")]
    pub unit_dir: PathBuf,
    #[serde(default = "default_udev_dir")]
    pub udev_dir: PathBuf,
    #[serde(default = "default_config_dir")]
    pub config_dir: PathBuf,
    #[serde(default = "default_logrotate_dir")]
    pub logrotate_dir: PathBuf,
}

impl Default for InstallConfig {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
            unit_dir: default_unit_dir(),
            udev_dir: default_udev_dir(),
            config_dir: default_config_dir(),
            logrotate_dir: default_logrotate_dir(),
        }
    }
}

// Default value functions for serde

fn default_serial_port() -> String {
    "/dev/serial0".to_string()
}

fn default_baudrate() -> u32 {
    57600
}

fn default_parity() -> String {
    "none".to_string()
}

fn default_stopbits() -> u8 {
    1
}

fn default_read_timeout_ms() -> u64 {
    100
}

fn default_logdir() -> PathBuf {
    PathBuf::from("/var/log/atgmlogger")
}

fn default_data_file() -> String {
    "gravdata.dat".to_string()
}

fn default_mount() -> PathBuf {
    PathBuf::from(paths::MOUNT_POINT)
}

fn default_copy_patterns() -> Vec<String> {
    ["*.dat", "*.dat.*", "*.log", "*.gz"]
        .iter()
        .map(ToString::to_string)
        .collect()
}

fn default_copy_prefix() -> String {
    "DATA".to_string()
}

fn default_copy_scheme() -> String {
    "date".to_string()
}

fn default_poll_interval_secs() -> u64 {
    2
}

fn default_gpio_enabled() -> bool {
    true
}

fn default_data_pin() -> u8 {
    11
}

fn default_usb_pin() -> u8 {
    13
}

fn default_blink_interval_ms() -> u64 {
    40
}

fn default_timesync_enabled() -> bool {
    true
}

fn default_timesync_interval() -> u64 {
    1000
}

fn default_prefix() -> PathBuf {
    PathBuf::from(paths::DEFAULT_PREFIX)
}

fn default_unit_dir() -> PathBuf {
    PathBuf::from(paths::UNIT_DIR)
}

fn default_udev_dir() -> PathBuf {
    PathBuf::from(paths::UDEV_DIR)
}

fn default_config_dir() -> PathBuf {
    PathBuf::from(paths::CONFIG_DIR)
}

fn default_logrotate_dir() -> PathBuf {
    PathBuf::from(paths::LOGROTATE_DIR)
}

impl Config {
    /// Parse a configuration from TOML text
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid TOML for this schema.
    pub fn from_toml(contents: &str) -> Result<Self, Error> {
        toml::from_str(contents)
            .map_err(|e| ConfigError::ParseError {
                message: e.to_string(),
            })
            .map_err(Into::into)
    }

    /// Load configuration from a specific file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub async fn load_from_file(path: &Path) -> Result<Self, Error> {
        let contents = fs::read_to_string(path)
            .await
            .map_err(|e| ConfigError::ReadError {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;

        let mut config = Self::from_toml(&contents)?;
        config.loaded_from = Some(path.to_path_buf());
        Ok(config)
    }

    /// Load configuration from the search path, falling back to defaults
    ///
    /// When `explicit` is given the search path is skipped and the file must
    /// exist; otherwise the first readable candidate wins and a missing file
    /// everywhere yields the compiled-in defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if an explicit file cannot be read, or a candidate
    /// exists but does not parse.
    pub async fn load_or_default(explicit: Option<&Path>) -> Result<Self, Error> {
        if let Some(path) = explicit {
            return Self::load_from_file(path).await;
        }

        for candidate in paths::config_search_paths() {
            if candidate.exists() {
                return Self::load_from_file(&candidate).await;
            }
        }

        Ok(Self::default())
    }

    /// Merge environment variable overrides
    ///
    /// `ATGMLOGGER_DEVICE`, `ATGMLOGGER_LOGDIR` and `ATGMLOGGER_MOUNTDIR`
    /// override their respective keys.
    pub fn merge_env(&mut self) {
        if let Ok(device) = std::env::var("ATGMLOGGER_DEVICE") {
            self.serial.port = device;
        }
        if let Ok(logdir) = std::env::var("ATGMLOGGER_LOGDIR") {
            self.logging.logdir = PathBuf::from(logdir);
        }
        if let Ok(mountdir) = std::env::var("ATGMLOGGER_MOUNTDIR") {
            self.usb.mount = PathBuf::from(mountdir);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = Config::default();
        assert_eq!(config.serial.port, "/dev/serial0");
        assert_eq!(config.serial.baudrate, 57600);
        assert_eq!(config.logging.data_path().file_name().unwrap(), "gravdata.dat");
        assert_eq!(config.usb.mount, PathBuf::from("/media/removable"));
        assert_eq!(config.timesync.interval, 1000);
        assert_eq!(config.install.prefix, PathBuf::from("/opt"));
    }

    #[test]
    fn partial_file_fills_missing_sections() {
        let config = Config::from_toml(
            r#"
            [serial]
            port = "/dev/ttyUSB0"
            baudrate = 115200
            "#,
        )
        .expect("parse");

        assert_eq!(config.serial.port, "/dev/ttyUSB0");
        assert_eq!(config.serial.baudrate, 115200);
        // Untouched sections come from defaults
        assert_eq!(config.serial.stopbits, 1);
        assert_eq!(config.gpio.data_pin, 11);
        assert!(config.timesync.enabled);
    }

    #[test]
    fn invalid_toml_is_a_parse_error() {
        let err = Config::from_toml("[serial\nport=").unwrap_err();
        assert!(matches!(
            err,
            Error::Config(ConfigError::ParseError { .. })
        ));
    }

    #[tokio::test]
    async fn load_from_file_records_origin() {
        let dir = tempfile::TempDir::new().expect("tempdir");
        let path = dir.path().join("config.toml");
        tokio::fs::write(&path, "[logging]\nlogdir = \"/tmp/atgm\"\n")
            .await
            .expect("write");

        let config = Config::load_from_file(&path).await.expect("load");
        assert_eq!(config.logging.logdir, PathBuf::from("/tmp/atgm"));
        assert_eq!(config.loaded_from.as_deref(), Some(path.as_path()));
    }

    #[tokio::test]
    async fn missing_explicit_file_is_fatal() {
        let result = Config::load_or_default(Some(Path::new("/nonexistent/atgm.toml"))).await;
        assert!(result.is_err());
    }
}
