//! Install manifest
//!
//! The static table of (source, destination, mode) triples the installer
//! deploys. Destinations are absolute; staging is the installer's job.

use std::path::{Path, PathBuf};

use atgmlogger_config::paths as fixed;
use atgmlogger_errors::Error;

use crate::paths::InstallPaths;
use crate::template::render_service_unit;

/// Embedded declarative assets
pub mod assets {
    /// Service unit template (tokens: `@EXECPATH@`, `@APPDIR@`)
    pub const SERVICE_TEMPLATE: &str = include_str!("../assets/atgmlogger.service.in");
    /// Mount unit for the removable-media mount point
    pub const MOUNT_UNIT: &str = include_str!("../assets/media-removable.mount");
    /// Udev rule creating the stable device symlink
    pub const UDEV_RULES: &str = include_str!("../assets/90-removable-storage.rules");
    /// Default daemon configuration
    pub const DEFAULT_CONFIG: &str = include_str!("../assets/config.toml");
    /// Logrotate policy for the data/application logs
    pub const LOGROTATE_CONF: &str = include_str!("../assets/atgmlogger.logrotate");
}

/// Where an installed file's content comes from
#[derive(Debug, Clone)]
pub enum FileSource {
    /// Compiled-in asset
    Embedded(&'static str),
    /// File on disk (the daemon executable)
    Disk(PathBuf),
    /// Rendered at install time (the service unit)
    Rendered(String),
}

/// One entry of the install manifest
#[derive(Debug, Clone)]
pub struct InstallFile {
    pub label: &'static str,
    pub source: FileSource,
    pub dest: PathBuf,
    pub mode: u32,
}

enum Payload {
    DaemonBinary,
    AppConfig,
    EtcConfig,
    ServiceUnit,
    MountUnit,
    UdevRule,
    LogrotateConf,
}

fn entries(paths: &InstallPaths) -> Vec<(Payload, &'static str, PathBuf, u32)> {
    let app_dir = paths.app_dir();
    vec![
        (
            Payload::DaemonBinary,
            "daemon binary",
            app_dir.join(fixed::DAEMON_BIN),
            0o755,
        ),
        (
            Payload::AppConfig,
            "reference config",
            app_dir.join(fixed::CONFIG_FILE_NAME),
            0o644,
        ),
        (
            Payload::EtcConfig,
            "system config",
            paths.config_dir.join(fixed::CONFIG_FILE_NAME),
            0o644,
        ),
        (
            Payload::ServiceUnit,
            "service unit",
            paths.unit_dir.join(fixed::SERVICE_UNIT),
            0o644,
        ),
        (
            Payload::MountUnit,
            "mount unit",
            paths.unit_dir.join(fixed::MOUNT_UNIT),
            0o644,
        ),
        (
            Payload::UdevRule,
            "udev rule",
            paths.udev_dir.join(fixed::UDEV_RULES),
            0o644,
        ),
        (
            Payload::LogrotateConf,
            "logrotate conf",
            paths.logrotate_dir.join(fixed::LOGROTATE_CONF),
            0o644,
        ),
    ]
}

/// Build the full manifest, rendering the service unit
///
/// # Errors
///
/// Returns an error if template rendering leaves an unresolved token.
pub fn manifest(paths: &InstallPaths, exec_path: &Path) -> Result<Vec<InstallFile>, Error> {
    let app_dir = paths.app_dir();
    let service_unit = render_service_unit(
        assets::SERVICE_TEMPLATE,
        &exec_path.display().to_string(),
        &app_dir.display().to_string(),
    )?;

    entries(paths)
        .into_iter()
        .map(|(payload, label, dest, mode)| {
            let source = match payload {
                Payload::DaemonBinary => FileSource::Disk(exec_path.to_path_buf()),
                Payload::AppConfig | Payload::EtcConfig => {
                    FileSource::Embedded(assets::DEFAULT_CONFIG)
                }
                Payload::ServiceUnit => FileSource::Rendered(service_unit.clone()),
                Payload::MountUnit => FileSource::Embedded(assets::MOUNT_UNIT),
                Payload::UdevRule => FileSource::Embedded(assets::UDEV_RULES),
                Payload::LogrotateConf => FileSource::Embedded(assets::LOGROTATE_CONF),
            };
            Ok(InstallFile {
                label,
                source,
                dest,
                mode,
            })
        })
        .collect()
}

/// Destination paths only (what uninstall needs)
#[must_use]
pub fn destinations(paths: &InstallPaths) -> Vec<PathBuf> {
    entries(paths)
        .into_iter()
        .map(|(_, _, dest, _)| dest)
        .collect()
}

/// Directories the installer guarantees before copying, with modes
#[must_use]
pub fn directories(paths: &InstallPaths) -> Vec<(PathBuf, u32)> {
    vec![
        (paths.app_dir(), 0o755),
        (paths.config_dir.clone(), 0o755),
        (paths.unit_dir.clone(), 0o755),
        (paths.udev_dir.clone(), 0o755),
        (paths.logrotate_dir.clone(), 0o755),
        (paths.mount_point.clone(), 0o755),
        (paths.logdir.clone(), 0o750),
    ]
}
