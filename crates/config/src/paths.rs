//! Well-known filesystem locations
//!
//! These are the fixed names the installer, the daemon and the unit files
//! all agree on. Install-time overrides go through `InstallConfig`.

use std::path::PathBuf;

/// Default install prefix
pub const DEFAULT_PREFIX: &str = "/opt";

/// Application directory name under the prefix
pub const APP_DIR_NAME: &str = "atgmlogger";

/// System configuration directory
pub const CONFIG_DIR: &str = "/etc/atgmlogger";

/// Configuration file name
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Systemd unit directory
pub const UNIT_DIR: &str = "/lib/systemd/system";

/// Udev rules directory
pub const UDEV_DIR: &str = "/etc/udev/rules.d";

/// Logrotate drop-in directory
pub const LOGROTATE_DIR: &str = "/etc/logrotate.d";

/// Removable-media mount point (must match the mount unit name)
pub const MOUNT_POINT: &str = "/media/removable";

/// Service unit file name
pub const SERVICE_UNIT: &str = "atgmlogger.service";

/// Mount unit file name (systemd derives it from the mount point)
pub const MOUNT_UNIT: &str = "media-removable.mount";

/// Udev rules file name
pub const UDEV_RULES: &str = "90-removable-storage.rules";

/// Logrotate conf file name
pub const LOGROTATE_CONF: &str = "atgmlogger";

/// Daemon binary name installed into the application directory
pub const DAEMON_BIN: &str = "atgmlogger";

/// Configuration search path, in priority order
#[must_use]
pub fn config_search_paths() -> Vec<PathBuf> {
    let mut candidates = Vec::with_capacity(3);
    if let Ok(home) = std::env::var("HOME") {
        candidates.push(PathBuf::from(home).join(".atgmlogger.toml"));
    }
    candidates.push(
        PathBuf::from(DEFAULT_PREFIX)
            .join(APP_DIR_NAME)
            .join(CONFIG_FILE_NAME),
    );
    candidates.push(PathBuf::from(CONFIG_DIR).join(CONFIG_FILE_NAME));
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_path_ends_at_etc() {
        let paths = config_search_paths();
        assert_eq!(
            paths.last().unwrap(),
            &PathBuf::from("/etc/atgmlogger/config.toml")
        );
    }
}
