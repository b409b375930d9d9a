//! Install-path resolution
//!
//! All variables are resolved once per invocation and baked into the
//! generated files. Destinations are kept absolute; staging under a
//! `DESTDIR` root happens at write time via [`InstallPaths::staged`].

use std::path::{Path, PathBuf};

use atgmlogger_config::{paths, Config};

/// Resolved install locations for one install/uninstall invocation
#[derive(Debug, Clone)]
pub struct InstallPaths {
    /// Staging root for packaging; `None` installs live
    pub destdir: Option<PathBuf>,
    /// Final install prefix (default `/opt`)
    pub prefix: PathBuf,
    /// Systemd unit directory
    pub unit_dir: PathBuf,
    /// Udev rules directory
    pub udev_dir: PathBuf,
    /// System configuration directory
    pub config_dir: PathBuf,
    /// Logrotate drop-in directory
    pub logrotate_dir: PathBuf,
    /// Removable-media mount point
    pub mount_point: PathBuf,
    /// Daemon log directory
    pub logdir: PathBuf,
}

impl InstallPaths {
    /// Resolve paths from configuration plus invocation overrides
    #[must_use]
    pub fn resolve(config: &Config, destdir: Option<PathBuf>, prefix: Option<PathBuf>) -> Self {
        Self {
            destdir,
            prefix: prefix.unwrap_or_else(|| config.install.prefix.clone()),
            unit_dir: config.install.unit_dir.clone(),
            udev_dir: config.install.udev_dir.clone(),
            config_dir: config.install.config_dir.clone(),
            logrotate_dir: config.install.logrotate_dir.clone(),
            mount_point: config.usb.mount.clone(),
            logdir: config.logging.logdir.clone(),
        }
    }

    /// Application directory under the prefix
    #[must_use]
    pub fn app_dir(&self) -> PathBuf {
        self.prefix.join(paths::APP_DIR_NAME)
    }

    /// Whether this invocation stages into a `DESTDIR`
    #[must_use]
    pub fn is_staged(&self) -> bool {
        self.destdir.is_some()
    }

    /// Map an absolute destination onto the staging root, if any
    #[must_use]
    pub fn staged(&self, absolute: &Path) -> PathBuf {
        match &self.destdir {
            Some(root) => {
                let relative = absolute.strip_prefix("/").unwrap_or(absolute);
                root.join(relative)
            }
            None => absolute.to_path_buf(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn staged_strips_leading_slash() {
        let mut config = Config::default();
        config.install.prefix = PathBuf::from("/opt");
        let paths = InstallPaths::resolve(&config, Some(PathBuf::from("/tmp/stage")), None);
        assert_eq!(
            paths.staged(Path::new("/lib/systemd/system/atgmlogger.service")),
            PathBuf::from("/tmp/stage/lib/systemd/system/atgmlogger.service")
        );
    }

    #[test]
    fn live_paths_pass_through() {
        let config = Config::default();
        let paths = InstallPaths::resolve(&config, None, None);
        assert!(!paths.is_staged());
        assert_eq!(
            paths.staged(Path::new("/etc/atgmlogger/config.toml")),
            PathBuf::from("/etc/atgmlogger/config.toml")
        );
        assert_eq!(paths.app_dir(), PathBuf::from("/opt/atgmlogger"));
    }

    #[test]
    fn prefix_override_wins_over_config() {
        let config = Config::default();
        let paths = InstallPaths::resolve(&config, None, Some(PathBuf::from("/usr/local")));
        assert_eq!(paths.app_dir(), PathBuf::from("/usr/local/atgmlogger"));
    }
}
