//! End-to-end install/uninstall flows against a staging root and a fake
//! service manager.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use atgmlogger_config::Config;
use atgmlogger_errors::{Error, InstallError, PlatformError};
use atgmlogger_install::{InstallOptions, Installer, UninstallOptions};
use atgmlogger_platform::UnitManager;
use tempfile::TempDir;

/// Records lifecycle requests; optionally fails selected operations.
#[derive(Default)]
struct FakeUnitManager {
    calls: Mutex<Vec<String>>,
    fail_reload: bool,
    fail_stop: bool,
}

impl FakeUnitManager {
    fn recorded(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl UnitManager for FakeUnitManager {
    async fn daemon_reload(&self) -> Result<(), Error> {
        self.record("daemon-reload".into());
        if self.fail_reload {
            return Err(PlatformError::CommandFailed {
                command: "systemctl daemon-reload".into(),
                code: 1,
                stderr: "bus unavailable".into(),
            }
            .into());
        }
        Ok(())
    }

    async fn enable(&self, unit: &str) -> Result<(), Error> {
        self.record(format!("enable {unit}"));
        Ok(())
    }

    async fn disable(&self, unit: &str) -> Result<(), Error> {
        self.record(format!("disable {unit}"));
        Ok(())
    }

    async fn start(&self, unit: &str) -> Result<(), Error> {
        self.record(format!("start {unit}"));
        Ok(())
    }

    async fn stop(&self, unit: &str) -> Result<(), Error> {
        self.record(format!("stop {unit}"));
        if self.fail_stop {
            return Err(PlatformError::CommandFailed {
                command: format!("systemctl stop {unit}"),
                code: 5,
                stderr: format!("{unit} not loaded"),
            }
            .into());
        }
        Ok(())
    }

    async fn is_active(&self, _unit: &str) -> bool {
        false
    }
}

fn fake_daemon_binary(dir: &Path) -> PathBuf {
    let path = dir.join("atgmlogger-bin");
    std::fs::write(&path, b"#!ELF fake\n").expect("write fake binary");
    path
}

/// Paths routed into the tempdir so live-mode installs stay sandboxed.
fn sandboxed_config(root: &Path) -> Config {
    let mut config = Config::default();
    config.install.prefix = root.join("opt");
    config.install.unit_dir = root.join("lib/systemd/system");
    config.install.udev_dir = root.join("etc/udev/rules.d");
    config.install.config_dir = root.join("etc/atgmlogger");
    config.install.logrotate_dir = root.join("etc/logrotate.d");
    config.usb.mount = root.join("media/removable");
    config.logging.logdir = root.join("var/log/atgmlogger");
    config
}

fn file_mode(path: &Path) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path).expect("metadata").permissions().mode() & 0o7777
}

#[tokio::test]
async fn staged_install_places_every_file_with_declared_mode() {
    let stage = TempDir::new().expect("tempdir");
    let exec = fake_daemon_binary(stage.path());

    let installer = Installer::new(Config::default(), Arc::new(FakeUnitManager::default()));
    let report = installer
        .install(&InstallOptions {
            destdir: Some(stage.path().join("root")),
            exec_path: Some(exec),
            ..InstallOptions::default()
        })
        .await
        .expect("install");

    assert_eq!(report.files.len(), 7);
    for (dest, mode) in &report.files {
        let staged = stage
            .path()
            .join("root")
            .join(dest.strip_prefix("/").unwrap());
        assert!(staged.exists(), "missing {}", staged.display());
        assert_eq!(file_mode(&staged), *mode, "mode of {}", staged.display());
    }

    // Staged installs never touch the service manager
    let service = stage
        .path()
        .join("root/lib/systemd/system/atgmlogger.service");
    let rendered = std::fs::read_to_string(service).expect("read unit");
    assert!(rendered.contains("WorkingDirectory=/opt/atgmlogger"));
    assert!(!rendered.contains('@'));
    assert!(report.warnings.is_empty());
    assert!(!report.enabled);
}

#[tokio::test]
async fn installing_twice_yields_identical_state() {
    let stage = TempDir::new().expect("tempdir");
    let exec = fake_daemon_binary(stage.path());
    let destdir = stage.path().join("root");

    let installer = Installer::new(Config::default(), Arc::new(FakeUnitManager::default()));
    let opts = InstallOptions {
        destdir: Some(destdir.clone()),
        exec_path: Some(exec),
        ..InstallOptions::default()
    };

    let snapshot = |report: &atgmlogger_install::InstallReport| {
        report
            .files
            .iter()
            .map(|(dest, mode)| {
                let staged = destdir.join(dest.strip_prefix("/").unwrap());
                let content = std::fs::read(&staged).expect("read");
                (dest.clone(), *mode, content, file_mode(&staged))
            })
            .collect::<Vec<_>>()
    };

    let first = installer.install(&opts).await.expect("first install");
    let state_one = snapshot(&first);
    let second = installer.install(&opts).await.expect("second install");
    let state_two = snapshot(&second);

    assert_eq!(state_one, state_two);
}

#[tokio::test]
async fn missing_daemon_binary_aborts_before_any_write() {
    let stage = TempDir::new().expect("tempdir");
    let destdir = stage.path().join("root");

    let installer = Installer::new(Config::default(), Arc::new(FakeUnitManager::default()));
    let err = installer
        .install(&InstallOptions {
            destdir: Some(destdir.clone()),
            exec_path: Some(stage.path().join("no-such-binary")),
            ..InstallOptions::default()
        })
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        Error::Install(InstallError::MissingSource { .. })
    ));
    // Nothing was registered or written
    assert!(!destdir.exists());
}

#[tokio::test]
async fn live_install_enables_units_and_uninstall_reverses_it() {
    let root = TempDir::new().expect("tempdir");
    let exec = fake_daemon_binary(root.path());
    let config = sandboxed_config(root.path());

    let units = Arc::new(FakeUnitManager::default());
    let installer = Installer::new(config, Arc::clone(&units) as Arc<dyn UnitManager>);

    let report = installer
        .install(&InstallOptions {
            exec_path: Some(exec),
            start: true,
            ..InstallOptions::default()
        })
        .await
        .expect("install");

    assert!(report.enabled);
    assert!(report.started);
    assert_eq!(
        units.recorded(),
        vec![
            "daemon-reload",
            "enable media-removable.mount",
            "enable atgmlogger.service",
            "start atgmlogger.service",
        ]
    );

    let unit_path = root.path().join("lib/systemd/system/atgmlogger.service");
    assert!(unit_path.exists());

    let result = installer
        .uninstall(&UninstallOptions::default())
        .await
        .expect("uninstall");

    assert_eq!(result.removed.len(), report.files.len());
    for (dest, _) in &report.files {
        assert!(!dest.exists(), "{} still present", dest.display());
    }
    let calls = units.recorded();
    assert!(calls.contains(&"stop atgmlogger.service".to_string()));
    assert!(calls.contains(&"disable atgmlogger.service".to_string()));
    assert!(calls.contains(&"stop media-removable.mount".to_string()));
    assert!(calls.contains(&"disable media-removable.mount".to_string()));
}

#[tokio::test]
async fn uninstall_proceeds_when_service_manager_fails() {
    let root = TempDir::new().expect("tempdir");
    let exec = fake_daemon_binary(root.path());
    let config = sandboxed_config(root.path());

    let units = Arc::new(FakeUnitManager {
        fail_reload: true,
        fail_stop: true,
        ..FakeUnitManager::default()
    });
    let installer = Installer::new(config, Arc::clone(&units) as Arc<dyn UnitManager>);

    installer
        .install(&InstallOptions {
            exec_path: Some(exec),
            enable: false,
            ..InstallOptions::default()
        })
        .await
        .expect("install");

    let result = installer
        .uninstall(&UninstallOptions::default())
        .await
        .expect("uninstall");

    // Stops and the reload failed, files are gone anyway
    assert!(!result.warnings.is_empty());
    assert!(!result.removed.is_empty());
    let unit_path = root.path().join("lib/systemd/system/atgmlogger.service");
    assert!(!unit_path.exists());
}

#[tokio::test]
async fn uninstall_on_clean_system_is_a_no_op() {
    let root = TempDir::new().expect("tempdir");
    let config = sandboxed_config(root.path());
    let installer = Installer::new(config, Arc::new(FakeUnitManager::default()));

    let result = installer
        .uninstall(&UninstallOptions::default())
        .await
        .expect("uninstall");
    assert!(result.removed.is_empty());
}
