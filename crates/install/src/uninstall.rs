//! Uninstaller implementation
//!
//! Maximal cleanup: unit stop/disable and cache reload failures are
//! tolerated and recorded, and file removal proceeds regardless so the
//! system ends up as clean as privileges allow.

use std::path::PathBuf;

use atgmlogger_config::paths as fixed;
use atgmlogger_errors::Error;
use atgmlogger_events::{AppEvent, EventEmitter, UninstallEvent};
use atgmlogger_platform::fs;
use tracing::{debug, warn};

use crate::installer::Installer;
use crate::manifest;
use crate::paths::InstallPaths;

/// Uninstall invocation options
#[derive(Debug, Clone, Default)]
pub struct UninstallOptions {
    /// Staging root the install was made into (`DESTDIR`)
    pub destdir: Option<PathBuf>,
    /// Install prefix override (`PREFIX`)
    pub prefix: Option<PathBuf>,
}

/// Result of a completed uninstall
#[derive(Debug)]
pub struct UninstallReport {
    /// Files actually removed
    pub removed: Vec<PathBuf>,
    /// Tolerated failures (units already stopped, reload failed, ...)
    pub warnings: Vec<String>,
}

impl Installer {
    /// Stop and disable the units, then remove every installed file
    ///
    /// # Errors
    ///
    /// This is intentionally hard to fail; only path staging errors
    /// propagate. Everything else is downgraded to a warning.
    pub async fn uninstall(&self, opts: &UninstallOptions) -> Result<UninstallReport, Error> {
        let paths = InstallPaths::resolve(&self.config, opts.destdir.clone(), opts.prefix.clone());
        self.emit(AppEvent::Uninstall(UninstallEvent::Started));

        let mut warnings = Vec::new();

        if !paths.is_staged() {
            // Stop and disable; a unit that is already stopped or was never
            // installed is not an error.
            for unit in [fixed::SERVICE_UNIT, fixed::MOUNT_UNIT] {
                match self.units.stop(unit).await {
                    Ok(()) => self.emit(AppEvent::Uninstall(UninstallEvent::UnitStopped {
                        unit: unit.to_string(),
                    })),
                    Err(e) => {
                        debug!("stop {unit}: {e}");
                        warnings.push(format!("stop {unit}: {e}"));
                    }
                }
                match self.units.disable(unit).await {
                    Ok(()) => self.emit(AppEvent::Uninstall(UninstallEvent::UnitDisabled {
                        unit: unit.to_string(),
                    })),
                    Err(e) => {
                        debug!("disable {unit}: {e}");
                        warnings.push(format!("disable {unit}: {e}"));
                    }
                }
            }

            // Removal proceeds even when the reload fails
            if let Err(e) = self.units.daemon_reload().await {
                warn!("daemon-reload failed during uninstall: {e}");
                warnings.push(format!("daemon-reload: {e}"));
            }
        }

        let mut removed = Vec::new();
        for dest in manifest::destinations(&paths) {
            let staged = paths.staged(&dest);
            match fs::remove_file_if_exists(&staged).await {
                Ok(true) => {
                    self.emit(AppEvent::Uninstall(UninstallEvent::FileRemoved {
                        dest: dest.clone(),
                    }));
                    removed.push(dest);
                }
                Ok(false) => {}
                Err(e) => {
                    warn!("failed to remove {}: {e}", staged.display());
                    warnings.push(format!("remove {}: {e}", staged.display()));
                }
            }
        }

        // Prune directories this package owns, where empty
        for dir in [paths.app_dir(), paths.config_dir.clone()] {
            fs::remove_dir_if_empty(&paths.staged(&dir)).await;
        }

        self.emit(AppEvent::Uninstall(UninstallEvent::Completed {
            files: removed.len(),
        }));

        Ok(UninstallReport { removed, warnings })
    }
}
