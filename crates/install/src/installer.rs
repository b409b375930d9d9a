//! Installer implementation
//!
//! Validate-then-copy: every disk source is checked before the first write
//! so a failed install never leaves partial unit files behind. Service
//! manager failures after the copy phase are surfaced as warnings, not
//! rolled back.

use std::path::PathBuf;
use std::sync::Arc;

use atgmlogger_config::{paths as fixed, Config};
use atgmlogger_errors::{Error, InstallError};
use atgmlogger_events::{AppEvent, EventEmitter, EventSender, InstallEvent};
use atgmlogger_platform::{fs, UnitManager};
use tracing::{debug, warn};

use crate::manifest::{self, FileSource};
use crate::paths::InstallPaths;

/// Install invocation options
#[derive(Debug, Clone)]
pub struct InstallOptions {
    /// Staging root for packaging (`DESTDIR`)
    pub destdir: Option<PathBuf>,
    /// Install prefix override (`PREFIX`)
    pub prefix: Option<PathBuf>,
    /// Daemon executable to deploy; defaults to the running executable
    pub exec_path: Option<PathBuf>,
    /// Enable the units after installing (live installs only)
    pub enable: bool,
    /// Start the service after enabling
    pub start: bool,
}

impl Default for InstallOptions {
    fn default() -> Self {
        Self {
            destdir: None,
            prefix: None,
            exec_path: None,
            enable: true,
            start: false,
        }
    }
}

/// Result of a completed install
#[derive(Debug)]
pub struct InstallReport {
    /// Effective root ("/" unless staged)
    pub root: PathBuf,
    /// Installed files with their modes
    pub files: Vec<(PathBuf, u32)>,
    /// Whether units were enabled
    pub enabled: bool,
    /// Whether the service was started
    pub started: bool,
    /// Non-fatal service-manager failures
    pub warnings: Vec<String>,
}

/// System installer/uninstaller
pub struct Installer {
    pub(crate) config: Config,
    pub(crate) units: Arc<dyn UnitManager>,
    pub(crate) events: Option<EventSender>,
}

impl Installer {
    pub fn new(config: Config, units: Arc<dyn UnitManager>) -> Self {
        Self {
            config,
            units,
            events: None,
        }
    }

    /// Attach an event channel for progress reporting
    #[must_use]
    pub fn with_events(mut self, events: EventSender) -> Self {
        self.events = Some(events);
        self
    }

    /// Install the daemon, configuration, units and udev rule
    ///
    /// # Errors
    ///
    /// Returns an error if a disk source is missing (nothing is written in
    /// that case), or a write to a destination fails.
    pub async fn install(&self, opts: &InstallOptions) -> Result<InstallReport, Error> {
        let paths = InstallPaths::resolve(&self.config, opts.destdir.clone(), opts.prefix.clone());
        if !paths.is_staged() && !cfg!(target_os = "linux") {
            return Err(InstallError::UnsupportedPlatform.into());
        }

        let exec_path = resolve_exec_path(opts.exec_path.clone())?;
        let files = manifest::manifest(&paths, &exec_path)?;

        // Validate every disk source before the first write
        for file in &files {
            if let FileSource::Disk(src) = &file.source {
                if !fs::exists(src).await {
                    return Err(InstallError::MissingSource {
                        path: src.display().to_string(),
                    }
                    .into());
                }
            }
        }

        let root = paths
            .destdir
            .clone()
            .unwrap_or_else(|| PathBuf::from("/"));
        self.emit(AppEvent::Install(InstallEvent::Started { root: root.clone() }));
        self.emit(AppEvent::Install(InstallEvent::UnitRendered {
            unit: fixed::SERVICE_UNIT.to_string(),
        }));

        for (dir, mode) in manifest::directories(&paths) {
            fs::create_dir_all_mode(&paths.staged(&dir), mode).await?;
        }

        let mut installed = Vec::with_capacity(files.len());
        for file in &files {
            let dest = paths.staged(&file.dest);
            debug!(label = file.label, dest = %dest.display(), "installing");
            match &file.source {
                FileSource::Embedded(content) => {
                    fs::write_bytes(&dest, content.as_bytes(), file.mode).await?;
                }
                FileSource::Rendered(content) => {
                    fs::write_bytes(&dest, content.as_bytes(), file.mode).await?;
                }
                FileSource::Disk(src) => {
                    // Re-running install from the installed binary makes
                    // source and destination the same file; copying would
                    // truncate it
                    if *src == dest {
                        fs::set_mode(&dest, file.mode).await?;
                    } else {
                        fs::copy_with_mode(src, &dest, file.mode).await?;
                    }
                }
            }
            self.emit(AppEvent::Install(InstallEvent::FileInstalled {
                dest: file.dest.clone(),
                mode: file.mode,
            }));
            installed.push((file.dest.clone(), file.mode));
        }

        let mut warnings = Vec::new();
        let mut enabled = false;
        let mut started = false;

        if paths.is_staged() {
            debug!("staged install, skipping service-manager lifecycle");
        } else {
            self.lifecycle(opts, &mut warnings, &mut enabled, &mut started)
                .await;
        }

        self.emit(AppEvent::Install(InstallEvent::Completed {
            files: installed.len(),
        }));

        Ok(InstallReport {
            root,
            files: installed,
            enabled,
            started,
            warnings,
        })
    }

    /// Post-copy unit lifecycle; failures are warnings, never rollbacks
    async fn lifecycle(
        &self,
        opts: &InstallOptions,
        warnings: &mut Vec<String>,
        enabled: &mut bool,
        started: &mut bool,
    ) {
        match self.units.daemon_reload().await {
            Ok(()) => self.emit(AppEvent::Install(InstallEvent::DaemonReloaded)),
            Err(e) => self.lifecycle_warning(warnings, format!("daemon-reload failed: {e}")),
        }

        if opts.enable {
            let mut all_enabled = true;
            for unit in [fixed::MOUNT_UNIT, fixed::SERVICE_UNIT] {
                match self.units.enable(unit).await {
                    Ok(()) => self.emit(AppEvent::Install(InstallEvent::UnitEnabled {
                        unit: unit.to_string(),
                    })),
                    Err(e) => {
                        all_enabled = false;
                        self.lifecycle_warning(warnings, format!("enable {unit} failed: {e}"));
                    }
                }
            }
            *enabled = all_enabled;
        }

        if opts.start {
            match self.units.start(fixed::SERVICE_UNIT).await {
                Ok(()) => {
                    *started = true;
                    self.emit(AppEvent::Install(InstallEvent::UnitStarted {
                        unit: fixed::SERVICE_UNIT.to_string(),
                    }));
                }
                Err(e) => self.lifecycle_warning(
                    warnings,
                    format!("start {} failed: {e}", fixed::SERVICE_UNIT),
                ),
            }
        }
    }

    fn lifecycle_warning(&self, warnings: &mut Vec<String>, message: String) {
        warn!("{message}");
        self.emit_warning(message.clone());
        warnings.push(message);
    }
}

impl EventEmitter for Installer {
    fn event_sender(&self) -> Option<&EventSender> {
        self.events.as_ref()
    }
}

fn resolve_exec_path(explicit: Option<PathBuf>) -> Result<PathBuf, Error> {
    match explicit {
        Some(path) => Ok(path),
        None => std::env::current_exe().map_err(|e| {
            InstallError::ExecutablePathUnknown {
                message: e.to_string(),
            }
            .into()
        }),
    }
}
