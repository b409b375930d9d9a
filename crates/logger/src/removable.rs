//! Removable-storage copy-out
//!
//! The mount unit (installed by this package) mounts a flagged USB stick
//! at a fixed path; this watcher notices the mount, copies the accumulated
//! data/log files onto it, honors trigger files found in the device root,
//! then syncs and unmounts so the stick can be pulled.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use atgmlogger_config::Config;
use atgmlogger_errors::{Error, StorageError};
use atgmlogger_events::{AppEvent, EventEmitter, EventSender, LoggerEvent};
use chrono::{DateTime, Utc};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, error, info, warn};

use crate::gpio::{GpioCommand, Led};

/// Characters never allowed in generated directory names
const ILLEGAL_NAME_CHARS: &[char] = &['\\', ':', '<', '>', '?', '*', '/', '"'];

/// Maximum prefix length in generated directory names
const PREFIX_MAX: usize = 8;

/// Generate a destination directory name for one copy-out
///
/// The date scheme stamps UTC wall time; note the clock may lag until the
/// first GPS time sync lands.
#[must_use]
pub fn dest_dir_name(scheme: &str, prefix: &str, now: DateTime<Utc>) -> String {
    let base = if scheme.eq_ignore_ascii_case("uuid") {
        uuid::Uuid::new_v4().to_string()
    } else {
        format!("{}UTC", now.format("%y%m%d-%H%M"))
    };

    let trimmed: String = prefix.chars().take(PREFIX_MAX).collect();
    format!("{trimmed}{base}")
        .chars()
        .filter(|c| !ILLEGAL_NAME_CHARS.contains(c))
        .collect()
}

/// Shell-style wildcard match supporting `*` only
#[must_use]
pub fn wildcard_match(pattern: &str, name: &str) -> bool {
    let parts: Vec<&str> = pattern.split('*').collect();
    if parts.len() == 1 {
        return pattern == name;
    }

    let first = parts[0];
    let last = parts[parts.len() - 1];
    if !name.starts_with(first) {
        return false;
    }

    let mut pos = first.len();
    for part in &parts[1..parts.len() - 1] {
        if part.is_empty() {
            continue;
        }
        match name[pos..].find(part) {
            Some(i) => pos = pos + i + part.len(),
            None => return false,
        }
    }

    if last.is_empty() {
        true
    } else {
        name.len() >= pos + last.len() && name[pos..].ends_with(last)
    }
}

/// Trigger files recognized in the device root
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Trigger {
    /// Delete archived logs from the log directory
    Clear,
    /// Write a diagnostics report onto the device
    Diagnostics,
    /// Import a new configuration (effective on restart)
    ImportConfig,
}

fn trigger_kind(name: &str) -> Option<Trigger> {
    let lower = name.to_ascii_lowercase();
    match lower.as_str() {
        "clear" | "clear.txt" => Some(Trigger::Clear),
        "diag" | "diag.txt" | "diagnostic" | "diagnostic.txt" => Some(Trigger::Diagnostics),
        "conf.toml" | "config.toml" => Some(Trigger::ImportConfig),
        _ => None,
    }
}

/// Watches the mount point and runs the copy-out when a device appears
pub struct RemovableStorageWatcher {
    mount: PathBuf,
    logdir: PathBuf,
    patterns: Vec<String>,
    prefix: String,
    scheme: String,
    poll_interval: Duration,
    config_path: Option<PathBuf>,
    gpio: Option<UnboundedSender<GpioCommand>>,
    events: Option<EventSender>,
}

impl RemovableStorageWatcher {
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self {
            mount: config.usb.mount.clone(),
            logdir: config.logging.logdir.clone(),
            patterns: config.usb.patterns.clone(),
            prefix: config.usb.prefix.clone(),
            scheme: config.usb.scheme.clone(),
            poll_interval: Duration::from_secs(config.usb.poll_interval_secs.max(1)),
            config_path: config.loaded_from.clone(),
            gpio: None,
            events: None,
        }
    }

    /// Blink the USB LED for the duration of a copy-out
    #[must_use]
    pub fn with_gpio(mut self, gpio: UnboundedSender<GpioCommand>) -> Self {
        self.gpio = Some(gpio);
        self
    }

    /// Attach an event channel for progress reporting
    #[must_use]
    pub fn with_events(mut self, events: EventSender) -> Self {
        self.events = Some(events);
        self
    }

    /// Poll the mount point until shutdown
    ///
    /// Fires once per mount: a rising edge runs the copy-out (which ends in
    /// an unmount), after which the next insertion is awaited.
    pub async fn run(self, shutdown: Arc<AtomicBool>) {
        let mut ticker = tokio::time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        let mut was_mounted = false;

        while !shutdown.load(Ordering::Relaxed) {
            ticker.tick().await;

            let mounted = atgmlogger_platform::fs::is_mount_point(&self.mount).await;
            if mounted && !was_mounted {
                info!("removable device detected at {}", self.mount.display());
                if let Err(e) = self.handle_device().await {
                    error!("copy-out failed: {e}");
                }
            }
            was_mounted = atgmlogger_platform::fs::is_mount_point(&self.mount).await;
        }
        debug!("removable-storage watcher exiting");
    }

    /// One full copy-out cycle against a mounted device
    async fn handle_device(&self) -> Result<(), Error> {
        if !atgmlogger_platform::fs::is_mount_point(&self.mount).await {
            return Err(StorageError::NotAMountPoint {
                path: self.mount.display().to_string(),
            }
            .into());
        }

        self.blink(GpioCommand::StartBlink(Led::Usb));
        self.emit(AppEvent::Logger(LoggerEvent::CopyStarted {
            mount: self.mount.clone(),
        }));

        let result = self.copy_logs().await;
        match &result {
            Ok((files, bytes)) => {
                self.emit(AppEvent::Logger(LoggerEvent::CopyCompleted {
                    files: *files,
                    bytes: *bytes,
                }));
            }
            Err(e) => error!("log copy failed: {e}"),
        }

        if let Err(e) = self.watch_files().await {
            warn!("trigger-file scan failed: {e}");
        }

        atgmlogger_platform::fs::sync_disks();
        let unmount = atgmlogger_platform::umount(&self.mount).await;
        self.blink(GpioCommand::StopBlink(Led::Usb));

        result.map(|_| ()).and(unmount)
    }

    /// Copy files matching the configured patterns onto the device
    async fn copy_logs(&self) -> Result<(usize, u64), Error> {
        let files = self.collect_sources().await?;
        let mut total: u64 = 0;
        for path in &files {
            if let Ok(metadata) = tokio::fs::metadata(path).await {
                total += metadata.len();
            }
        }
        info!("copying {} files, {} KiB total", files.len(), total / 1024);

        match atgmlogger_platform::fs::free_space(&self.mount) {
            Ok(free) if free < total => {
                warn!("copy size exceeds free space on device ({free} bytes available)");
                self.emit_warning("data to copy exceeds free space on device");
            }
            Ok(_) => {}
            Err(e) => debug!("free-space check failed: {e}"),
        }

        let dest = self
            .mount
            .join(dest_dir_name(&self.scheme, &self.prefix, Utc::now()));
        if let Err(e) = tokio::fs::create_dir(&dest).await {
            if e.kind() != std::io::ErrorKind::AlreadyExists {
                return Err(Error::io_with_path(&e, &dest));
            }
            warn!("copy destination {} already exists", dest.display());
        }

        let mut copied = 0usize;
        let mut bytes = 0u64;
        for src in &files {
            let Some(name) = src.file_name() else {
                continue;
            };
            let target = dest.join(name);
            match tokio::fs::copy(src, &target).await {
                Ok(n) => {
                    debug!("copied {} to {}", src.display(), target.display());
                    copied += 1;
                    bytes += n;
                }
                Err(e) => {
                    // One bad file should not sink the rest of the batch
                    error!("failed to copy {}: {e}", src.display());
                }
            }
        }
        Ok((copied, bytes))
    }

    /// Files in the log directory matching any configured pattern
    async fn collect_sources(&self) -> Result<Vec<PathBuf>, Error> {
        let mut sources = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.logdir)
            .await
            .map_err(|e| Error::io_with_path(&e, &self.logdir))?;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| Error::io_with_path(&e, &self.logdir))?
        {
            let name = entry.file_name().to_string_lossy().into_owned();
            let is_file = entry.file_type().await.is_ok_and(|t| t.is_file());
            if is_file && self.patterns.iter().any(|p| wildcard_match(p, &name)) {
                sources.push(entry.path());
            }
        }
        sources.sort();
        Ok(sources)
    }

    /// Scan the device root for trigger files and act on them
    async fn watch_files(&self) -> Result<(), Error> {
        let mut entries = tokio::fs::read_dir(&self.mount)
            .await
            .map_err(|e| Error::io_with_path(&e, &self.mount))?;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| Error::io_with_path(&e, &self.mount))?
        {
            let name = entry.file_name().to_string_lossy().into_owned();
            let is_file = entry.file_type().await.is_ok_and(|t| t.is_file());
            if !is_file {
                continue;
            }
            match trigger_kind(&name) {
                Some(Trigger::Clear) => self.clear_logs(&entry.path()).await,
                Some(Trigger::Diagnostics) => self.run_diagnostics(&entry.path()).await,
                Some(Trigger::ImportConfig) => self.import_config(&entry.path()).await,
                None => {}
            }
        }
        Ok(())
    }

    /// Delete archived logs, then the trigger file itself so the next
    /// insertion does not clear again unintentionally
    async fn clear_logs(&self, trigger: &Path) {
        info!("clearing archived log files");
        if let Ok(mut entries) = tokio::fs::read_dir(&self.logdir).await {
            while let Ok(Some(entry)) = entries.next_entry().await {
                let path = entry.path();
                if path.extension().is_some_and(|ext| ext == "gz") {
                    warn!("deleting archived file: {}", path.display());
                    if let Err(e) = tokio::fs::remove_file(&path).await {
                        error!("failed to delete {}: {e}", path.display());
                    }
                }
            }
        }
        let _ = tokio::fs::remove_file(trigger).await;
    }

    /// Overwrite the trigger file with a diagnostics report
    async fn run_diagnostics(&self, trigger: &Path) {
        info!("writing diagnostics report to {}", trigger.display());
        let stamp = Utc::now().format("%Y-%m-%d %H:%M:%S UTC");
        let mut report = format!(
            "Diagnostic Results ({stamp}):\n\natgmlogger version: {}\n\n",
            env!("CARGO_PKG_VERSION")
        );
        report.push_str(&atgmlogger_platform::process::run_diagnostics().await);
        if let Err(e) = tokio::fs::write(trigger, report).await {
            error!("failed to write diagnostics report: {e}");
        }
    }

    /// Replace the active configuration file; applies on restart
    async fn import_config(&self, trigger: &Path) {
        let Some(target) = &self.config_path else {
            warn!("no active configuration file to replace, skipping import");
            return;
        };
        match tokio::fs::copy(trigger, target).await {
            Ok(_) => info!(
                "configuration imported from {}; changes take effect on restart",
                trigger.display()
            ),
            Err(e) => error!("configuration import failed: {e}"),
        }
    }

    fn blink(&self, command: GpioCommand) {
        if let Some(gpio) = &self.gpio {
            let _ = gpio.send(command);
        }
    }
}

impl EventEmitter for RemovableStorageWatcher {
    fn event_sender(&self) -> Option<&EventSender> {
        self.events.as_ref()
    }
}
