//! GPIO LED notification
//!
//! Drives the data-activity and USB-activity LEDs through the Linux sysfs
//! GPIO interface. On hosts without the sysfs tree (development machines,
//! `--no-gpio`), the worker degrades to draining its queue silently.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use atgmlogger_config::GpioConfig;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, warn};

/// LEDs the daemon drives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Led {
    Data,
    Usb,
}

/// Commands accepted by the GPIO worker
#[derive(Debug)]
pub enum GpioCommand {
    /// One pulse
    Blink(Led),
    /// Blink continuously until stopped
    StartBlink(Led),
    /// Stop a continuous blink
    StopBlink(Led),
    /// Drive pins low and exit
    Shutdown,
}

const SYSFS_GPIO: &str = "/sys/class/gpio";

/// Sysfs-backed GPIO worker
pub struct GpioWorker {
    base: PathBuf,
    data_pin: u8,
    usb_pin: u8,
    interval: Duration,
    rx: UnboundedReceiver<GpioCommand>,
}

impl GpioWorker {
    #[must_use]
    pub fn new(config: &GpioConfig, rx: UnboundedReceiver<GpioCommand>) -> Self {
        Self::with_base(PathBuf::from(SYSFS_GPIO), config, rx)
    }

    /// Use an alternate sysfs root (tests)
    #[must_use]
    pub fn with_base(
        base: PathBuf,
        config: &GpioConfig,
        rx: UnboundedReceiver<GpioCommand>,
    ) -> Self {
        Self {
            base,
            data_pin: config.data_pin,
            usb_pin: config.usb_pin,
            interval: Duration::from_millis(config.blink_interval_ms.max(1)),
            rx,
        }
    }

    fn pin(&self, led: Led) -> u8 {
        match led {
            Led::Data => self.data_pin,
            Led::Usb => self.usb_pin,
        }
    }

    /// Run until `Shutdown` or every sender is gone
    pub async fn run(mut self) {
        let pins = [self.data_pin, self.usb_pin];
        for pin in pins {
            if let Err(e) = export_pin(&self.base, pin).await {
                warn!("GPIO unavailable, LED notifications disabled: {e}");
                // Keep consuming so senders never block on a dead worker
                while let Some(command) = self.rx.recv().await {
                    if matches!(command, GpioCommand::Shutdown) {
                        break;
                    }
                }
                return;
            }
        }

        let mut continuous: [Option<Arc<AtomicBool>>; 2] = [None, None];

        while let Some(command) = self.rx.recv().await {
            match command {
                GpioCommand::Blink(led) => {
                    pulse(&self.base, self.pin(led), self.interval).await;
                }
                GpioCommand::StartBlink(led) => {
                    let slot = usize::from(led == Led::Usb);
                    if continuous[slot].is_none() {
                        let flag = Arc::new(AtomicBool::new(true));
                        continuous[slot] = Some(Arc::clone(&flag));
                        let base = self.base.clone();
                        let pin = self.pin(led);
                        let interval = self.interval;
                        tokio::spawn(async move {
                            while flag.load(Ordering::Relaxed) {
                                pulse(&base, pin, interval).await;
                            }
                        });
                    }
                }
                GpioCommand::StopBlink(led) => {
                    let slot = usize::from(led == Led::Usb);
                    if let Some(flag) = continuous[slot].take() {
                        flag.store(false, Ordering::Relaxed);
                    }
                }
                GpioCommand::Shutdown => break,
            }
        }

        for flag in continuous.into_iter().flatten() {
            flag.store(false, Ordering::Relaxed);
        }
        for pin in pins {
            let _ = write_value(&self.base, pin, false).await;
            let _ = tokio::fs::write(self.base.join("unexport"), pin.to_string()).await;
        }
        debug!("GPIO worker exited");
    }
}

/// Export a pin and set it as an output
async fn export_pin(base: &std::path::Path, pin: u8) -> std::io::Result<()> {
    let pin_dir = base.join(format!("gpio{pin}"));
    if !pin_dir.exists() {
        tokio::fs::write(base.join("export"), pin.to_string()).await?;
    }
    tokio::fs::write(pin_dir.join("direction"), "out").await?;
    Ok(())
}

async fn write_value(base: &std::path::Path, pin: u8, high: bool) -> std::io::Result<()> {
    let value = base.join(format!("gpio{pin}")).join("value");
    tokio::fs::write(value, if high { "1" } else { "0" }).await
}

async fn pulse(base: &std::path::Path, pin: u8, interval: Duration) {
    if write_value(base, pin, true).await.is_err() {
        return;
    }
    tokio::time::sleep(interval).await;
    let _ = write_value(base, pin, false).await;
    tokio::time::sleep(interval).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use tokio::sync::mpsc;

    fn fake_sysfs(config: &GpioConfig) -> TempDir {
        let dir = TempDir::new().expect("tempdir");
        std::fs::write(dir.path().join("export"), "").expect("export");
        std::fs::write(dir.path().join("unexport"), "").expect("unexport");
        for pin in [config.data_pin, config.usb_pin] {
            let pin_dir = dir.path().join(format!("gpio{pin}"));
            std::fs::create_dir(&pin_dir).expect("pin dir");
            std::fs::write(pin_dir.join("direction"), "in").expect("direction");
            std::fs::write(pin_dir.join("value"), "0").expect("value");
        }
        dir
    }

    #[tokio::test]
    async fn pulses_and_parks_pins_low_on_shutdown() {
        let config = GpioConfig {
            blink_interval_ms: 1,
            ..GpioConfig::default()
        };
        let sysfs = fake_sysfs(&config);
        let (tx, rx) = mpsc::unbounded_channel();
        let worker = GpioWorker::with_base(sysfs.path().to_path_buf(), &config, rx);

        tx.send(GpioCommand::Blink(Led::Data)).unwrap();
        tx.send(GpioCommand::Shutdown).unwrap();
        worker.run().await;

        let direction =
            std::fs::read_to_string(sysfs.path().join("gpio11/direction")).expect("direction");
        assert_eq!(direction, "out");
        let value = std::fs::read_to_string(sysfs.path().join("gpio11/value")).expect("value");
        assert_eq!(value, "0");
    }

    #[tokio::test]
    async fn missing_sysfs_degrades_to_draining() {
        let config = GpioConfig::default();
        let (tx, rx) = mpsc::unbounded_channel();
        let worker = GpioWorker::with_base(PathBuf::from("/nonexistent/gpio"), &config, rx);

        tx.send(GpioCommand::Blink(Led::Usb)).unwrap();
        tx.send(GpioCommand::Shutdown).unwrap();
        // Must terminate despite the missing tree
        worker.run().await;
    }
}
