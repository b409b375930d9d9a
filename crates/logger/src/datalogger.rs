//! Gravity data file writer
//!
//! Appends every dispatched line to the data file, flushing per line so a
//! power cut loses at most the record in flight. On rotation the handle is
//! closed and reopened so logrotate's moved file is released.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use async_trait::async_trait;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{error, info};

use crate::dispatcher::Handler;
use crate::gpio::{GpioCommand, Led};

pub struct DataLogger {
    path: PathBuf,
    writer: Option<BufWriter<File>>,
    gpio: Option<UnboundedSender<GpioCommand>>,
}

impl DataLogger {
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            writer: None,
            gpio: None,
        }
    }

    /// Blink the data LED on every write
    #[must_use]
    pub fn with_gpio(mut self, gpio: UnboundedSender<GpioCommand>) -> Self {
        self.gpio = Some(gpio);
        self
    }

    fn open(&mut self) -> std::io::Result<&mut BufWriter<File>> {
        match &mut self.writer {
            Some(writer) => Ok(writer),
            slot @ None => {
                let file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(&self.path)?;
                Ok(slot.insert(BufWriter::new(file)))
            }
        }
    }
}

#[async_trait]
impl Handler for DataLogger {
    fn name(&self) -> &'static str {
        "datalogger"
    }

    async fn handle(&mut self, line: &str) {
        let path = self.path.clone();
        let result = self
            .open()
            .and_then(|writer| writeln!(writer, "{line}").and_then(|()| writer.flush()));

        match result {
            Ok(()) => {
                if let Some(gpio) = &self.gpio {
                    let _ = gpio.send(GpioCommand::Blink(Led::Data));
                }
            }
            Err(e) => {
                error!("write to {} failed: {e}", path.display());
                // Drop the handle; the next line retries the open
                self.writer = None;
            }
        }
    }

    async fn rotate(&mut self) {
        if let Some(mut writer) = self.writer.take() {
            if let Err(e) = writer.flush() {
                error!("flush during rotation failed: {e}");
            }
        }
        match self.open() {
            Ok(_) => info!("data log handle reopened on {}", self.path.display()),
            Err(e) => error!("reopen of {} failed: {e}", self.path.display()),
        }
    }

    async fn shutdown(&mut self) {
        if let Some(mut writer) = self.writer.take() {
            let _ = writer.flush();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn appends_lines_with_newlines() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("gravdata.dat");
        let mut logger = DataLogger::new(path.clone());

        logger.handle("$AT1A,1").await;
        logger.handle("$AT1A,2").await;
        logger.shutdown().await;

        let written = std::fs::read_to_string(&path).expect("read");
        assert_eq!(written, "$AT1A,1\n$AT1A,2\n");
    }

    #[tokio::test]
    async fn rotation_releases_the_old_file() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("gravdata.dat");
        let mut logger = DataLogger::new(path.clone());

        logger.handle("before").await;

        // Simulate logrotate moving the file aside
        let rotated = dir.path().join("gravdata.dat.1");
        std::fs::rename(&path, &rotated).expect("rename");
        logger.rotate().await;
        logger.handle("after").await;
        logger.shutdown().await;

        assert_eq!(
            std::fs::read_to_string(&rotated).expect("read rotated"),
            "before\n"
        );
        assert_eq!(std::fs::read_to_string(&path).expect("read new"), "after\n");
    }

    #[tokio::test]
    async fn surviving_restart_appends_rather_than_truncates() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("gravdata.dat");
        std::fs::write(&path, "earlier\n").expect("seed");

        let mut logger = DataLogger::new(path.clone());
        logger.handle("later").await;
        logger.shutdown().await;

        assert_eq!(
            std::fs::read_to_string(&path).expect("read"),
            "earlier\nlater\n"
        );
    }
}
