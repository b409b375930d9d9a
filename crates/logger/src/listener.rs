//! Serial listener
//!
//! Reads raw bytes from the port and forwards framed lines to the
//! dispatcher. The read loop does no other work; anything slow lives on
//! the far side of the channel so data is never lost to a stalled write.

use std::io::Read;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use atgmlogger_config::SerialConfig;
use atgmlogger_errors::{Error, SerialError};
use serialport::{DataBits, Parity, SerialPort, StopBits};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, error, info};

use crate::dispatcher::DispatchMessage;
use crate::framing::LineFramer;

const READ_CHUNK: usize = 2048;

/// Open the configured serial port
///
/// # Errors
///
/// Returns an error if the device cannot be opened with the requested
/// parameters.
pub fn open_port(config: &SerialConfig) -> Result<Box<dyn SerialPort>, Error> {
    let parity = match config.parity.as_str() {
        "odd" => Parity::Odd,
        "even" => Parity::Even,
        _ => Parity::None,
    };
    let stop_bits = if config.stopbits == 2 {
        StopBits::Two
    } else {
        StopBits::One
    };

    serialport::new(&config.port, config.baudrate)
        .data_bits(DataBits::Eight)
        .parity(parity)
        .stop_bits(stop_bits)
        .timeout(Duration::from_millis(config.timeout_ms))
        .open()
        .map_err(|e| {
            SerialError::OpenFailed {
                port: config.port.clone(),
                message: e.to_string(),
            }
            .into()
        })
}

/// Blocking serial read loop
///
/// Generic over the byte source so the loop is testable without hardware;
/// production use passes the opened `Box<dyn SerialPort>`.
pub struct SerialListener<R: Read> {
    port: R,
    framer: LineFramer,
    tx: UnboundedSender<DispatchMessage>,
    shutdown: Arc<AtomicBool>,
}

impl<R: Read> SerialListener<R> {
    pub fn new(port: R, tx: UnboundedSender<DispatchMessage>, shutdown: Arc<AtomicBool>) -> Self {
        Self {
            port,
            framer: LineFramer::new(),
            tx,
            shutdown,
        }
    }

    /// Run until shutdown, disconnect, or the dispatcher goes away
    ///
    /// Timeouts are the idle heartbeat: each one is a chance to observe the
    /// shutdown flag. Run this on a blocking thread.
    pub fn listen(mut self) {
        let mut chunk = [0u8; READ_CHUNK];
        info!("serial listener running");

        while !self.shutdown.load(Ordering::Relaxed) {
            match self.port.read(&mut chunk) {
                Ok(0) => {
                    // EOF: the device went away
                    error!("serial stream ended");
                    break;
                }
                Ok(n) => {
                    for line in self.framer.push(&chunk[..n]) {
                        if self.tx.send(DispatchMessage::Line(line)).is_err() {
                            debug!("dispatcher closed, stopping listener");
                            return;
                        }
                    }
                }
                Err(e)
                    if e.kind() == std::io::ErrorKind::TimedOut
                        || e.kind() == std::io::ErrorKind::Interrupted =>
                {
                    continue;
                }
                Err(e) => {
                    error!("serial read failed: {e}");
                    break;
                }
            }
        }
        debug!("serial listener exiting");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tokio::sync::mpsc;

    #[test]
    fn forwards_framed_lines_until_eof() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let data = Cursor::new(b"$AT1A,1\r\n$AT1A,2\r\npartial".to_vec());
        let listener = SerialListener::new(data, tx, Arc::new(AtomicBool::new(false)));
        listener.listen();

        assert!(matches!(
            rx.try_recv(),
            Ok(DispatchMessage::Line(ref l)) if l == "$AT1A,1"
        ));
        assert!(matches!(
            rx.try_recv(),
            Ok(DispatchMessage::Line(ref l)) if l == "$AT1A,2"
        ));
        // The partial tail never completed a line
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn shutdown_flag_stops_the_loop() {
        struct Blocking;
        impl Read for Blocking {
            fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
                Err(std::io::Error::new(std::io::ErrorKind::TimedOut, "timeout"))
            }
        }

        let (tx, _rx) = mpsc::unbounded_channel();
        let shutdown = Arc::new(AtomicBool::new(true));
        let listener = SerialListener::new(Blocking, tx, Arc::clone(&shutdown));
        // Returns immediately because the flag is already set
        listener.listen();
    }
}
