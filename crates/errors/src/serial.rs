//! Serial port error types

use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum SerialError {
    #[error("failed to open serial port {port}: {message}")]
    OpenFailed { port: String, message: String },

    #[error("serial read failed: {message}")]
    ReadFailed { message: String },

    #[error("serial device disconnected: {port}")]
    Disconnected { port: String },
}
