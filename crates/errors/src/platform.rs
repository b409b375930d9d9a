//! Platform abstraction error types

use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum PlatformError {
    #[error("process execution failed: {command}: {message}")]
    ProcessExecutionFailed { command: String, message: String },

    #[error("command {command} exited with status {code}: {stderr}")]
    CommandFailed {
        command: String,
        code: i32,
        stderr: String,
    },

    #[error("command not found: {command}")]
    CommandNotFound { command: String },

    #[error("GPIO unavailable: {message}")]
    GpioUnavailable { message: String },

    #[error("GPIO write failed on pin {pin}: {message}")]
    GpioWriteFailed { pin: u8, message: String },
}
