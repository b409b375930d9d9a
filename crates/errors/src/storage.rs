//! Storage and removable-media error types

use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum StorageError {
    #[error("I/O error: {message}")]
    IoError { message: String },

    #[error("{path} is not an active mount point")]
    NotAMountPoint { path: String },

    #[error("failed to copy {src} to {dest}: {message}")]
    CopyFailed {
        src: String,
        dest: String,
        message: String,
    },

    #[error("failed to unmount {path}: {message}")]
    UnmountFailed { path: String, message: String },
}
