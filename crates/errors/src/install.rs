//! Installation system error types

use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum InstallError {
    #[error("installation failed: {message}")]
    Failed { message: String },

    #[error("source artifact missing: {path}")]
    MissingSource { path: String },

    #[error("filesystem operation failed: {operation} on {path}: {message}")]
    FilesystemError {
        operation: String,
        path: String,
        message: String,
    },

    #[error("unresolved placeholder token in rendered unit: {token}")]
    UnresolvedToken { token: String },

    #[error("cannot determine daemon executable path: {message}")]
    ExecutablePathUnknown { message: String },

    #[error("installation is only supported on Linux targets")]
    UnsupportedPlatform,
}
