//! Domain event definitions

use std::path::PathBuf;

/// Top-level application event, grouped by functional domain
#[derive(Debug, Clone)]
pub enum AppEvent {
    Install(InstallEvent),
    Uninstall(UninstallEvent),
    Logger(LoggerEvent),
    General(GeneralEvent),
}

/// Events emitted by the installer
#[derive(Debug, Clone)]
pub enum InstallEvent {
    /// Installation started against the given root ("/" unless staged)
    Started { root: PathBuf },
    /// A manifest entry was written to its destination
    FileInstalled { dest: PathBuf, mode: u32 },
    /// The service unit template was rendered
    UnitRendered { unit: String },
    /// `systemctl daemon-reload` completed
    DaemonReloaded,
    /// A unit was enabled
    UnitEnabled { unit: String },
    /// A unit was started
    UnitStarted { unit: String },
    /// Installation finished
    Completed { files: usize },
}

/// Events emitted by the uninstaller
#[derive(Debug, Clone)]
pub enum UninstallEvent {
    Started,
    UnitStopped { unit: String },
    UnitDisabled { unit: String },
    FileRemoved { dest: PathBuf },
    Completed { files: usize },
}

/// Events emitted by the running logger daemon
#[derive(Debug, Clone)]
pub enum LoggerEvent {
    /// Serial listener opened its port
    ListenerStarted { port: String },
    /// Log rotation was requested (SIGHUP) and handles were reopened
    RotateCompleted,
    /// System clock was set from a data-line timestamp
    TimeSynced { timestamp: i64 },
    /// Removable-media copy-out started
    CopyStarted { mount: PathBuf },
    /// Removable-media copy-out finished
    CopyCompleted { files: usize, bytes: u64 },
    /// Daemon is shutting down
    ShuttingDown,
}

/// Cross-cutting events
#[derive(Debug, Clone)]
pub enum GeneralEvent {
    Debug { message: String },
    Warning { message: String },
    Error { message: String },
    OperationStarted { operation: String },
    OperationCompleted { operation: String, success: bool },
}
