//! Event rendering for the CLI
//!
//! Library crates emit events instead of printing; this is the single
//! place that turns them into user-facing output.

use atgmlogger_events::{AppEvent, GeneralEvent, InstallEvent, LoggerEvent, UninstallEvent};

pub fn render(event: &AppEvent) {
    match event {
        AppEvent::Install(event) => render_install(event),
        AppEvent::Uninstall(event) => render_uninstall(event),
        AppEvent::Logger(event) => render_logger(event),
        AppEvent::General(event) => render_general(event),
    }
}

fn render_install(event: &InstallEvent) {
    match event {
        InstallEvent::Started { root } => {
            println!("Installing atgmlogger (root: {})", root.display());
        }
        InstallEvent::FileInstalled { dest, mode } => {
            println!("  installed {} (mode {mode:o})", dest.display());
        }
        InstallEvent::UnitRendered { unit } => {
            println!("  rendered {unit}");
        }
        InstallEvent::DaemonReloaded => println!("  systemd unit cache reloaded"),
        InstallEvent::UnitEnabled { unit } => println!("  enabled {unit}"),
        InstallEvent::UnitStarted { unit } => println!("  started {unit}"),
        InstallEvent::Completed { files } => {
            println!("Install complete ({files} files)");
        }
    }
}

fn render_uninstall(event: &UninstallEvent) {
    match event {
        UninstallEvent::Started => println!("Uninstalling atgmlogger"),
        UninstallEvent::UnitStopped { unit } => println!("  stopped {unit}"),
        UninstallEvent::UnitDisabled { unit } => println!("  disabled {unit}"),
        UninstallEvent::FileRemoved { dest } => {
            println!("  removed {}", dest.display());
        }
        UninstallEvent::Completed { files } => {
            println!("Uninstall complete ({files} files removed)");
        }
    }
}

fn render_logger(event: &LoggerEvent) {
    match event {
        LoggerEvent::ListenerStarted { port } => {
            println!("Listening on {port}");
        }
        LoggerEvent::RotateCompleted => println!("Log handles reopened"),
        LoggerEvent::TimeSynced { timestamp } => {
            println!("System time set from data stream ({timestamp})");
        }
        LoggerEvent::CopyStarted { mount } => {
            println!("Removable device at {}, copying logs", mount.display());
        }
        LoggerEvent::CopyCompleted { files, bytes } => {
            println!("Copied {files} files ({} KiB)", bytes / 1024);
        }
        LoggerEvent::ShuttingDown => println!("Shutting down"),
    }
}

fn render_general(event: &GeneralEvent) {
    match event {
        GeneralEvent::Debug { .. } => {}
        GeneralEvent::Warning { message } => eprintln!("Warning: {message}"),
        GeneralEvent::Error { message } => eprintln!("Error: {message}"),
        GeneralEvent::OperationStarted { operation } => println!("{operation}..."),
        GeneralEvent::OperationCompleted { operation, success } => {
            if *success {
                println!("{operation} done");
            } else {
                eprintln!("{operation} failed");
            }
        }
    }
}
