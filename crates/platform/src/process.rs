//! Process execution operations

use std::path::Path;
use std::process::ExitStatus;

use atgmlogger_errors::{Error, PlatformError, StorageError};
use tokio::process::Command;
use tracing::debug;

/// Output from command execution
#[derive(Debug)]
pub struct CommandOutput {
    pub status: ExitStatus,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl CommandOutput {
    /// Whether the command exited successfully
    #[must_use]
    pub fn success(&self) -> bool {
        self.status.success()
    }

    /// Stdout decoded lossily as UTF-8
    #[must_use]
    pub fn stdout_str(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    /// Stderr decoded lossily as UTF-8, trimmed
    #[must_use]
    pub fn stderr_str(&self) -> String {
        String::from_utf8_lossy(&self.stderr).trim().to_string()
    }
}

/// Execute a command and return its output regardless of exit status
///
/// # Errors
///
/// Returns an error only if the process could not be spawned (command not
/// found, permissions).
pub async fn run_command(program: &str, args: &[&str]) -> Result<CommandOutput, Error> {
    debug!(program, ?args, "executing command");
    let output = Command::new(program).args(args).output().await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            PlatformError::CommandNotFound {
                command: program.to_string(),
            }
        } else {
            PlatformError::ProcessExecutionFailed {
                command: program.to_string(),
                message: e.to_string(),
            }
        }
    })?;

    Ok(CommandOutput {
        status: output.status,
        stdout: output.stdout,
        stderr: output.stderr,
    })
}

/// Execute a command, treating a non-zero exit status as an error
///
/// # Errors
///
/// Returns an error if the process cannot be spawned or exits non-zero.
pub async fn run_checked(program: &str, args: &[&str]) -> Result<CommandOutput, Error> {
    let output = run_command(program, args).await?;
    if output.success() {
        Ok(output)
    } else {
        Err(PlatformError::CommandFailed {
            command: format!("{program} {}", args.join(" ")),
            code: output.status.code().unwrap_or(-1),
            stderr: output.stderr_str(),
        }
        .into())
    }
}

/// Set the system clock to a UNIX timestamp via `date +%s -s @<ts>`
///
/// # Errors
///
/// Returns an error if `date` cannot be run or rejects the timestamp
/// (typically: not running as root).
pub async fn set_system_time(timestamp: i64) -> Result<(), Error> {
    let stamp = format!("@{timestamp}");
    run_checked("date", &["+%s", "-s", &stamp]).await?;
    Ok(())
}

/// Unmount a filesystem
///
/// # Errors
///
/// Returns a storage error if the unmount fails.
pub async fn umount(path: &Path) -> Result<(), Error> {
    let target = path.display().to_string();
    let output = run_command("umount", &[&target]).await?;
    if output.success() {
        Ok(())
    } else {
        Err(StorageError::UnmountFailed {
            path: target,
            message: output.stderr_str(),
        }
        .into())
    }
}

/// Commands run for the removable-media diagnostics report
pub const DIAGNOSTIC_COMMANDS: &[&[&str]] = &[
    &["uptime"],
    &["vcgencmd", "measure_temp"],
    &["top", "-b", "-n1"],
    &["df", "-H"],
    &["free", "-h"],
    &["dmesg"],
];

/// Run the diagnostics command set and collect a plain-text report
///
/// Individual command failures are recorded in the report instead of
/// aborting it.
pub async fn run_diagnostics() -> String {
    let mut report = String::new();
    for cmd in DIAGNOSTIC_COMMANDS {
        let line = cmd.join(" ");
        report.push_str(&format!("Command: {line}\n"));
        match run_command(cmd[0], &cmd[1..]).await {
            Ok(output) if output.success() => {
                report.push_str(&output.stdout_str());
            }
            Ok(output) => {
                report.push_str(&format!(
                    "Command failed with status {}: {}\n",
                    output.status.code().unwrap_or(-1),
                    output.stderr_str()
                ));
            }
            Err(e) => {
                report.push_str(&format!("Command could not be run: {e}\n"));
            }
        }
        report.push_str("\n\n");
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn captures_stdout() {
        let output = run_command("echo", &["hello"]).await.expect("run echo");
        assert!(output.success());
        assert_eq!(output.stdout_str().trim(), "hello");
    }

    #[tokio::test]
    async fn missing_command_is_not_found() {
        let err = run_command("definitely-not-a-command-xyz", &[])
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Platform(PlatformError::CommandNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn run_checked_surfaces_exit_status() {
        let err = run_checked("false", &[]).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Platform(PlatformError::CommandFailed { .. })
        ));
    }
}
