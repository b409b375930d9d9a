//! atgmlogger - serial data logger for DGS gravity meters
//!
//! CLI entry point: runs the logging daemon, or deploys/removes the
//! system integration (units, udev rule, configuration).

mod cli;
mod daemon;
mod events;

use std::process;
use std::sync::Arc;

use clap::Parser;
use tracing::error;

use atgmlogger_config::Config;
use atgmlogger_errors::Error;
use atgmlogger_events::EventSender;
use atgmlogger_install::{
    clean_units, render_units, InstallOptions, Installer, UninstallOptions,
};
use atgmlogger_platform::Systemctl;

use crate::cli::{Cli, Commands};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.global.debug, cli.global.verbose);

    if let Err(e) = run(cli).await {
        error!("application error: {e}");
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

/// Main application logic
async fn run(cli: Cli) -> Result<(), Error> {
    let mut config = Config::load_or_default(cli.global.config.as_deref()).await?;
    config.merge_env();

    let (event_tx, mut event_rx) = atgmlogger_events::channel();
    let renderer = tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            events::render(&event);
        }
    });

    let result = execute_command(cli.command, config, event_tx).await;

    // Sender dropped inside execute_command; drain remaining events
    let _ = renderer.await;
    result
}

/// Execute the specified command
async fn execute_command(
    command: Commands,
    config: Config,
    events: EventSender,
) -> Result<(), Error> {
    match command {
        Commands::Run {
            device,
            logdir,
            mountdir,
            no_gpio,
        } => {
            daemon::run(
                config,
                daemon::RunOverrides {
                    device,
                    logdir,
                    mountdir,
                    no_gpio,
                },
                events,
            )
            .await
        }

        Commands::Install {
            destdir,
            prefix,
            exec_path,
            no_enable,
            start,
        } => {
            let installer = Installer::new(config, Arc::new(Systemctl::new())).with_events(events);
            let report = installer
                .install(&InstallOptions {
                    destdir,
                    prefix,
                    exec_path,
                    enable: !no_enable,
                    start,
                })
                .await?;
            if !report.warnings.is_empty() {
                eprintln!(
                    "Install finished with {} warning(s); see above",
                    report.warnings.len()
                );
            }
            Ok(())
        }

        Commands::Uninstall { destdir, prefix } => {
            let installer = Installer::new(config, Arc::new(Systemctl::new())).with_events(events);
            let report = installer
                .uninstall(&UninstallOptions { destdir, prefix })
                .await?;
            if !report.warnings.is_empty() {
                eprintln!(
                    "Uninstall finished with {} warning(s); see above",
                    report.warnings.len()
                );
            }
            Ok(())
        }

        Commands::Render {
            output,
            prefix,
            exec_path,
        } => {
            let exec = match exec_path {
                Some(path) => path,
                None => std::env::current_exe()?,
            };
            let written = render_units(&config, &output, &exec, prefix).await?;
            for path in &written {
                println!("wrote {}", path.display());
            }
            Ok(())
        }

        Commands::Clean { output } => {
            let removed = clean_units(&output).await?;
            for path in &removed {
                println!("removed {}", path.display());
            }
            Ok(())
        }
    }
}

/// Initialize tracing to stderr; verbosity maps to warn/info/debug
fn init_tracing(debug: bool, verbose: u8) {
    let level = if debug {
        "debug"
    } else {
        match verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level.to_string())),
        )
        .with_writer(std::io::stderr)
        .init();
}
