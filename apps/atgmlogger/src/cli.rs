//! Command line interface definition

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// atgmlogger - serial data logger for DGS gravity meters
#[derive(Parser)]
#[command(name = "atgmlogger")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Serial data logger for DGS AT1A/AT1M gravity meters")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalArgs,
}

/// Global arguments available for all commands
#[derive(Parser)]
pub struct GlobalArgs {
    /// Increase logging verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Enable DEBUG level logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Use alternate config file
    #[arg(short, long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Run the serial logging daemon
    Run {
        /// Serial device path override
        #[arg(short, long)]
        device: Option<String>,

        /// Data/application log directory override
        #[arg(short, long)]
        logdir: Option<PathBuf>,

        /// USB storage mount path override
        #[arg(short, long)]
        mountdir: Option<PathBuf>,

        /// Disable GPIO output (LED notifications)
        #[arg(long)]
        no_gpio: bool,
    },

    /// Install system components and systemd configuration
    Install {
        /// Staging root for packaging
        #[arg(long, env = "DESTDIR", value_name = "DIR")]
        destdir: Option<PathBuf>,

        /// Install prefix
        #[arg(long, env = "PREFIX", value_name = "DIR")]
        prefix: Option<PathBuf>,

        /// Daemon executable to deploy (defaults to this binary)
        #[arg(long, value_name = "PATH")]
        exec_path: Option<PathBuf>,

        /// Install files without enabling the units
        #[arg(long)]
        no_enable: bool,

        /// Start the service after installing
        #[arg(long)]
        start: bool,
    },

    /// Stop the service and remove installed components
    Uninstall {
        /// Staging root the install was made into
        #[arg(long, env = "DESTDIR", value_name = "DIR")]
        destdir: Option<PathBuf>,

        /// Install prefix
        #[arg(long, env = "PREFIX", value_name = "DIR")]
        prefix: Option<PathBuf>,
    },

    /// Write the generated unit files to a directory for inspection
    Render {
        /// Output directory
        #[arg(short, long, default_value = "units")]
        output: PathBuf,

        /// Install prefix baked into the rendered unit
        #[arg(long, env = "PREFIX", value_name = "DIR")]
        prefix: Option<PathBuf>,

        /// Executable path baked into the rendered unit
        #[arg(long, value_name = "PATH")]
        exec_path: Option<PathBuf>,
    },

    /// Remove previously rendered unit files
    Clean {
        /// Output directory used by render
        #[arg(short, long, default_value = "units")]
        output: PathBuf,
    },
}
