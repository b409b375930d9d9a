#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

//! Platform operations for atgmlogger
//!
//! Process execution (systemctl, udevadm, umount, date, diagnostics) and
//! mode-aware filesystem helpers. Everything here is Linux-flavored; the
//! daemon targets Raspberry Pi class devices.

pub mod fs;
pub mod process;
pub mod systemd;

pub use process::{run_command, run_checked, set_system_time, umount, CommandOutput};
pub use systemd::{Systemctl, UnitManager};
