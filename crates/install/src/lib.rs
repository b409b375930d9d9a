#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! System installation for atgmlogger
//!
//! Deploys the daemon, its configuration, the systemd service/mount units
//! and the udev rule onto the target system, and reverses the deployment.
//! All destination paths can be staged under a `DESTDIR` root for
//! packaging; staged installs skip the service-manager lifecycle entirely.

mod installer;
mod manifest;
mod paths;
mod render;
mod template;
mod uninstall;

pub use installer::{InstallOptions, InstallReport, Installer};
pub use manifest::{destinations, manifest, FileSource, InstallFile};
pub use paths::InstallPaths;
pub use render::{clean_units, render_units};
pub use template::{render_service_unit, TOKEN_APP_DIR, TOKEN_EXEC_PATH};
pub use uninstall::{UninstallOptions, UninstallReport};
