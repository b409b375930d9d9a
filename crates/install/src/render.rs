//! Standalone unit generation
//!
//! `render` writes the generated unit files to an output directory for
//! inspection or packaging; `clean` removes that intermediate output.

use std::path::{Path, PathBuf};

use atgmlogger_config::{paths as fixed, Config};
use atgmlogger_errors::Error;
use atgmlogger_platform::fs;

use crate::manifest::assets;
use crate::paths::InstallPaths;
use crate::template::render_service_unit;

/// Write the generated unit files (service, mount, udev rule) to `output`
///
/// # Errors
///
/// Returns an error if rendering or writing fails.
pub async fn render_units(
    config: &Config,
    output: &Path,
    exec_path: &Path,
    prefix: Option<PathBuf>,
) -> Result<Vec<PathBuf>, Error> {
    let paths = InstallPaths::resolve(config, None, prefix);
    let service = render_service_unit(
        assets::SERVICE_TEMPLATE,
        &exec_path.display().to_string(),
        &paths.app_dir().display().to_string(),
    )?;

    fs::create_dir_all(output).await?;

    let outputs = [
        (fixed::SERVICE_UNIT, service.as_str()),
        (fixed::MOUNT_UNIT, assets::MOUNT_UNIT),
        (fixed::UDEV_RULES, assets::UDEV_RULES),
    ];

    let mut written = Vec::with_capacity(outputs.len());
    for (name, content) in outputs {
        let path = output.join(name);
        fs::write_bytes(&path, content.as_bytes(), 0o644).await?;
        written.push(path);
    }
    Ok(written)
}

/// Remove previously rendered unit files; the directory goes too if empty
///
/// # Errors
///
/// Returns an error if a present file cannot be removed.
pub async fn clean_units(output: &Path) -> Result<Vec<PathBuf>, Error> {
    let mut removed = Vec::new();
    for name in [fixed::SERVICE_UNIT, fixed::MOUNT_UNIT, fixed::UDEV_RULES] {
        let path = output.join(name);
        if fs::remove_file_if_exists(&path).await? {
            removed.push(path);
        }
    }
    fs::remove_dir_if_empty(output).await;
    Ok(removed)
}
