//! Mode-aware filesystem helpers
//!
//! The installer and the removable-storage handler both need writes with
//! explicit permission bits and a couple of Linux-specific queries
//! (/proc/mounts, statvfs) that std does not cover.

use std::os::unix::fs::PermissionsExt;
use std::path::Path;

use atgmlogger_errors::{Error, StorageError};
use tokio::fs;

/// Write bytes to a file and set its permission mode
///
/// Truncates an existing file; re-running is idempotent.
///
/// # Errors
///
/// Returns an error if the write or the chmod fails.
pub async fn write_bytes(path: &Path, bytes: &[u8], mode: u32) -> Result<(), Error> {
    fs::write(path, bytes)
        .await
        .map_err(|e| Error::io_with_path(&e, path))?;
    set_mode(path, mode).await
}

/// Copy a file and set the destination's permission mode
///
/// # Errors
///
/// Returns an error if the copy or the chmod fails.
pub async fn copy_with_mode(src: &Path, dst: &Path, mode: u32) -> Result<(), Error> {
    fs::copy(src, dst)
        .await
        .map_err(|e| Error::io_with_path(&e, dst))?;
    set_mode(dst, mode).await
}

/// Set the permission mode of a path
///
/// # Errors
///
/// Returns an error if the chmod fails.
pub async fn set_mode(path: &Path, mode: u32) -> Result<(), Error> {
    fs::set_permissions(path, std::fs::Permissions::from_mode(mode))
        .await
        .map_err(|e| Error::io_with_path(&e, path))
}

/// Read the permission bits (lower 12 bits) of a path
///
/// # Errors
///
/// Returns an error if the metadata cannot be read.
pub async fn file_mode(path: &Path) -> Result<u32, Error> {
    let metadata = fs::metadata(path)
        .await
        .map_err(|e| Error::io_with_path(&e, path))?;
    Ok(metadata.permissions().mode() & 0o7777)
}

/// Create a directory and all parents; existing directories are success
///
/// # Errors
///
/// Returns an error if creation fails for a reason other than the
/// directory already existing.
pub async fn create_dir_all(path: &Path) -> Result<(), Error> {
    fs::create_dir_all(path)
        .await
        .map_err(|e| Error::io_with_path(&e, path))
}

/// Create a directory tree and set the leaf's permission mode
///
/// # Errors
///
/// Returns an error if creation or the chmod fails.
pub async fn create_dir_all_mode(path: &Path, mode: u32) -> Result<(), Error> {
    create_dir_all(path).await?;
    set_mode(path, mode).await
}

/// Check if a path exists
pub async fn exists(path: &Path) -> bool {
    fs::try_exists(path).await.unwrap_or(false)
}

/// Remove a file if present; returns whether anything was removed
///
/// # Errors
///
/// Returns an error on failures other than the file being absent.
pub async fn remove_file_if_exists(path: &Path) -> Result<bool, Error> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(Error::io_with_path(&e, path)),
    }
}

/// Remove a directory if it exists and is empty; returns whether removed
pub async fn remove_dir_if_empty(path: &Path) -> bool {
    fs::remove_dir(path).await.is_ok()
}

/// Whether `path` is an active mount point, per /proc/mounts
pub async fn is_mount_point(path: &Path) -> bool {
    match fs::read_to_string("/proc/mounts").await {
        Ok(contents) => mounts_contains(&contents, path),
        Err(_) => false,
    }
}

/// Scan mount-table text for a mount point entry
///
/// The kernel escapes spaces in mount points as `\040`; unescape before
/// comparing.
fn mounts_contains(mounts: &str, path: &Path) -> bool {
    let wanted = path.to_string_lossy();
    mounts
        .lines()
        .filter_map(|line| line.split_whitespace().nth(1))
        .map(|mount| mount.replace("\\040", " "))
        .any(|mount| mount == wanted)
}

/// Free bytes available to unprivileged users on the filesystem at `path`
///
/// # Errors
///
/// Returns an error if statvfs fails.
pub fn free_space(path: &Path) -> Result<u64, Error> {
    use std::os::unix::ffi::OsStrExt;

    let cpath =
        std::ffi::CString::new(path.as_os_str().as_bytes()).map_err(|e| StorageError::IoError {
            message: e.to_string(),
        })?;

    let mut stat: libc::statvfs = unsafe { std::mem::zeroed() };
    // SAFETY: cpath is a valid NUL-terminated string and stat is a valid
    // out-pointer for the duration of the call.
    let rc = unsafe { libc::statvfs(cpath.as_ptr(), &raw mut stat) };
    if rc != 0 {
        return Err(StorageError::IoError {
            message: std::io::Error::last_os_error().to_string(),
        }
        .into());
    }

    #[allow(clippy::unnecessary_cast)]
    Ok(stat.f_bsize as u64 * stat.f_bavail as u64)
}

/// Flush filesystem buffers before unmounting removable media
pub fn sync_disks() {
    // SAFETY: sync(2) takes no arguments and cannot fail.
    unsafe { libc::sync() };
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn write_bytes_sets_mode() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("unit.service");
        write_bytes(&path, b"[Unit]\n", 0o644).await.expect("write");
        assert_eq!(file_mode(&path).await.expect("mode"), 0o644);

        // Re-run with a different mode: idempotent overwrite, new mode wins
        write_bytes(&path, b"[Unit]\n", 0o600).await.expect("rewrite");
        assert_eq!(file_mode(&path).await.expect("mode"), 0o600);
    }

    #[tokio::test]
    async fn create_dir_all_tolerates_existing() {
        let dir = TempDir::new().expect("tempdir");
        let nested = dir.path().join("a/b/c");
        create_dir_all(&nested).await.expect("create");
        create_dir_all(&nested).await.expect("create again");
        assert!(exists(&nested).await);
    }

    #[tokio::test]
    async fn remove_file_if_exists_reports_absence() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("gone");
        assert!(!remove_file_if_exists(&path).await.expect("remove missing"));
        fs::write(&path, b"x").await.expect("write");
        assert!(remove_file_if_exists(&path).await.expect("remove"));
    }

    #[test]
    fn mount_table_scan_matches_exact_entry() {
        let mounts = "/dev/root / ext4 rw 0 0\n\
                      /dev/sda1 /media/removable vfat rw,flush 0 0\n";
        assert!(mounts_contains(mounts, Path::new("/media/removable")));
        assert!(!mounts_contains(mounts, Path::new("/media")));
    }

    #[test]
    fn mount_table_scan_unescapes_spaces() {
        let mounts = "/dev/sdb1 /media/MY\\040DISK vfat rw 0 0\n";
        assert!(mounts_contains(mounts, Path::new("/media/MY DISK")));
    }

    #[test]
    fn free_space_reports_nonzero_for_tmp() {
        let free = free_space(Path::new("/tmp")).expect("statvfs");
        assert!(free > 0);
    }
}
