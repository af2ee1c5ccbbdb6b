//! Store lock and atomic replacement
//!
//! Every unit of work against the store holds an exclusive `fs2` lock on
//! `store.lock` from the read until the rename of the new snapshot, so two
//! processes never interleave a read-compute-write cycle.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::time::{Duration, Instant};

use fs2::FileExt;

use crate::error::{Error, Result};

/// Default lock timeout in milliseconds
pub const DEFAULT_LOCK_TIMEOUT_MS: u64 = 5000;

const LOCK_RETRY_INTERVAL_MS: u64 = 50;

fn is_lock_contended(err: &io::Error) -> bool {
    if err.kind() == io::ErrorKind::WouldBlock {
        return true;
    }

    // Windows reports sharing/lock violations as raw os errors.
    #[cfg(windows)]
    {
        matches!(err.raw_os_error(), Some(32) | Some(33))
    }
    #[cfg(not(windows))]
    {
        false
    }
}

fn open_lock_file(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)?;
    Ok(file)
}

/// Exclusive advisory lock on `store.lock`, released on drop
#[derive(Debug)]
pub struct FileLock {
    file: File,
}

impl FileLock {
    /// Wait up to `timeout_ms` for the lock, creating the lock file if needed.
    pub fn acquire(path: impl AsRef<Path>, timeout_ms: u64) -> Result<Self> {
        let path = path.as_ref();
        let file = open_lock_file(path)?;
        let deadline = Instant::now() + Duration::from_millis(timeout_ms);

        loop {
            match file.try_lock_exclusive() {
                Ok(()) => return Ok(FileLock { file }),
                Err(e) if !is_lock_contended(&e) => return Err(Error::Io(e)),
                Err(_) if Instant::now() >= deadline => {
                    return Err(Error::LockFailed(path.to_path_buf()));
                }
                Err(_) => std::thread::sleep(Duration::from_millis(LOCK_RETRY_INTERVAL_MS)),
            }
        }
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}

/// Replace `path` with `data` via a sibling temp file and a rename.
///
/// Readers see either the previous contents or the new ones. The caller is
/// expected to hold the store lock.
pub fn write_atomic(path: impl AsRef<Path>, data: &[u8]) -> Result<()> {
    let path = path.as_ref();

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let temp_path = path.with_extension(format!(
        "{}.tmp.{}",
        path.extension().and_then(|e| e.to_str()).unwrap_or(""),
        std::process::id()
    ));

    let mut temp_file = File::create(&temp_path)?;
    temp_file.write_all(data)?;
    temp_file.sync_all()?;
    drop(temp_file);

    fs::rename(&temp_path, path)?;

    Ok(())
}
