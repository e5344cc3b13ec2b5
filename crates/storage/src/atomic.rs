// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Temp-file-plus-rename writes guarded by a process-level advisory lock
//! on a sibling `.lock` file (spec §6.3, §9 "non-blocking acquisition with
//! bounded retry and exponential backoff").

use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use crate::error::StoreError;

/// Bounded retry schedule for the non-blocking lock acquisition: never
/// stalls indefinitely (Design Note §9, replacing an unbounded blocking
/// lock).
const LOCK_RETRY_ATTEMPTS: u32 = 8;
const LOCK_RETRY_BASE: Duration = Duration::from_millis(5);

/// A held advisory lock on `path`'s sibling `.lock` file. Dropping this
/// releases the lock.
pub struct FileLock {
    _file: File,
}

fn lock_path(path: &Path) -> PathBuf {
    let mut lock = path.as_os_str().to_owned();
    lock.push(".lock");
    PathBuf::from(lock)
}

/// Acquire the advisory lock guarding `path`, retrying with exponential
/// backoff rather than blocking indefinitely.
pub fn acquire_lock(path: &Path) -> Result<FileLock, StoreError> {
    let lock_file_path = lock_path(path);
    let file = OpenOptions::new().create(true).write(true).open(&lock_file_path)?;
    let mut delay = LOCK_RETRY_BASE;
    for attempt in 0..LOCK_RETRY_ATTEMPTS {
        match file.try_lock_exclusive() {
            Ok(()) => return Ok(FileLock { _file: file }),
            Err(_) if attempt + 1 < LOCK_RETRY_ATTEMPTS => {
                thread::sleep(delay);
                delay *= 2;
            }
            Err(e) => return Err(StoreError::LockContended(e.to_string())),
        }
    }
    Err(StoreError::LockContended("exhausted retries".to_string()))
}

/// Write `bytes` to `path` atomically: write to a temp file in the same
/// directory, then `rename` over the destination.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir)?;
    let tmp_path = dir.join(format!(
        ".{}.tmp.{}",
        path.file_name().and_then(|n| n.to_str()).unwrap_or("store"),
        std::process::id()
    ));
    {
        let mut tmp = File::create(&tmp_path)?;
        tmp.write_all(bytes)?;
        tmp.sync_all()?;
    }
    fs::rename(&tmp_path, path)?;
    Ok(())
}

/// Read `path` if present; `None` if it doesn't exist yet.
pub fn read_if_exists(path: &Path) -> Result<Option<Vec<u8>>, StoreError> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
#[path = "atomic_tests.rs"]
mod tests;
