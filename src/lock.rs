// src/lock.rs

//! Advisory lock guarding mutating commands
//!
//! Two concurrent `dot manage` runs against the same target would race
//! each other's link operations and manifest writes. Mutating commands
//! hold an exclusive flock on `<target_root>/.dot.lock` for their whole
//! run; acquisition retries briefly with exponential backoff before
//! giving up.

use crate::error::{Error, Result};
use fs2::FileExt;
use std::fs::File;
use std::path::{Path, PathBuf};

/// Lock file name under the target root
pub const LOCK_FILE: &str = ".dot.lock";

/// Held exclusive lock; released on drop
#[derive(Debug)]
pub struct Lockfile {
    file: File,
    path: PathBuf,
}

impl Lockfile {
    /// Acquire the lock, retrying with backoff.
    ///
    /// Tries at 0ms, 100ms, 200ms, 400ms, 800ms before failing.
    pub fn acquire(path: &Path) -> Result<Self> {
        const MAX_RETRIES: u32 = 5;

        let file = File::create(path)?;
        let mut last_error = None;

        for attempt in 0..MAX_RETRIES {
            match file.try_lock_exclusive() {
                Ok(()) => {
                    last_error = None;
                    break;
                }
                Err(e) => {
                    last_error = Some(e);
                    if attempt < MAX_RETRIES - 1 {
                        std::thread::sleep(std::time::Duration::from_millis(100 * (1 << attempt)));
                    }
                }
            }
        }

        if let Some(e) = last_error {
            return Err(Error::InvalidOperation(format!(
                "could not lock {} after {} attempts; is another dot run in progress? ({})",
                path.display(),
                MAX_RETRIES,
                e
            )));
        }

        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for Lockfile {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}
