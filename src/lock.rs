// Copyright 2025 Crrow
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Per-queue advisory lock.
//!
//! The lock serializes exactly one thing: the read-increment of the sequence
//! counter during push. Pop claims are atomic renames and deliberately do not
//! take this lock, so consumer throughput is never serialized behind it.

use std::fs::{File, OpenOptions};
use std::path::Path;

use fs2::FileExt;
use snafu::ResultExt;

use crate::error::{IoSnafu, Result};
use crate::path::LOCK_FILE;

/// Exclusive advisory lock on a queue directory, released on drop.
///
/// The lock is visible to every process sharing the filesystem; it is not an
/// in-process mutex.
pub(crate) struct QueueLock {
    file: File,
}

impl QueueLock {
    /// Blocks until the queue's lock is held.
    pub(crate) fn acquire(queue_dir: &Path) -> Result<Self> {
        let lock_path = queue_dir.join(LOCK_FILE);

        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&lock_path)
            .context(IoSnafu {
                path: lock_path.clone(),
            })?;

        file.lock_exclusive().context(IoSnafu { path: lock_path })?;

        Ok(Self { file })
    }
}

impl Drop for QueueLock {
    fn drop(&mut self) {
        // Closing the file would release the lock anyway; unlocking
        // explicitly keeps the release independent of descriptor lifetime.
        let _ = FileExt::unlock(&self.file);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acquire_and_reacquire() {
        let temp_dir = tempfile::tempdir().unwrap();

        let lock = QueueLock::acquire(temp_dir.path()).unwrap();
        drop(lock);

        // Released on drop, so a second acquisition must not block.
        QueueLock::acquire(temp_dir.path()).unwrap();
    }

    #[test]
    fn test_lock_file_is_created() {
        let temp_dir = tempfile::tempdir().unwrap();

        let _lock = QueueLock::acquire(temp_dir.path()).unwrap();
        assert!(temp_dir.path().join(LOCK_FILE).exists());
    }

    #[test]
    fn test_acquire_fails_without_queue_dir() {
        let temp_dir = tempfile::tempdir().unwrap();
        let missing = temp_dir.path().join("gone");

        assert!(QueueLock::acquire(&missing).is_err());
    }
}
