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

//! The flat-file queue driver.
//!
//! [`FlatFileDriver`] turns a directory tree into a durable
//! multi-producer/multi-consumer queue using only filesystem primitives. The
//! correctness model rests on two independent mechanisms:
//!
//! - the per-queue advisory lock guards the sequence-counter read-increment
//!   during push, so no two pushers ever assign the same id;
//! - the claim during pop is a single atomic rename, so no two consumers ever
//!   own the same message. A lost rename race is resolved internally by
//!   moving to the next candidate, never surfaced as an error.
//!
//! Nothing is cached in memory: every operation re-reads the filesystem, so
//! the driver stays correct when unrelated processes mutate the same
//! directories concurrently.
//!
//! A consumer that claims a message and dies before acknowledging leaves the
//! claimed file behind forever. There is no visibility timeout; reclaiming
//! orphaned claims is left to external tooling that can judge claim age.

use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use bytes::Bytes;
use snafu::{ResultExt, ensure};
use tracing::{debug, info, warn};

use crate::error::{IoSnafu, QueueNotFoundSnafu, Result, StaleReceiptSnafu};
use crate::lock::QueueLock;
use crate::message::{DriverMessage, Receipt};
use crate::{DriverConfig, path};

/// Driver persisting queues as directories and messages as files.
///
/// The driver holds no authoritative in-memory state and is safe to use from
/// any number of threads or processes sharing the base directory, including
/// over a POSIX-like network filesystem.
#[derive(Debug)]
pub struct FlatFileDriver {
    config: DriverConfig,
}

impl FlatFileDriver {
    /// Create a driver rooted at `config.base_path`, creating the base
    /// directory if needed.
    pub(crate) fn new(config: DriverConfig) -> Result<Self> {
        std::fs::create_dir_all(&config.base_path).context(IoSnafu {
            path: config.base_path.clone(),
        })?;

        info!(path = ?config.base_path, "flat-file driver initialized");

        Ok(Self { config })
    }

    /// Get the driver configuration.
    #[must_use]
    pub const fn config(&self) -> &DriverConfig { &self.config }

    /// Ensure the queue's directory exists. Idempotent.
    pub fn create_queue(&self, queue: &str) -> Result<()> {
        let dir = self.queue_dir(queue);

        if dir.is_dir() {
            return Ok(());
        }

        std::fs::create_dir_all(&dir).context(IoSnafu { path: dir })?;
        info!(queue, "queue created");
        Ok(())
    }

    /// Delete the queue's directory and every message in it, pending or
    /// claimed. Idempotent: removing a non-existent queue is a no-op.
    ///
    /// Every receipt issued for this queue becomes permanently invalid.
    pub fn remove_queue(&self, queue: &str) -> Result<()> {
        let dir = self.queue_dir(queue);

        match std::fs::remove_dir_all(&dir) {
            Ok(()) => {
                info!(queue, "queue removed");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).context(IoSnafu { path: dir }),
        }
    }

    /// List the names of all existing queues, sorted for stable iteration.
    pub fn list_queues(&self) -> Result<Vec<String>> {
        let base = &self.config.base_path;
        let mut queues = Vec::new();

        let entries = std::fs::read_dir(base).context(IoSnafu { path: base.clone() })?;
        for entry in entries {
            let entry = entry.context(IoSnafu { path: base.clone() })?;
            let is_dir = entry
                .file_type()
                .context(IoSnafu { path: entry.path() })?
                .is_dir();
            if is_dir {
                if let Some(name) = entry.file_name().to_str() {
                    queues.push(name.to_owned());
                }
            }
        }

        queues.sort_unstable();
        Ok(queues)
    }

    /// Append a message to the queue.
    ///
    /// The sequence id is allocated under the queue's advisory lock: read the
    /// counter, create the message file, persist counter + 1. The file write
    /// happens while the lock is held so no interleaving push can observe or
    /// reuse the id.
    pub fn push_message(&self, queue: &str, message: impl Into<Bytes>) -> Result<()> {
        let dir = self.existing_queue_dir(queue)?;
        let message = message.into();

        let _lock = QueueLock::acquire(&dir)?;

        let counter_path = dir.join(path::COUNTER_FILE);
        let mut sequence = read_counter(&counter_path)?;

        // A counter left stale by a pusher that crashed between the file
        // write and the counter update must produce a gap, never an
        // overwrite: create_new refuses ids that are already taken.
        loop {
            let message_path = dir.join(path::pending_file_name(sequence));
            match std::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&message_path)
            {
                Ok(mut file) => {
                    file.write_all(&message).context(IoSnafu {
                        path: message_path.clone(),
                    })?;
                    self.apply_file_mode(&message_path)?;
                    break;
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => sequence += 1,
                Err(e) => return Err(e).context(IoSnafu { path: message_path }),
            }
        }

        std::fs::write(&counter_path, (sequence + 1).to_string())
            .context(IoSnafu { path: counter_path })?;

        debug!(queue, sequence, "message pushed");
        Ok(())
    }

    /// Claim and return the pending message with the lowest sequence id.
    ///
    /// Returns `Ok(None)` when nothing is claimable: immediately for a zero
    /// timeout, otherwise after polling the directory at the configured
    /// interval until the timeout elapses. Passing `None` uses the
    /// configured default timeout.
    ///
    /// The claim is an atomic rename; exactly one concurrent popper can win
    /// it. The returned receipt authorizes acknowledging this claim and no
    /// other.
    pub fn pop_message(
        &self,
        queue: &str,
        timeout: impl Into<Option<Duration>>,
    ) -> Result<Option<DriverMessage>> {
        let timeout = timeout.into().unwrap_or(self.config.default_timeout);
        let dir = self.existing_queue_dir(queue)?;
        let start = Instant::now();

        loop {
            if let Some(message) = self.try_claim(queue, &dir)? {
                return Ok(Some(message));
            }

            let elapsed = start.elapsed();
            if elapsed >= timeout {
                return Ok(None);
            }

            std::thread::sleep(self.config.poll_interval.min(timeout - elapsed));
        }
    }

    /// One scan-and-claim pass over the queue directory.
    fn try_claim(&self, queue: &str, dir: &Path) -> Result<Option<DriverMessage>> {
        for (sequence, pending_path) in self.scan_pending(queue, dir)? {
            let claimed_path = dir.join(path::claimed_file_name(sequence, &path::claim_token()));

            match std::fs::rename(&pending_path, &claimed_path) {
                Ok(()) => {
                    let payload = std::fs::read(&claimed_path).context(IoSnafu {
                        path: claimed_path.clone(),
                    })?;

                    debug!(queue, sequence, "message claimed");
                    return Ok(Some(DriverMessage {
                        payload: Bytes::from(payload),
                        receipt: Receipt::file(queue, sequence, claimed_path),
                    }));
                }
                // Another popper renamed it first; take the next candidate.
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    debug!(queue, sequence, "lost claim race");
                }
                Err(e) => return Err(e).context(IoSnafu { path: pending_path }),
            }
        }

        Ok(None)
    }

    /// Permanently delete the claimed message identified by `receipt`.
    ///
    /// A receipt that no longer resolves (message already acknowledged, or
    /// the queue was removed) yields [`Error::StaleReceipt`] and leaves all
    /// state untouched; callers retrying an acknowledgement may ignore it.
    pub fn acknowledge_message(&self, queue: &str, receipt: &Receipt) -> Result<()> {
        let stale = StaleReceiptSnafu {
            queue,
            sequence: receipt.sequence(),
        };

        ensure!(receipt.queue() == queue, stale);
        let Some(claimed_path) = receipt.claimed_path() else {
            return stale.fail();
        };

        match std::fs::remove_file(claimed_path) {
            Ok(()) => {
                debug!(queue, sequence = receipt.sequence(), "message acknowledged");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => stale.fail(),
            Err(e) => Err(e).context(IoSnafu {
                path: claimed_path.to_path_buf(),
            }),
        }
    }

    /// Read up to `limit` pending payloads starting at ordinal `index`,
    /// ascending by sequence id, without claiming anything.
    ///
    /// Peek only lists and reads; it never interferes with concurrent pops.
    /// An entry claimed between the scan and the read is skipped.
    pub fn peek_queue(&self, queue: &str, index: usize, limit: usize) -> Result<Vec<Bytes>> {
        let dir = self.existing_queue_dir(queue)?;
        let mut messages = Vec::new();

        for (_, pending_path) in self
            .scan_pending(queue, &dir)?
            .into_iter()
            .skip(index)
            .take(limit)
        {
            match std::fs::read(&pending_path) {
                Ok(payload) => messages.push(Bytes::from(payload)),
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(e).context(IoSnafu { path: pending_path }),
            }
        }

        Ok(messages)
    }

    /// Count pending messages by listing the directory. The sequence counter
    /// is never consulted; it only tracks the next id to assign.
    pub fn count_messages(&self, queue: &str) -> Result<usize> {
        let dir = self.existing_queue_dir(queue)?;
        Ok(self.scan_pending(queue, &dir)?.len())
    }

    fn queue_dir(&self, queue: &str) -> PathBuf { self.config.base_path.join(queue) }

    fn existing_queue_dir(&self, queue: &str) -> Result<PathBuf> {
        let dir = self.queue_dir(queue);
        ensure!(dir.is_dir(), QueueNotFoundSnafu { queue });
        Ok(dir)
    }

    /// List pending messages, mapping a vanished queue directory to
    /// [`Error::QueueNotFound`](crate::Error::QueueNotFound).
    fn scan_pending(&self, queue: &str, dir: &Path) -> Result<Vec<(u64, PathBuf)>> {
        match path::scan_pending(dir) {
            Ok(pending) => Ok(pending),
            Err(e) if e.kind() == ErrorKind::NotFound => QueueNotFoundSnafu { queue }.fail(),
            Err(e) => Err(e).context(IoSnafu {
                path: dir.to_path_buf(),
            }),
        }
    }

    #[cfg(unix)]
    fn apply_file_mode(&self, message_path: &Path) -> Result<()> {
        use std::os::unix::fs::PermissionsExt;

        std::fs::set_permissions(
            message_path,
            std::fs::Permissions::from_mode(self.config.file_mode),
        )
        .context(IoSnafu {
            path: message_path.to_path_buf(),
        })
    }

    #[cfg(not(unix))]
    fn apply_file_mode(&self, _message_path: &Path) -> Result<()> { Ok(()) }
}

/// Read the next sequence id from the counter file, defaulting to 1 when the
/// counter does not exist yet. Must be called with the queue lock held.
fn read_counter(counter_path: &Path) -> Result<u64> {
    match std::fs::read_to_string(counter_path) {
        Ok(raw) => match raw.trim().parse() {
            Ok(sequence) => Ok(sequence),
            Err(_) => {
                // Restarting at 1 is safe: push walks forward over taken ids.
                warn!(path = ?counter_path, "unreadable sequence counter, restarting at 1");
                Ok(1)
            }
        },
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(1),
        Err(e) => Err(e).context(IoSnafu {
            path: counter_path.to_path_buf(),
        }),
    }
}
