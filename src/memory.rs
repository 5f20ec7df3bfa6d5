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

//! In-process queue variant for tests and single-process scenarios.
//!
//! Same [`Queue`] contract as the driver-backed queue, but nothing is
//! persisted and nothing is visible to other processes. Pop removes the
//! envelope outright, so there is no claim state and acknowledgement is a
//! no-op.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use snafu::ensure;

use crate::error::{QueueClosedSnafu, Result, StaleReceiptSnafu};
use crate::queue::Queue;
use crate::{Envelope, Receipt};

/// Non-persistent FIFO queue backed by an in-process buffer.
pub struct InMemoryQueue {
    name:     String,
    pending:  Mutex<VecDeque<Envelope>>,
    /// Signalled on push and on close, to wake blocking pops.
    arrival:  Condvar,
    /// Counts pops, so receipts stay distinguishable.
    popped:   AtomicU64,
    closed:   AtomicBool,
}

impl InMemoryQueue {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name:    name.into(),
            pending: Mutex::new(VecDeque::new()),
            arrival: Condvar::new(),
            popped:  AtomicU64::new(0),
            closed:  AtomicBool::new(false),
        }
    }

    fn lock_pending(&self) -> MutexGuard<'_, VecDeque<Envelope>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn ensure_open(&self) -> Result<()> {
        ensure!(
            !self.closed.load(Ordering::Acquire),
            QueueClosedSnafu {
                queue: self.name.as_str()
            }
        );
        Ok(())
    }
}

impl Queue for InMemoryQueue {
    fn name(&self) -> &str { &self.name }

    fn push(&self, envelope: Envelope) -> Result<()> {
        self.ensure_open()?;

        self.lock_pending().push_back(envelope);
        self.arrival.notify_one();
        Ok(())
    }

    fn pop(&self, timeout: Option<Duration>) -> Result<Option<(Envelope, Receipt)>> {
        self.ensure_open()?;

        let timeout = timeout.unwrap_or(Duration::ZERO);
        let start = Instant::now();
        let mut pending = self.lock_pending();

        loop {
            self.ensure_open()?;

            if let Some(envelope) = pending.pop_front() {
                let sequence = self.popped.fetch_add(1, Ordering::Relaxed) + 1;
                return Ok(Some((envelope, Receipt::memory(&self.name, sequence))));
            }

            let elapsed = start.elapsed();
            if elapsed >= timeout {
                return Ok(None);
            }

            let (guard, _) = self
                .arrival
                .wait_timeout(pending, timeout - elapsed)
                .unwrap_or_else(PoisonError::into_inner);
            pending = guard;
        }
    }

    fn acknowledge(&self, receipt: &Receipt) -> Result<()> {
        self.ensure_open()?;

        // Pop already removed the envelope; a matching receipt is a no-op.
        ensure!(
            receipt.queue() == self.name && receipt.claimed_path().is_none(),
            StaleReceiptSnafu {
                queue:    self.name.as_str(),
                sequence: receipt.sequence(),
            }
        );
        Ok(())
    }

    fn peek(&self, index: usize, limit: usize) -> Result<Vec<Envelope>> {
        self.ensure_open()?;

        Ok(self
            .lock_pending()
            .iter()
            .skip(index)
            .take(limit)
            .cloned()
            .collect())
    }

    fn count(&self) -> Result<usize> {
        self.ensure_open()?;
        Ok(self.lock_pending().len())
    }

    fn close(&self) {
        self.closed.store(true, Ordering::Release);
        // Wake any pop blocked on an empty queue so it observes the closure.
        // Holding the mutex while notifying closes the window between a
        // popper's closed-check and its wait.
        let _pending = self.lock_pending();
        self.arrival.notify_all();
    }

    fn is_closed(&self) -> bool { self.closed.load(Ordering::Acquire) }
}
