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

//! The queue contract and its driver-backed implementation.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use snafu::ensure;

use crate::error::{QueueClosedSnafu, Result};
use crate::serializer::Serializer;
use crate::{Envelope, FlatFileDriver, Receipt};

/// A named, ordered collection of envelopes.
///
/// Both the durable, driver-backed queue and the in-memory variant implement
/// this contract. A queue handle that its factory has removed is closed;
/// every operation on a closed handle fails with
/// [`Error::QueueClosed`](crate::Error::QueueClosed) rather than silently
/// operating on a resurrected queue.
pub trait Queue: Send + Sync {
    /// The queue's name.
    fn name(&self) -> &str;

    /// Append an envelope.
    fn push(&self, envelope: Envelope) -> Result<()>;

    /// Claim the oldest pending envelope, blocking up to `timeout` (`None`
    /// uses the implementation default). `Ok(None)` means nothing became
    /// available in time.
    fn pop(&self, timeout: Option<Duration>) -> Result<Option<(Envelope, Receipt)>>;

    /// Permanently remove a previously popped envelope.
    fn acknowledge(&self, receipt: &Receipt) -> Result<()>;

    /// Inspect up to `limit` pending envelopes starting at ordinal `index`,
    /// without consuming them.
    fn peek(&self, index: usize, limit: usize) -> Result<Vec<Envelope>>;

    /// Number of pending envelopes.
    fn count(&self) -> Result<usize>;

    /// Mark this handle closed. Idempotent.
    fn close(&self);

    /// Whether this handle has been closed.
    fn is_closed(&self) -> bool;
}

/// Durable queue backed by a [`FlatFileDriver`] and a serializer.
pub struct PersistentQueue {
    name:       String,
    driver:     Arc<FlatFileDriver>,
    serializer: Arc<dyn Serializer>,
    closed:     AtomicBool,
}

impl PersistentQueue {
    pub fn new(
        name: impl Into<String>,
        driver: Arc<FlatFileDriver>,
        serializer: Arc<dyn Serializer>,
    ) -> Self {
        Self {
            name: name.into(),
            driver,
            serializer,
            closed: AtomicBool::new(false),
        }
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

impl Queue for PersistentQueue {
    fn name(&self) -> &str { &self.name }

    fn push(&self, envelope: Envelope) -> Result<()> {
        self.ensure_open()?;
        let raw = self.serializer.serialize(&envelope)?;
        self.driver.push_message(&self.name, raw)
    }

    fn pop(&self, timeout: Option<Duration>) -> Result<Option<(Envelope, Receipt)>> {
        self.ensure_open()?;

        let Some(message) = self.driver.pop_message(&self.name, timeout)? else {
            return Ok(None);
        };

        let envelope = self.serializer.deserialize(&message.payload)?;
        Ok(Some((envelope, message.receipt)))
    }

    fn acknowledge(&self, receipt: &Receipt) -> Result<()> {
        self.ensure_open()?;
        self.driver.acknowledge_message(&self.name, receipt)
    }

    fn peek(&self, index: usize, limit: usize) -> Result<Vec<Envelope>> {
        self.ensure_open()?;

        self.driver
            .peek_queue(&self.name, index, limit)?
            .iter()
            .map(|raw| self.serializer.deserialize(raw))
            .collect()
    }

    fn count(&self) -> Result<usize> {
        self.ensure_open()?;
        self.driver.count_messages(&self.name)
    }

    fn close(&self) { self.closed.store(true, Ordering::Release); }

    fn is_closed(&self) -> bool { self.closed.load(Ordering::Acquire) }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::{DriverBuilder, Error, JsonSerializer};

    fn queue(temp_dir: &TempDir, name: &str) -> PersistentQueue {
        let driver = Arc::new(DriverBuilder::new(temp_dir.path()).build().unwrap());
        driver.create_queue(name).unwrap();
        PersistentQueue::new(name, driver, Arc::new(JsonSerializer))
    }

    #[test]
    fn test_push_pop_acknowledge_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let queue = queue(&temp_dir, "mails");

        let envelope = Envelope::new("send-newsletter").arg("to", "jane@example.com");
        queue.push(envelope.clone()).unwrap();

        let (popped, receipt) = queue.pop(Some(Duration::ZERO)).unwrap().unwrap();
        assert_eq!(popped, envelope);

        queue.acknowledge(&receipt).unwrap();
        assert_eq!(queue.count().unwrap(), 0);
    }

    #[test]
    fn test_peek_deserializes_without_consuming() {
        let temp_dir = TempDir::new().unwrap();
        let queue = queue(&temp_dir, "mails");

        queue.push(Envelope::new("a")).unwrap();
        queue.push(Envelope::new("b")).unwrap();

        let peeked = queue.peek(0, 10).unwrap();
        assert_eq!(peeked.len(), 2);
        assert_eq!(peeked[0].name(), "a");
        assert_eq!(queue.count().unwrap(), 2);
    }

    #[test]
    fn test_closed_queue_rejects_operations() {
        let temp_dir = TempDir::new().unwrap();
        let queue = queue(&temp_dir, "mails");

        queue.close();
        assert!(queue.is_closed());

        let err = queue.push(Envelope::new("x")).unwrap_err();
        assert!(matches!(err, Error::QueueClosed { .. }));
        let err = queue.pop(Some(Duration::ZERO)).unwrap_err();
        assert!(matches!(err, Error::QueueClosed { .. }));
        let err = queue.peek(0, 1).unwrap_err();
        assert!(matches!(err, Error::QueueClosed { .. }));
    }
}
