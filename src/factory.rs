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

//! Identity-cached queue factories.
//!
//! A factory maps queue names to queue instances and hands out the same
//! handle for repeated lookups. Removal evicts the cached instance, closes
//! it (so handles still held elsewhere fail with `QueueClosed` instead of
//! operating on a resurrected queue), and for the persistent factory also
//! removes the on-disk queue.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::memory::InMemoryQueue;
use crate::queue::{PersistentQueue, Queue};
use crate::serializer::{JsonSerializer, Serializer};
use crate::{FlatFileDriver, Result};

/// Factory producing driver-backed [`PersistentQueue`] instances.
pub struct PersistentFactory {
    driver:     Arc<FlatFileDriver>,
    serializer: Arc<dyn Serializer>,
    queues:     Mutex<HashMap<String, Arc<PersistentQueue>>>,
}

impl PersistentFactory {
    /// Create a factory using the default JSON serializer.
    #[must_use]
    pub fn new(driver: Arc<FlatFileDriver>) -> Self {
        Self::with_serializer(driver, Arc::new(JsonSerializer))
    }

    #[must_use]
    pub fn with_serializer(driver: Arc<FlatFileDriver>, serializer: Arc<dyn Serializer>) -> Self {
        Self {
            driver,
            serializer,
            queues: Mutex::new(HashMap::new()),
        }
    }

    /// Return the queue bound to `name`, creating it on disk and caching the
    /// instance on first use. Repeated calls return the same handle.
    pub fn create(&self, name: &str) -> Result<Arc<PersistentQueue>> {
        let mut queues = self.lock_queues();

        if let Some(queue) = queues.get(name) {
            return Ok(Arc::clone(queue));
        }

        self.driver.create_queue(name)?;
        let queue = Arc::new(PersistentQueue::new(
            name,
            Arc::clone(&self.driver),
            Arc::clone(&self.serializer),
        ));
        queues.insert(name.to_owned(), Arc::clone(&queue));
        Ok(queue)
    }

    /// Whether an instance for `name` is cached. Reflects factory
    /// bookkeeping, not on-disk existence.
    #[must_use]
    pub fn exists(&self, name: &str) -> bool { self.lock_queues().contains_key(name) }

    /// Evict and close the cached instance and remove the on-disk queue.
    /// Outstanding handles to the evicted instance observe `QueueClosed`.
    pub fn remove(&self, name: &str) -> Result<()> {
        if let Some(queue) = self.lock_queues().remove(name) {
            queue.close();
        }
        self.driver.remove_queue(name)
    }

    /// The full mapping of cached name to queue instance.
    #[must_use]
    pub fn all(&self) -> HashMap<String, Arc<PersistentQueue>> { self.lock_queues().clone() }

    /// Number of cached instances.
    #[must_use]
    pub fn len(&self) -> usize { self.lock_queues().len() }

    #[must_use]
    pub fn is_empty(&self) -> bool { self.lock_queues().is_empty() }

    fn lock_queues(&self) -> MutexGuard<'_, HashMap<String, Arc<PersistentQueue>>> {
        self.queues.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Factory producing [`InMemoryQueue`] instances.
#[derive(Default)]
pub struct InMemoryFactory {
    queues: Mutex<HashMap<String, Arc<InMemoryQueue>>>,
}

impl InMemoryFactory {
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Return the queue bound to `name`, constructing and caching it on
    /// first use. Repeated calls return the same handle.
    pub fn create(&self, name: &str) -> Arc<InMemoryQueue> {
        let mut queues = self.lock_queues();

        if let Some(queue) = queues.get(name) {
            return Arc::clone(queue);
        }

        let queue = Arc::new(InMemoryQueue::new(name));
        queues.insert(name.to_owned(), Arc::clone(&queue));
        queue
    }

    /// Whether an instance for `name` is cached.
    #[must_use]
    pub fn exists(&self, name: &str) -> bool { self.lock_queues().contains_key(name) }

    /// Evict and close the cached instance. Outstanding handles observe
    /// `QueueClosed`.
    pub fn remove(&self, name: &str) {
        if let Some(queue) = self.lock_queues().remove(name) {
            queue.close();
        }
    }

    /// The full mapping of cached name to queue instance.
    #[must_use]
    pub fn all(&self) -> HashMap<String, Arc<InMemoryQueue>> { self.lock_queues().clone() }

    /// Number of cached instances.
    #[must_use]
    pub fn len(&self) -> usize { self.lock_queues().len() }

    #[must_use]
    pub fn is_empty(&self) -> bool { self.lock_queues().is_empty() }

    fn lock_queues(&self) -> MutexGuard<'_, HashMap<String, Arc<InMemoryQueue>>> {
        self.queues.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::{DriverBuilder, Envelope, Error};

    fn persistent_factory(temp_dir: &TempDir) -> PersistentFactory {
        let driver = Arc::new(DriverBuilder::new(temp_dir.path()).build().unwrap());
        PersistentFactory::new(driver)
    }

    #[test]
    fn test_create_is_identity_stable() {
        let factory = InMemoryFactory::new();
        assert!(factory.is_empty());

        let queue1 = factory.create("queue1");
        let queue2 = factory.create("queue2");

        assert!(Arc::ptr_eq(&queue1, &factory.create("queue1")));
        assert_eq!(factory.len(), 2);
        assert!(factory.all().contains_key("queue2"));
        drop(queue2);
    }

    #[test]
    fn test_remove_closes_outstanding_handles() {
        let factory = InMemoryFactory::new();

        let queue = factory.create("queue");
        assert!(factory.exists("queue"));
        assert_eq!(factory.len(), 1);

        factory.remove("queue");
        assert!(factory.is_empty());

        let err = queue.peek(0, 1).unwrap_err();
        assert!(matches!(err, Error::QueueClosed { .. }));
    }

    #[test]
    fn test_persistent_create_makes_queue_directory() {
        let temp_dir = TempDir::new().unwrap();
        let factory = persistent_factory(&temp_dir);

        let queue = factory.create("mails").unwrap();
        assert!(temp_dir.path().join("mails").is_dir());
        assert!(Arc::ptr_eq(&queue, &factory.create("mails").unwrap()));
    }

    #[test]
    fn test_persistent_remove_wipes_disk_and_closes() {
        let temp_dir = TempDir::new().unwrap();
        let factory = persistent_factory(&temp_dir);

        let queue = factory.create("mails").unwrap();
        queue.push(Envelope::new("job")).unwrap();

        factory.remove("mails").unwrap();

        assert!(!temp_dir.path().join("mails").exists());
        assert!(!factory.exists("mails"));
        let err = queue.push(Envelope::new("again")).unwrap_err();
        assert!(matches!(err, Error::QueueClosed { .. }));
    }

    #[test]
    fn test_remove_unknown_queue_is_a_no_op() {
        let temp_dir = TempDir::new().unwrap();
        let factory = persistent_factory(&temp_dir);

        factory.remove("never-created").unwrap();
    }
}
