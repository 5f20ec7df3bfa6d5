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

//! Durable multi-producer/multi-consumer job queue backed by a plain
//! directory tree.
//!
//! Independent processes enqueue opaque messages into named queues, dequeue
//! them one at a time under an exclusive claim, acknowledge successful
//! processing, and inspect queue contents without consuming them. The only
//! synchronization substrate is the filesystem: atomic rename for claims and
//! an advisory lock for sequence allocation. No broker process, no database.
//!
//! ```
//! use std::time::Duration;
//!
//! use flatfile_queue::DriverBuilder;
//!
//! let dir = tempfile::tempdir().unwrap();
//! let driver = DriverBuilder::new(dir.path()).build().unwrap();
//!
//! driver.create_queue("send-newsletter").unwrap();
//! driver.push_message("send-newsletter", "job #1").unwrap();
//!
//! let message = driver
//!     .pop_message("send-newsletter", Duration::ZERO)
//!     .unwrap()
//!     .unwrap();
//! assert_eq!(&message.payload[..], b"job #1");
//!
//! driver
//!     .acknowledge_message("send-newsletter", &message.receipt)
//!     .unwrap();
//! ```
//!
//! Known limitation: a consumer that claims a message and crashes before
//! acknowledging leaves the message claimed forever. The driver never
//! invents a visibility timeout; re-queueing orphaned claims is the job of
//! external tooling that can judge claim age.

pub mod builder;
pub mod config;
pub mod driver;
pub mod envelope;
pub mod error;
pub mod factory;
pub mod memory;
pub mod message;
pub mod queue;
pub mod serializer;

mod lock;
mod path;

pub use builder::DriverBuilder;
pub use config::DriverConfig;
pub use driver::FlatFileDriver;
pub use envelope::Envelope;
pub use error::{Error, Result};
pub use factory::{InMemoryFactory, PersistentFactory};
pub use memory::InMemoryQueue;
pub use message::{DriverMessage, Receipt};
pub use queue::{PersistentQueue, Queue};
pub use serializer::{JsonSerializer, Serializer};
