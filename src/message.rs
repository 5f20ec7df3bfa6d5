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

//! Message and receipt types handed across the driver boundary.

use std::path::{Path, PathBuf};

use bytes::Bytes;

/// A message returned by `pop`, claimed exclusively for the caller.
///
/// The driver treats the payload as an uninterpreted byte sequence. The
/// receipt authorizes acknowledgement of exactly this claim and nothing else.
#[derive(Debug, Clone)]
pub struct DriverMessage {
    /// Opaque payload bytes exactly as pushed.
    pub payload: Bytes,

    /// Token to pass to `acknowledge_message` once processing succeeded.
    pub receipt: Receipt,
}

/// Opaque token backing one claim.
///
/// A receipt is valid only while its message stays claimed. It never
/// authorizes acknowledging a different message, and because the claimed file
/// name embeds a unique claim token, it cannot collide with a claim made
/// after the queue was removed and recreated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    inner: ReceiptInner,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ReceiptInner {
    /// Claim backed by a renamed file in a queue directory.
    File {
        queue:    String,
        sequence: u64,
        claimed:  PathBuf,
    },
    /// Synthetic receipt from the in-memory queue, which has no claim state.
    Memory { queue: String, sequence: u64 },
}

impl Receipt {
    pub(crate) fn file(queue: impl Into<String>, sequence: u64, claimed: PathBuf) -> Self {
        Self {
            inner: ReceiptInner::File {
                queue: queue.into(),
                sequence,
                claimed,
            },
        }
    }

    pub(crate) fn memory(queue: impl Into<String>, sequence: u64) -> Self {
        Self {
            inner: ReceiptInner::Memory {
                queue: queue.into(),
                sequence,
            },
        }
    }

    /// Name of the queue this receipt was issued for.
    #[must_use]
    pub fn queue(&self) -> &str {
        match &self.inner {
            ReceiptInner::File { queue, .. } | ReceiptInner::Memory { queue, .. } => queue,
        }
    }

    /// Sequence id of the claimed message.
    #[must_use]
    pub const fn sequence(&self) -> u64 {
        match &self.inner {
            ReceiptInner::File { sequence, .. } | ReceiptInner::Memory { sequence, .. } => {
                *sequence
            }
        }
    }

    /// Path of the claimed file, for file-backed receipts.
    pub(crate) fn claimed_path(&self) -> Option<&Path> {
        match &self.inner {
            ReceiptInner::File { claimed, .. } => Some(claimed),
            ReceiptInner::Memory { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_receipt_accessors() {
        let receipt = Receipt::file("mails", 3, PathBuf::from("/q/mails/3.job.t.proceed"));

        assert_eq!(receipt.queue(), "mails");
        assert_eq!(receipt.sequence(), 3);
        assert_eq!(
            receipt.claimed_path(),
            Some(Path::new("/q/mails/3.job.t.proceed"))
        );
    }

    #[test]
    fn test_memory_receipt_has_no_path() {
        let receipt = Receipt::memory("mails", 1);

        assert_eq!(receipt.queue(), "mails");
        assert_eq!(receipt.claimed_path(), None);
    }
}
