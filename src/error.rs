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

use std::path::PathBuf;

use snafu::Snafu;

/// Result type for queue operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Queue operation errors.
///
/// "No message available" is deliberately not an error: `pop` returns
/// `Ok(None)` for it, since an empty queue is an expected, frequent outcome.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    /// The operation requires a queue directory that does not exist.
    #[snafu(display("queue {queue} does not exist"))]
    QueueNotFound {
        queue: String,
        #[snafu(implicit)]
        loc:   snafu::Location,
    },

    /// Underlying filesystem failure. Never swallowed; silent data loss in a
    /// queue is unacceptable.
    #[snafu(display("storage failure at {}", path.display()))]
    Io {
        path:   PathBuf,
        source: std::io::Error,
        #[snafu(implicit)]
        loc:    snafu::Location,
    },

    /// The receipt no longer maps to a claimed message (already acknowledged,
    /// or the queue was removed). Recoverable: callers retrying an
    /// acknowledgement may treat this as a no-op.
    #[snafu(display("receipt for message {sequence} in queue {queue} is stale"))]
    StaleReceipt {
        queue:    String,
        sequence: u64,
        #[snafu(implicit)]
        loc:      snafu::Location,
    },

    /// The queue handle was closed by its factory; the caller is holding a
    /// stale handle. A logic error, not a transient condition.
    #[snafu(display("queue {queue} has been closed"))]
    QueueClosed {
        queue: String,
        #[snafu(implicit)]
        loc:   snafu::Location,
    },

    /// Envelope encoding or decoding failed.
    #[snafu(display("failed to encode or decode envelope"))]
    Codec {
        source: serde_json::Error,
        #[snafu(implicit)]
        loc:    snafu::Location,
    },
}

impl Error {
    /// True for the best-effort-idempotent acknowledgement failure.
    #[must_use]
    pub const fn is_stale_receipt(&self) -> bool { matches!(self, Self::StaleReceipt { .. }) }
}
