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

//! On-disk naming scheme for a queue directory.
//!
//! ```text
//! <base>/<queue>/
//!     1.job                       pending message, payload bytes
//!     2.job.1a2b-3-4c5d.proceed   claimed message (token makes the claim
//!                                 unique across queue recreations)
//!     .sequence                   next sequence id, ASCII decimal
//!     .lock                       advisory lock for the push critical section
//! ```
//!
//! Pending messages are exactly the files matching `<u64>.job`, so listing
//! them is a filename filter. Everything else in the directory is invisible
//! to peek/pop/count.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Extension of pending message files.
pub(crate) const PENDING_EXTENSION: &str = "job";

/// Suffix appended when a message is claimed.
pub(crate) const CLAIMED_SUFFIX: &str = ".proceed";

/// Per-queue counter file holding the next sequence id.
pub(crate) const COUNTER_FILE: &str = ".sequence";

/// Per-queue advisory lock file.
pub(crate) const LOCK_FILE: &str = ".lock";

/// Generates a pending message file name: `<id>.job`.
pub(crate) fn pending_file_name(sequence: u64) -> String {
    format!("{sequence}.{PENDING_EXTENSION}")
}

/// Generates a claimed message file name: `<id>.job.<token>.proceed`.
pub(crate) fn claimed_file_name(sequence: u64, token: &str) -> String {
    format!("{sequence}.{PENDING_EXTENSION}.{token}{CLAIMED_SUFFIX}")
}

/// Parses the sequence id out of a pending file name, rejecting claimed
/// files, counter/lock files, and anything else that wanders into the
/// directory.
pub(crate) fn parse_pending_file_name(file_name: &str) -> Option<u64> {
    let id = file_name.strip_suffix(".job")?;
    if id.is_empty() || !id.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    id.parse().ok()
}

/// Lists the pending messages of a queue directory, ascending by sequence id.
pub(crate) fn scan_pending(dir: &Path) -> io::Result<Vec<(u64, PathBuf)>> {
    let mut pending = Vec::new();

    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if let Some(sequence) = entry
            .file_name()
            .to_str()
            .and_then(parse_pending_file_name)
        {
            pending.push((sequence, entry.path()));
        }
    }

    pending.sort_unstable_by_key(|(sequence, _)| *sequence);
    Ok(pending)
}

/// Produces a token that is unique across processes and across time, so a
/// claimed file name (and therefore a receipt) can never be confused with a
/// claim made after the queue was removed and recreated.
pub(crate) fn claim_token() -> String {
    static CLAIM_COUNTER: AtomicU64 = AtomicU64::new(0);

    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_nanos());

    format!(
        "{:x}-{:x}-{:x}",
        std::process::id(),
        CLAIM_COUNTER.fetch_add(1, Ordering::Relaxed),
        nanos
    )
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    #[test]
    fn test_file_names() {
        assert_eq!(pending_file_name(1), "1.job");
        assert_eq!(pending_file_name(42), "42.job");
        assert_eq!(claimed_file_name(7, "abc-0-1"), "7.job.abc-0-1.proceed");
    }

    #[test_case("1.job", Some(1))]
    #[test_case("1234.job", Some(1234))]
    #[test_case("1.job.abc-0-1.proceed", None; "claimed file")]
    #[test_case(".sequence", None; "counter file")]
    #[test_case(".lock", None; "lock file")]
    #[test_case("nan.job", None; "non numeric id")]
    #[test_case(".job", None; "empty id")]
    #[test_case("+1.job", None; "signed id")]
    fn test_parse_pending_file_name(name: &str, expected: Option<u64>) {
        assert_eq!(parse_pending_file_name(name), expected);
    }

    #[test]
    fn test_scan_pending_sorts_numerically() {
        let temp_dir = tempfile::tempdir().unwrap();
        let dir = temp_dir.path();

        // Lexicographic order would put 10 before 2.
        for id in [10u64, 2, 1, 30] {
            std::fs::write(dir.join(pending_file_name(id)), b"x").unwrap();
        }
        std::fs::write(dir.join(COUNTER_FILE), b"31").unwrap();
        std::fs::write(dir.join(claimed_file_name(5, "t")), b"x").unwrap();

        let pending = scan_pending(dir).unwrap();
        let sequences: Vec<u64> = pending.iter().map(|(sequence, _)| *sequence).collect();
        assert_eq!(sequences, vec![1, 2, 10, 30]);
    }

    #[test]
    fn test_claim_tokens_are_unique() {
        let a = claim_token();
        let b = claim_token();
        assert_ne!(a, b);
    }
}
